//! Notifications - short user-facing success and error messages.
//!
//! Sinks are fire-and-forget: the synchronizer writes to them and never reads
//! back. Every mutating call produces exactly one notification.

mod messages;
mod sinks;

use serde::{Deserialize, Serialize};

pub use messages::Messages;
#[cfg(feature = "emitter")]
pub use sinks::EmitterSink;
pub use sinks::{BufferSink, LogSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Success,
    Error,
}

impl Level {
    /// Event name used when notifications are re-emitted as events.
    pub fn event_name(&self) -> &'static str {
        match self {
            Level::Success => "notification:success",
            Level::Error => "notification:error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Notification {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notification {
            level: Level::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

/// Channel for user-facing messages.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}
