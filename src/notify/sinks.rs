use std::sync::{Arc, Mutex};

#[cfg(feature = "emitter")]
use event_emitter_rs::EventEmitter;
use tracing::{error, info};

use super::{Level, Notification, NotificationSink};

/// Writes notifications as tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, notification: Notification) {
        match notification.level {
            Level::Success => info!(target: "cinesync::notify", "{}", notification.message),
            Level::Error => error!(target: "cinesync::notify", "{}", notification.message),
        }
    }
}

/// Collects notifications into a shared buffer.
#[derive(Debug, Clone, Default)]
pub struct BufferSink {
    buffer: Arc<Mutex<Vec<Notification>>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buffer(buffer: Arc<Mutex<Vec<Notification>>>) -> Self {
        BufferSink { buffer }
    }

    /// Everything received so far.
    pub fn notifications(&self) -> Vec<Notification> {
        self.buffer.lock().map(|b| b.clone()).unwrap_or_default()
    }

    /// Remove and return everything received so far.
    pub fn drain(&self) -> Vec<Notification> {
        self.buffer
            .lock()
            .map(|mut b| b.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<Notification> {
        self.buffer.lock().ok().and_then(|b| b.last().cloned())
    }
}

impl NotificationSink for BufferSink {
    fn notify(&self, notification: Notification) {
        // A poisoned buffer drops the message; sinks never fail the caller.
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.push(notification);
        }
    }
}

/// Re-emits notifications on an [`EventEmitter`] for in-process listeners.
///
/// Messages are emitted as strings under [`Level::event_name`].
#[cfg(feature = "emitter")]
pub struct EmitterSink {
    emitter: Mutex<EventEmitter>,
}

#[cfg(feature = "emitter")]
impl EmitterSink {
    pub fn new(emitter: EventEmitter) -> Self {
        EmitterSink {
            emitter: Mutex::new(emitter),
        }
    }

    /// Register a listener for notifications of `level`.
    pub fn on<F>(&self, level: Level, listener: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        if let Ok(mut emitter) = self.emitter.lock() {
            emitter.on(level.event_name(), listener);
        }
    }
}

#[cfg(feature = "emitter")]
impl NotificationSink for EmitterSink {
    fn notify(&self, notification: Notification) {
        if let Ok(mut emitter) = self.emitter.lock() {
            emitter.emit(notification.level.event_name(), notification.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_sink_collects_in_order() {
        let sink = BufferSink::new();
        sink.notify(Notification::success("saved"));
        sink.notify(Notification::error("failed"));

        let all = sink.notifications();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], Notification::success("saved"));
        assert!(all[1].is_error());
        assert_eq!(sink.last(), Some(Notification::error("failed")));

        assert_eq!(sink.drain().len(), 2);
        assert!(sink.notifications().is_empty());
    }

    #[test]
    fn buffer_sink_shares_external_buffer() {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = BufferSink::with_buffer(buffer.clone());
        sink.notify(Notification::success("ok"));
        assert_eq!(buffer.lock().unwrap().len(), 1);
    }

    #[test]
    fn log_sink_accepts_both_levels() {
        LogSink.notify(Notification::success("ok"));
        LogSink.notify(Notification::error("not ok"));
    }

    #[cfg(feature = "emitter")]
    #[test]
    fn emitter_sink_reaches_listeners() {
        use std::sync::mpsc;
        use std::time::Duration;

        let (tx, rx) = mpsc::channel::<String>();
        let tx = Mutex::new(tx);
        let sink = EmitterSink::new(EventEmitter::new());
        sink.on(Level::Error, move |message: String| {
            let _ = tx.lock().unwrap().send(message);
        });

        sink.notify(Notification::success("ignored"));
        sink.notify(Notification::error("could not save your review"));

        let received = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(received, "could not save your review");
    }
}
