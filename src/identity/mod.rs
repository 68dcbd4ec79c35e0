//! Identity - who is acting, and when that changes.
//!
//! The auth provider is an external collaborator. The synchronizer only needs
//! the current actor and a change signal, both expressed by
//! [`IdentityProvider`]. [`SessionIdentity`] is a watch-channel backed
//! implementation driven by explicit sign-in and sign-out calls.

mod session;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

pub use session::SessionIdentity;

/// The authenticated user on whose behalf writes are made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub email: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Actor {
            id: id.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Build an actor from verified auth claims (`sub`, optional `email`).
    ///
    /// Returns `None` when the subject claim is missing or blank.
    pub fn from_claims(claims: &HashMap<String, String>) -> Option<Self> {
        let id = claims.get("sub").map(|s| s.trim()).filter(|s| !s.is_empty())?;
        Some(Actor {
            id: id.to_string(),
            email: claims.get("email").cloned(),
        })
    }
}

/// Source of the current actor.
///
/// Implementations must publish every login/logout on the channel returned by
/// [`subscribe`](Self::subscribe).
pub trait IdentityProvider: Send + Sync {
    /// The actor signed in right now, if any.
    fn current(&self) -> Option<Actor>;

    /// A receiver that observes identity changes made after this call.
    fn subscribe(&self) -> watch::Receiver<Option<Actor>>;
}
