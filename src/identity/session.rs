//! SessionIdentity - an identity provider fed by explicit sign-in/sign-out.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use super::{Actor, IdentityProvider};

/// Watch-channel backed [`IdentityProvider`].
///
/// Clones share the same session, so one handle can be given to the
/// synchronizers while another drives sign-in from the auth flow.
#[derive(Clone)]
pub struct SessionIdentity {
    sender: Arc<watch::Sender<Option<Actor>>>,
}

impl Default for SessionIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionIdentity {
    /// A session with nobody signed in.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// A session that starts signed in as `actor`.
    pub fn signed_in(actor: Actor) -> Self {
        let (sender, _) = watch::channel(Some(actor));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sign `actor` in. Re-signing the same actor publishes nothing.
    pub fn sign_in(&self, actor: Actor) {
        let changed = self.sender.send_if_modified(|current| {
            if current.as_ref() == Some(&actor) {
                return false;
            }
            *current = Some(actor.clone());
            true
        });
        if changed {
            debug!(actor = %actor.id, "signed in");
        }
    }

    /// Sign in from auth claims. Returns false when the claims carry no subject.
    pub fn sign_in_with_claims(&self, claims: &HashMap<String, String>) -> bool {
        match Actor::from_claims(claims) {
            Some(actor) => {
                self.sign_in(actor);
                true
            }
            None => false,
        }
    }

    /// Sign the current actor out, if any.
    pub fn sign_out(&self) {
        let changed = self.sender.send_if_modified(|current| current.take().is_some());
        if changed {
            debug!("signed out");
        }
    }
}

impl IdentityProvider for SessionIdentity {
    fn current(&self) -> Option<Actor> {
        self.sender.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Actor>> {
        self.sender.subscribe()
    }
}
