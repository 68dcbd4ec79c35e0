//! Context shared by synchronizers.
//!
//! Carries the remote store, the identity provider and the notification
//! sink. Synchronizers reach every collaborator through the context, so a
//! test can wire in-memory versions without touching global state.

use std::sync::Arc;

use crate::identity::{Actor, IdentityProvider};
use crate::notify::{LogSink, Notification, NotificationSink};
use crate::store::RemoteStore;

/// The collaborators a synchronizer is constructed with.
///
/// ## Example
///
/// ```ignore
/// let store = InMemoryRemoteStore::for_catalog();
/// let session = SessionIdentity::new();
/// let ctx = SyncContext::new(store, session.clone()).with_notifications(BufferSink::new());
/// let reviews = Reviews::new(ctx, "m42");
/// ```
#[derive(Clone)]
pub struct SyncContext {
    store: Arc<dyn RemoteStore>,
    identity: Arc<dyn IdentityProvider>,
    notifications: Arc<dyn NotificationSink>,
}

impl SyncContext {
    /// Create a context. Notifications go to [`LogSink`] until replaced.
    pub fn new(
        store: impl RemoteStore + 'static,
        identity: impl IdentityProvider + 'static,
    ) -> Self {
        Self::from_shared(Arc::new(store), Arc::new(identity))
    }

    /// Create a context from already shared collaborators.
    pub fn from_shared(
        store: Arc<dyn RemoteStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        SyncContext {
            store,
            identity,
            notifications: Arc::new(LogSink),
        }
    }

    pub fn with_notifications(mut self, sink: impl NotificationSink + 'static) -> Self {
        self.notifications = Arc::new(sink);
        self
    }

    pub fn store(&self) -> &dyn RemoteStore {
        self.store.as_ref()
    }

    pub fn identity(&self) -> &dyn IdentityProvider {
        self.identity.as_ref()
    }

    /// The actor signed in right now, if any.
    pub fn current_actor(&self) -> Option<Actor> {
        self.identity.current()
    }

    pub(crate) fn notify(&self, notification: Notification) {
        self.notifications.notify(notification);
    }
}
