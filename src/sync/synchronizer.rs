//! Synchronizer - a client-side view of one remote collection.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::config::{Scope, SyncConfig};
use super::context::SyncContext;
use super::error::SyncError;
use super::lookup::ProfileLookup;
use super::state::{Loaded, RefreshSequence, SyncState};
use crate::identity::Actor;
use crate::notify::{Messages, Notification};
use crate::record::{self, Enriched, Payload, Record, CREATED_AT_FIELD, ID_FIELD};
use crate::store::{Filter, Order, StoreError};

/// A consistent copy of a synchronizer's state.
#[derive(Debug, Clone)]
pub struct CollectionView<P> {
    pub scope: Scope,
    pub collection: Vec<Enriched<P>>,
    pub is_loading: bool,
    pub own_record: Option<Enriched<P>>,
}

struct Inner<P> {
    ctx: SyncContext,
    collection: String,
    profiles: ProfileLookup,
    messages: Messages,
    sequence: RefreshSequence,
    state: RwLock<SyncState<P>>,
}

/// Keeps a client-side view of the records of one collection that belong to
/// one parent key, and routes every write through the signed-in actor.
///
/// Clones share state.
pub struct Synchronizer<P> {
    inner: Arc<Inner<P>>,
}

impl<P> Clone for Synchronizer<P> {
    fn clone(&self) -> Self {
        Synchronizer {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Payload> Synchronizer<P> {
    pub fn new(ctx: SyncContext, config: SyncConfig) -> Self {
        let collection = config
            .collection
            .unwrap_or_else(|| P::COLLECTION.to_string());
        Synchronizer {
            inner: Arc::new(Inner {
                ctx,
                collection,
                profiles: config.profiles,
                messages: Messages::for_subject(P::SUBJECT),
                sequence: RefreshSequence::default(),
                state: RwLock::new(SyncState::new(config.scope)),
            }),
        }
    }

    /// Subscribe to identity changes, then load the collection.
    pub async fn start(&self) -> IdentityWatch {
        let watch = self.watch_identity();
        // Failures are logged by refresh.
        let _ = self.refresh().await;
        watch
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> CollectionView<P> {
        let state = self.read_state();
        CollectionView {
            scope: state.scope.clone(),
            collection: state.collection.clone(),
            is_loading: state.is_loading,
            own_record: state.own_record.clone(),
        }
    }

    /// Records for the bound parent key, newest first.
    pub fn collection(&self) -> Vec<Enriched<P>> {
        self.read_state().collection.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.read_state().is_loading
    }

    /// The signed-in actor's record within the collection.
    pub fn own_record(&self) -> Option<Enriched<P>> {
        self.read_state().own_record.clone()
    }

    pub fn scope(&self) -> Scope {
        self.read_state().scope.clone()
    }

    pub fn collection_name(&self) -> &str {
        &self.inner.collection
    }

    pub fn context(&self) -> &SyncContext {
        &self.inner.ctx
    }

    // State is only ever replaced wholesale, so a poisoned guard still holds
    // a consistent snapshot.
    fn read_state(&self) -> RwLockReadGuard<'_, SyncState<P>> {
        self.inner
            .state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SyncState<P>> {
        self.inner
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Reload the collection for the bound parent key.
    ///
    /// On failure the previous collection stays in place and the error is
    /// logged; no notification is sent.
    pub async fn refresh(&self) -> Result<(), SyncError> {
        let seq = self.inner.sequence.begin();
        let actor = self.inner.ctx.current_actor();
        let scope = {
            let mut state = self.write_state();
            state.is_loading = true;
            state.scope.clone()
        };

        let Some(parent_key) = scope.parent_key(actor.as_ref()) else {
            debug!(collection = %self.inner.collection, seq, "no actor for actor scope, clearing");
            self.apply(Loaded {
                seq,
                scope,
                collection: Vec::new(),
                own_record: None,
            });
            return Ok(());
        };

        let store = self.inner.ctx.store();
        let filter = Filter::new().eq(P::PARENT_FIELD, parent_key.as_str());
        let order = Order::desc(CREATED_AT_FIELD);
        let rows = match store
            .select(&self.inner.collection, &filter, Some(&order))
            .await
        {
            Ok(rows) => rows,
            Err(err) => {
                warn!(
                    collection = %self.inner.collection,
                    parent_key = %parent_key,
                    seq,
                    error = %err,
                    "refresh failed"
                );
                let latest = self.inner.sequence.latest();
                self.write_state().settle(seq, latest);
                return Err(SyncError::FetchFailed(err.to_string()));
            }
        };

        let records: Vec<Record<P>> = rows
            .iter()
            .filter_map(|row| match Record::<P>::from_row(row) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(collection = %self.inner.collection, error = %err, "skipping undecodable row");
                    None
                }
            })
            .collect();

        let owners: Vec<String> = {
            let mut seen = HashSet::new();
            let owners = records
                .iter()
                .filter(|r| seen.insert(r.owner_id.as_str()))
                .map(|r| r.owner_id.clone())
                .collect();
            owners
        };
        let snapshots = self.inner.profiles.resolve(store, &owners).await;

        let collection: Vec<Enriched<P>> = records
            .into_iter()
            .map(|record| {
                let owner = snapshots
                    .get(&record.owner_id)
                    .cloned()
                    .unwrap_or_default();
                Enriched { record, owner }
            })
            .collect();

        let own_record = actor.as_ref().and_then(|actor| {
            collection
                .iter()
                .find(|r| r.owner_id == actor.id)
                .cloned()
        });

        debug!(
            collection = %self.inner.collection,
            parent_key = %parent_key,
            seq,
            records = collection.len(),
            "refreshed"
        );
        self.apply(Loaded {
            seq,
            scope,
            collection,
            own_record,
        });
        Ok(())
    }

    fn apply(&self, loaded: Loaded<P>) {
        let seq = loaded.seq;
        let latest = self.inner.sequence.latest();
        if !self.write_state().apply(loaded, latest) {
            debug!(collection = %self.inner.collection, seq, "discarded stale refresh");
        }
    }

    /// Rebind to another parent key and reload.
    ///
    /// Only a fixed scope can be rebound; an actor scope follows the
    /// identity provider and is rejected with `InvalidInput`.
    pub async fn bind(&self, parent_key: impl Into<String>) -> Result<(), SyncError> {
        let scope = Scope::Parent(parent_key.into());
        {
            let mut state = self.write_state();
            if state.scope == Scope::Actor {
                warn!(collection = %self.inner.collection, "refusing to rebind an actor scope");
                return Err(SyncError::InvalidInput(
                    "an actor-scoped collection cannot be rebound".into(),
                ));
            }
            if state.scope != scope {
                state.scope = scope;
                state.collection.clear();
                state.own_record = None;
            }
        }
        self.refresh().await
    }

    /// Reload whenever the identity provider reports a login or logout.
    ///
    /// The task stops when the returned guard is dropped.
    pub fn watch_identity(&self) -> IdentityWatch {
        let mut changes = self.inner.ctx.identity().subscribe();
        let sync = self.clone();
        let task = tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let actor = changes.borrow_and_update().as_ref().map(|a| a.id.clone());
                debug!(collection = %sync.inner.collection, actor = ?actor, "identity changed");
                let _ = sync.refresh().await;
            }
        });
        IdentityWatch { task }
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Create the actor's record for the bound parent key.
    ///
    /// Returns the stored record once the collection has been reloaded.
    pub async fn create(&self, payload: P) -> Result<Record<P>, SyncError> {
        let actor = self.require_actor()?;
        let parent_key = match self.scope().parent_key(Some(&actor)) {
            Some(key) => key,
            None => return Err(self.fail("create", self.inner.messages.create_failed(), "no parent key")),
        };

        let row = Record::new_row(&actor.id, &parent_key, &payload)
            .map_err(|e| self.fail("create", self.inner.messages.create_failed(), e))?;

        let stored = match self
            .inner
            .ctx
            .store()
            .insert(&self.inner.collection, row)
            .await
        {
            Ok(stored) => stored,
            Err(StoreError::Conflict { constraint, .. }) => {
                debug!(
                    collection = %self.inner.collection,
                    parent_key = %parent_key,
                    constraint = %constraint,
                    "duplicate create rejected"
                );
                self.inner
                    .ctx
                    .notify(Notification::error(self.inner.messages.duplicate()));
                return Err(SyncError::DuplicateRecord);
            }
            Err(err) => return Err(self.fail("create", self.inner.messages.create_failed(), err)),
        };

        // The row is stored from here on, whether or not it reads back.
        self.inner
            .ctx
            .notify(Notification::success(self.inner.messages.created()));
        self.reload_after("create").await;

        Record::from_row(&stored).map_err(|err| {
            error!(
                collection = %self.inner.collection,
                parent_key = %parent_key,
                error = %err,
                "stored row could not be decoded"
            );
            SyncError::FetchFailed(err.to_string())
        })
    }

    /// Apply `patch` to the actor's record `record_id`.
    ///
    /// The store only matches rows owned by the actor; an id that is missing
    /// or owned by someone else affects zero rows and still counts as success.
    pub async fn update<U: Serialize>(&self, record_id: &str, patch: &U) -> Result<u64, SyncError> {
        self.update_where(Filter::new().eq(ID_FIELD, record_id), patch)
            .await
    }

    /// Apply `patch` to every record of the actor matching `filter`.
    pub async fn update_where<U: Serialize>(
        &self,
        filter: Filter,
        patch: &U,
    ) -> Result<u64, SyncError> {
        let affected = self.write_patch(filter, patch).await?;
        self.inner
            .ctx
            .notify(Notification::success(self.inner.messages.updated()));
        self.reload_after("update").await;
        Ok(affected)
    }

    /// Apply `patch` to the actor's records matching `filter`, or create
    /// `fallback` when the store holds none. Decided by the store, not by the
    /// loaded collection.
    pub async fn update_or_create<U: Serialize>(
        &self,
        filter: Filter,
        patch: &U,
        fallback: P,
    ) -> Result<u64, SyncError> {
        let affected = self.write_patch(filter, patch).await?;
        if affected == 0 {
            self.create(fallback).await?;
            return Ok(1);
        }
        self.inner
            .ctx
            .notify(Notification::success(self.inner.messages.updated()));
        self.reload_after("update").await;
        Ok(affected)
    }

    async fn write_patch<U: Serialize>(&self, filter: Filter, patch: &U) -> Result<u64, SyncError> {
        let actor = self.require_actor()?;
        let fields = record::patch_fields::<P, U>(patch)
            .map_err(|e| self.fail("update", self.inner.messages.update_failed(), e))?;

        let filter = self.owned_by(filter, &actor);
        let affected = self
            .inner
            .ctx
            .store()
            .update(&self.inner.collection, &filter, fields)
            .await
            .map_err(|e| self.fail("update", self.inner.messages.update_failed(), e))?;

        if affected == 0 {
            debug!(collection = %self.inner.collection, ?filter, "update matched no rows");
        }
        Ok(affected)
    }

    /// Delete the actor's record `record_id`.
    ///
    /// `own_record` is cleared as soon as the store confirms, before the
    /// collection is reloaded.
    pub async fn delete(&self, record_id: &str) -> Result<u64, SyncError> {
        self.delete_where(Filter::new().eq(ID_FIELD, record_id)).await
    }

    /// Delete every record of the actor matching `filter`.
    pub async fn delete_where(&self, filter: Filter) -> Result<u64, SyncError> {
        let actor = self.require_actor()?;
        let filter = self.owned_by(filter, &actor);
        let affected = self
            .inner
            .ctx
            .store()
            .delete(&self.inner.collection, &filter)
            .await
            .map_err(|e| self.fail("delete", self.inner.messages.delete_failed(), e))?;

        if affected == 0 {
            debug!(collection = %self.inner.collection, ?filter, "delete matched no rows");
        }
        self.inner
            .ctx
            .notify(Notification::success(self.inner.messages.deleted()));
        self.write_state().own_record = None;
        self.reload_after("delete").await;
        Ok(affected)
    }

    /// Whether the store holds a record of the actor matching `filter`.
    /// Failures are notified as failures of `operation`.
    pub(crate) async fn exists_owned(&self, operation: &str, filter: Filter) -> Result<bool, SyncError> {
        let actor = self.require_actor()?;
        let filter = self.owned_by(filter, &actor);
        let count = self
            .inner
            .ctx
            .store()
            .count(&self.inner.collection, &filter)
            .await
            .map_err(|e| self.fail(operation, self.inner.messages.update_failed(), e))?;
        Ok(count > 0)
    }

    fn owned_by(&self, filter: Filter, actor: &Actor) -> Filter {
        filter.eq(P::OWNER_FIELD, actor.id.as_str())
    }

    async fn reload_after(&self, operation: &str) {
        if self.refresh().await.is_err() {
            debug!(collection = %self.inner.collection, operation, "reload after write failed");
        }
    }

    /// The signed-in actor, or a notified `NotAuthenticated`.
    pub(crate) fn require_actor(&self) -> Result<Actor, SyncError> {
        match self.inner.ctx.current_actor() {
            Some(actor) => Ok(actor),
            None => {
                self.inner
                    .ctx
                    .notify(Notification::error(self.inner.messages.not_authenticated()));
                Err(SyncError::NotAuthenticated)
            }
        }
    }

    /// Log a failed write, notify the user and build the error.
    pub(crate) fn fail(&self, operation: &str, message: String, err: impl fmt::Display) -> SyncError {
        error!(
            collection = %self.inner.collection,
            operation,
            error = %err,
            "write failed"
        );
        self.inner.ctx.notify(Notification::error(message));
        SyncError::WriteFailed(err.to_string())
    }

    /// Reject input before it reaches the store.
    pub(crate) fn reject(&self, reason: impl Into<String>) -> SyncError {
        let reason = reason.into();
        self.inner.ctx.notify(Notification::error(reason.clone()));
        SyncError::InvalidInput(reason)
    }
}

/// Handle to the identity watch task; aborts it on drop.
pub struct IdentityWatch {
    task: JoinHandle<()>,
}

impl IdentityWatch {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for IdentityWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}
