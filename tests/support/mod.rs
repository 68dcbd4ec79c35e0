//! Shared fixtures for the integration suites.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{oneshot, Notify};

use cinesync::{
    Actor, BufferSink, Filter, InMemoryRemoteStore, Order, RemoteStore, Row, SessionIdentity,
    StoreError, SyncContext,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A catalog store, a session and a notification buffer wired together.
pub struct Harness {
    pub store: InMemoryRemoteStore,
    pub session: SessionIdentity,
    pub notes: BufferSink,
}

impl Harness {
    pub fn new() -> Self {
        init_tracing();
        Harness {
            store: InMemoryRemoteStore::for_catalog(),
            session: SessionIdentity::new(),
            notes: BufferSink::new(),
        }
    }

    pub fn signed_in(user_id: &str) -> Self {
        let harness = Self::new();
        harness.session.sign_in(Actor::new(user_id));
        harness
    }

    pub fn ctx(&self) -> SyncContext {
        SyncContext::new(self.store.clone(), self.session.clone())
            .with_notifications(self.notes.clone())
    }

    /// Context whose store calls go through `store` instead.
    pub fn ctx_with(&self, store: impl RemoteStore + 'static) -> SyncContext {
        SyncContext::new(store, self.session.clone()).with_notifications(self.notes.clone())
    }

    pub async fn seed_profile(&self, user_id: &str, username: &str) {
        seed(
            &self.store,
            "profiles",
            json!({ "user_id": user_id, "username": username, "avatar_url": null }),
        )
        .await;
    }

    pub async fn seed_review(&self, user_id: &str, movie_id: &str, rating: u8, content: &str) -> Row {
        seed(
            &self.store,
            "reviews",
            json!({
                "user_id": user_id,
                "movie_id": movie_id,
                "rating": rating,
                "content": content,
                "likes": 0,
            }),
        )
        .await
    }
}

pub async fn seed(store: &InMemoryRemoteStore, collection: &str, row: Value) -> Row {
    let row = match row {
        Value::Object(row) => row,
        other => panic!("seed rows must be objects, got {}", other),
    };
    store.insert(collection, row).await.unwrap()
}

/// Poll `check` until it holds or a second passes.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

/// Counts every call that reaches the wrapped store.
#[derive(Clone)]
pub struct CountingStore {
    inner: InMemoryRemoteStore,
    calls: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new(inner: InMemoryRemoteStore) -> Self {
        CountingStore {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteStore for CountingStore {
    async fn select(
        &self,
        collection: &str,
        filter: &Filter,
        order: Option<&Order>,
    ) -> Result<Vec<Row>, StoreError> {
        self.hit();
        self.inner.select(collection, filter, order).await
    }

    async fn insert(&self, collection: &str, row: Row) -> Result<Row, StoreError> {
        self.hit();
        self.inner.insert(collection, row).await
    }

    async fn update(&self, collection: &str, filter: &Filter, fields: Row) -> Result<u64, StoreError> {
        self.hit();
        self.inner.update(collection, filter, fields).await
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        self.hit();
        self.inner.delete(collection, filter).await
    }
}

/// Holds the next select on an armed collection until released.
#[derive(Clone)]
pub struct GatedStore {
    inner: InMemoryRemoteStore,
    armed: Arc<Mutex<Option<(String, oneshot::Receiver<()>)>>>,
    entered: Arc<Notify>,
}

/// Controls for a [`GatedStore`].
pub struct Gate {
    release: oneshot::Sender<()>,
    entered: Arc<Notify>,
}

impl Gate {
    /// Wait until the held select has started.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(self) {
        let _ = self.release.send(());
    }
}

impl GatedStore {
    pub fn new(inner: InMemoryRemoteStore) -> Self {
        GatedStore {
            inner,
            armed: Arc::new(Mutex::new(None)),
            entered: Arc::new(Notify::new()),
        }
    }

    /// Hold the next select on `collection`.
    pub fn arm(&self, collection: &str) -> Gate {
        let (release, gate) = oneshot::channel();
        *self.armed.lock().unwrap() = Some((collection.to_string(), gate));
        Gate {
            release,
            entered: Arc::clone(&self.entered),
        }
    }

    fn take_gate(&self, collection: &str) -> Option<oneshot::Receiver<()>> {
        let mut armed = self.armed.lock().unwrap();
        match armed.take() {
            Some((armed_for, gate)) if armed_for == collection => Some(gate),
            other => {
                *armed = other;
                None
            }
        }
    }
}

#[async_trait]
impl RemoteStore for GatedStore {
    async fn select(
        &self,
        collection: &str,
        filter: &Filter,
        order: Option<&Order>,
    ) -> Result<Vec<Row>, StoreError> {
        // Read now, answer later: the held select returns what the store
        // looked like when it started.
        let rows = self.inner.select(collection, filter, order).await;
        if let Some(gate) = self.take_gate(collection) {
            self.entered.notify_one();
            let _ = gate.await;
        }
        rows
    }

    async fn insert(&self, collection: &str, row: Row) -> Result<Row, StoreError> {
        self.inner.insert(collection, row).await
    }

    async fn update(&self, collection: &str, filter: &Filter, fields: Row) -> Result<u64, StoreError> {
        self.inner.update(collection, filter, fields).await
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        self.inner.delete(collection, filter).await
    }
}
