//! Remote store - the record-oriented table service behind every collection.
//!
//! The hosted backend is an external collaborator. This module fixes the
//! contract the synchronizer speaks ([`RemoteStore`]) and ships an in-memory
//! implementation for development and tests.
//!
//! ## Example
//!
//! ```ignore
//! use cinesync::{Filter, InMemoryRemoteStore, Order, RemoteStore};
//!
//! let store = InMemoryRemoteStore::new().with_unique("reviews", &["user_id", "movie_id"]);
//! let rows = store
//!     .select("reviews", &Filter::new().eq("movie_id", "m42"), Some(&Order::desc("created_at")))
//!     .await?;
//! ```

mod in_memory;
mod query;
mod remote;

/// Error type for remote store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("uniqueness conflict on {collection} ({constraint})")]
    Conflict {
        collection: String,
        constraint: String,
    },
    /// The store could not be reached or failed internally.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The store refused the request (bad filter, permission, schema).
    #[error("request rejected: {0}")]
    Rejected(String),
    /// Row encoding/decoding failed.
    #[error("row serialization error: {0}")]
    Serde(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

pub use in_memory::InMemoryRemoteStore;
pub use query::{Direction, Filter, Order, Predicate};
pub use remote::RemoteStore;
