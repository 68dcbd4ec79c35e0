//! Sync - keep a client-side view of a remote collection in step with the store.
//!
//! A [`Synchronizer`] is bound to one collection and one parent key. It loads
//! the records attached to that key, joins them with their owners' display
//! snapshots, tracks which record belongs to the signed-in actor, and
//! mediates creates, updates and deletes on the actor's behalf.
//!
//! ## Example
//!
//! ```ignore
//! use cinesync::{InMemoryRemoteStore, SessionIdentity, SyncConfig, SyncContext, Synchronizer};
//!
//! let ctx = SyncContext::new(InMemoryRemoteStore::for_catalog(), session.clone());
//! let reviews = Synchronizer::<Review>::new(ctx, SyncConfig::for_parent("m42"));
//! let _watch = reviews.start().await;
//!
//! reviews.create(Review::new(5, "great")).await?;
//! assert_eq!(reviews.own_record().unwrap().payload.rating, 5);
//! ```
//!
//! ## Ordering
//!
//! Writes reload the collection before returning, so a caller that sees a
//! successful write also sees its effect. Refreshes are stamped when they
//! start; a refresh that completes after a newer one has been applied is
//! discarded.

mod config;
mod context;
mod error;
mod lookup;
mod state;
mod synchronizer;

pub use config::{Scope, SyncConfig};
pub use context::SyncContext;
pub use error::SyncError;
pub use lookup::ProfileLookup;
pub use synchronizer::{CollectionView, IdentityWatch, Synchronizer};
