// Lets the derive output name `cinesync::...` from inside this crate too.
extern crate self as cinesync;

pub mod catalog;
pub mod identity;
pub mod notify;
pub mod record;
pub mod store;
pub mod sync;

pub use catalog::{
    AvatarError, AvatarStore, AvatarUpload, Favorite, Favorites, InMemoryAvatarStore,
    InvalidAvatar, Profile, ProfileBook, ProfilePatch, ProfileStats, Review, ReviewPatch, Reviews,
};
pub use identity::{Actor, IdentityProvider, SessionIdentity};
pub use notify::{BufferSink, Level, LogSink, Messages, Notification, NotificationSink};
pub use record::{Enriched, OwnerSnapshot, Payload, Record, RecordError, Row};
pub use store::{Direction, Filter, InMemoryRemoteStore, Order, Predicate, RemoteStore, StoreError};
pub use sync::{
    CollectionView, IdentityWatch, ProfileLookup, Scope, SyncConfig, SyncContext, SyncError,
    Synchronizer,
};

// Derive macro for Payload; shares the trait's name in the macro namespace.
pub use cinesync_macros::Payload;

#[cfg(feature = "emitter")]
pub use notify::EmitterSink;

// Re-export the EventEmitter from the event_emitter_rs crate
#[cfg(feature = "emitter")]
pub use event_emitter_rs::EventEmitter;
