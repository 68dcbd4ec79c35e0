//! Synchronizer configuration.

use serde::{Deserialize, Serialize};

use super::lookup::ProfileLookup;
use crate::identity::Actor;

/// What a synchronizer's parent key is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum Scope {
    /// A fixed subject, e.g. the title whose reviews are shown.
    Parent(String),
    /// The current actor's own id, e.g. their favorites or profile.
    Actor,
}

impl Scope {
    /// The parent key in effect for `actor`. An actor scope with nobody
    /// signed in has no key.
    pub fn parent_key(&self, actor: Option<&Actor>) -> Option<String> {
        match self {
            Scope::Parent(key) => Some(key.clone()),
            Scope::Actor => actor.map(|a| a.id.clone()),
        }
    }
}

/// Configuration for one synchronizer instance.
///
/// ```ignore
/// let config: SyncConfig = serde_json::from_str(r#"{
///     "scope": { "kind": "parent", "key": "m42" },
///     "profiles": { "collection": "public_profiles" }
/// }"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Overrides the payload's default collection name.
    #[serde(default)]
    pub collection: Option<String>,
    pub scope: Scope,
    #[serde(default)]
    pub profiles: ProfileLookup,
}

impl SyncConfig {
    /// Bind to a fixed parent key.
    pub fn for_parent(parent_key: impl Into<String>) -> Self {
        SyncConfig {
            collection: None,
            scope: Scope::Parent(parent_key.into()),
            profiles: ProfileLookup::default(),
        }
    }

    /// Bind to whoever is signed in.
    pub fn for_actor() -> Self {
        SyncConfig {
            collection: None,
            scope: Scope::Actor,
            profiles: ProfileLookup::default(),
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn with_profiles(mut self, profiles: ProfileLookup) -> Self {
        self.profiles = profiles;
        self
    }
}
