//! Owner snapshot lookup - joins records with their owners' profiles.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::record::{OwnerSnapshot, Row};
use crate::store::{Filter, RemoteStore};

/// Where owner display attributes live in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileLookup {
    pub collection: String,
    /// Field matched against record owner ids.
    pub key_field: String,
    pub name_field: String,
    pub avatar_field: String,
}

impl Default for ProfileLookup {
    fn default() -> Self {
        ProfileLookup {
            collection: "profiles".to_string(),
            key_field: "user_id".to_string(),
            name_field: "username".to_string(),
            avatar_field: "avatar_url".to_string(),
        }
    }
}

impl ProfileLookup {
    /// Snapshots for `owners`, fetched in a single request.
    ///
    /// Never fails: owners without a profile are absent from the map, and a
    /// failed lookup yields an empty map. Callers substitute placeholders.
    pub async fn resolve(
        &self,
        store: &dyn RemoteStore,
        owners: &[String],
    ) -> HashMap<String, OwnerSnapshot> {
        if owners.is_empty() {
            return HashMap::new();
        }

        let filter = Filter::new().one_of(self.key_field.as_str(), owners.iter().map(String::as_str));
        match store.select(&self.collection, &filter, None).await {
            Ok(rows) => rows
                .iter()
                .filter_map(|row| {
                    let key = row.get(&self.key_field).and_then(Value::as_str)?;
                    Some((key.to_string(), self.snapshot(row)))
                })
                .collect(),
            Err(err) => {
                warn!(
                    collection = %self.collection,
                    owners = owners.len(),
                    error = %err,
                    "owner lookup failed, using placeholders"
                );
                HashMap::new()
            }
        }
    }

    fn snapshot(&self, row: &Row) -> OwnerSnapshot {
        let text = |field: &str| row.get(field).and_then(Value::as_str).map(str::to_owned);
        OwnerSnapshot {
            display_name: text(&self.name_field),
            avatar: text(&self.avatar_field),
        }
    }
}
