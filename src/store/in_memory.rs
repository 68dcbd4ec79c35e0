//! InMemoryRemoteStore - HashMap-backed remote store for testing and development.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::{Filter, Order, RemoteStore, StoreError};
use crate::record::{Row, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD};

#[derive(Default)]
struct Table {
    /// Rows in insertion order.
    rows: Vec<Row>,
    /// Field sets that must be unique across rows.
    unique: Vec<Vec<String>>,
}

struct Storage {
    tables: HashMap<String, Table>,
    unavailable: HashSet<String>,
    last_stamp: DateTime<Utc>,
}

impl Storage {
    /// Strictly increasing timestamps, truncated to microseconds so the
    /// stored text round-trips exactly.
    fn next_stamp(&mut self) -> String {
        let now = Utc::now().trunc_subsecs(6);
        let stamp = if now > self.last_stamp {
            now
        } else {
            self.last_stamp + Duration::microseconds(1)
        };
        self.last_stamp = stamp;
        stamp.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn check_available(&self, collection: &str) -> Result<(), StoreError> {
        if self.unavailable.contains(collection) {
            return Err(StoreError::Unavailable(format!(
                "collection {} is unreachable",
                collection
            )));
        }
        Ok(())
    }
}

/// In-memory remote store backed by a HashMap of tables.
///
/// Assigns uuid ids and RFC 3339 timestamps on insert and enforces the
/// uniqueness constraints registered with [`with_unique`](Self::with_unique).
/// Clone-friendly via Arc.
#[derive(Clone)]
pub struct InMemoryRemoteStore {
    storage: Arc<RwLock<Storage>>,
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRemoteStore {
    /// Create a new empty store without constraints.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(Storage {
                tables: HashMap::new(),
                unavailable: HashSet::new(),
                last_stamp: DateTime::<Utc>::MIN_UTC,
            })),
        }
    }

    /// A store laid out like the catalog backend: one review per user per
    /// title, one favorite per user per title, one profile per user.
    pub fn for_catalog() -> Self {
        Self::new()
            .with_unique("reviews", &["user_id", "movie_id"])
            .with_unique("favorites", &["user_id", "movie_id"])
            .with_unique("profiles", &["user_id"])
    }

    /// Register a uniqueness constraint over `fields` in `collection`.
    pub fn with_unique(self, collection: &str, fields: &[&str]) -> Self {
        if let Ok(mut storage) = self.storage.write() {
            storage
                .tables
                .entry(collection.to_string())
                .or_default()
                .unique
                .push(fields.iter().map(|f| f.to_string()).collect());
        }
        self
    }

    /// Make every call against `collection` fail with
    /// [`StoreError::Unavailable`] until switched back.
    pub fn set_unavailable(&self, collection: &str, unavailable: bool) {
        if let Ok(mut storage) = self.storage.write() {
            if unavailable {
                storage.unavailable.insert(collection.to_string());
            } else {
                storage.unavailable.remove(collection);
            }
        }
    }

    /// Number of rows currently stored in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.storage
            .read()
            .map(|s| s.tables.get(collection).map(|t| t.rows.len()).unwrap_or(0))
            .unwrap_or(0)
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Storage>, StoreError> {
        self.storage
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".into()))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Storage>, StoreError> {
        self.storage
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".into()))
    }
}

/// First constraint of `table` that `candidate` would violate, ignoring the
/// row at `skip`.
fn violated_constraint(table: &Table, candidate: &Row, skip: Option<usize>) -> Option<String> {
    let id_clash = candidate.get(ID_FIELD).map_or(false, |id| {
        table
            .rows
            .iter()
            .enumerate()
            .any(|(i, row)| Some(i) != skip && row.get(ID_FIELD) == Some(id))
    });
    if id_clash {
        return Some(ID_FIELD.to_string());
    }

    table.unique.iter().find_map(|fields| {
        let key: Option<Vec<&Value>> = fields.iter().map(|f| candidate.get(f)).collect();
        let key = key?;
        let clash = table.rows.iter().enumerate().any(|(i, row)| {
            Some(i) != skip
                && fields
                    .iter()
                    .zip(key.iter())
                    .all(|(f, value)| row.get(f) == Some(*value))
        });
        clash.then(|| fields.join(","))
    })
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn select(
        &self,
        collection: &str,
        filter: &Filter,
        order: Option<&Order>,
    ) -> Result<Vec<Row>, StoreError> {
        let storage = self.read()?;
        storage.check_available(collection)?;

        let mut rows: Vec<Row> = storage
            .tables
            .get(collection)
            .map(|table| {
                table
                    .rows
                    .iter()
                    .filter(|row| filter.matches(row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        // sort_by is stable, ties keep insertion order.
        if let Some(order) = order {
            rows.sort_by(|a, b| order.compare(a, b));
        }
        Ok(rows)
    }

    async fn insert(&self, collection: &str, mut row: Row) -> Result<Row, StoreError> {
        let mut storage = self.write()?;
        storage.check_available(collection)?;

        let missing_id = row.get(ID_FIELD).map_or(true, Value::is_null);
        if missing_id {
            row.insert(ID_FIELD.to_string(), Value::from(Uuid::new_v4().to_string()));
        }
        let stamp = storage.next_stamp();
        row.insert(CREATED_AT_FIELD.to_string(), Value::from(stamp.clone()));
        row.insert(UPDATED_AT_FIELD.to_string(), Value::from(stamp));

        let table = storage.tables.entry(collection.to_string()).or_default();
        if let Some(constraint) = violated_constraint(table, &row, None) {
            return Err(StoreError::Conflict {
                collection: collection.to_string(),
                constraint,
            });
        }
        table.rows.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        fields: Row,
    ) -> Result<u64, StoreError> {
        let mut storage = self.write()?;
        storage.check_available(collection)?;

        let matching: Vec<usize> = match storage.tables.get(collection) {
            Some(table) => table
                .rows
                .iter()
                .enumerate()
                .filter(|(_, row)| filter.matches(row))
                .map(|(i, _)| i)
                .collect(),
            None => return Ok(0),
        };
        if matching.is_empty() {
            return Ok(0);
        }

        let stamp = storage.next_stamp();
        let table = storage
            .tables
            .get_mut(collection)
            .ok_or_else(|| StoreError::Unavailable(format!("collection {} vanished", collection)))?;

        let mut updated = Vec::with_capacity(matching.len());
        for &index in &matching {
            let mut row = table.rows[index].clone();
            for (field, value) in &fields {
                if field == ID_FIELD || field == CREATED_AT_FIELD {
                    continue;
                }
                row.insert(field.clone(), value.clone());
            }
            row.insert(UPDATED_AT_FIELD.to_string(), Value::from(stamp.clone()));

            if let Some(constraint) = violated_constraint(table, &row, Some(index)) {
                return Err(StoreError::Conflict {
                    collection: collection.to_string(),
                    constraint,
                });
            }
            updated.push((index, row));
        }

        for (index, row) in updated {
            table.rows[index] = row;
        }
        Ok(matching.len() as u64)
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let mut storage = self.write()?;
        storage.check_available(collection)?;

        let Some(table) = storage.tables.get_mut(collection) else {
            return Ok(0);
        };
        let before = table.rows.len();
        table.rows.retain(|row| !filter.matches(row));
        Ok((before - table.rows.len()) as u64)
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let storage = self.read()?;
        storage.check_available(collection)?;

        Ok(storage
            .tables
            .get(collection)
            .map(|table| table.rows.iter().filter(|row| filter.matches(row)).count())
            .unwrap_or(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn review(user: &str, movie: &str, rating: u8) -> Row {
        row(json!({ "user_id": user, "movie_id": movie, "rating": rating }))
    }

    #[tokio::test]
    async fn insert_assigns_id_and_timestamps() {
        let store = InMemoryRemoteStore::new();
        let stored = store.insert("reviews", review("u1", "m1", 5)).await.unwrap();

        assert!(stored["id"].as_str().is_some());
        assert_eq!(stored["created_at"], stored["updated_at"]);
        assert_eq!(store.len("reviews"), 1);
    }

    #[tokio::test]
    async fn unique_constraint_reports_conflict() {
        let store = InMemoryRemoteStore::for_catalog();
        store.insert("reviews", review("u1", "m1", 5)).await.unwrap();

        let err = store
            .insert("reviews", review("u1", "m1", 3))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::Conflict {
                collection: "reviews".into(),
                constraint: "user_id,movie_id".into(),
            }
        );
        assert!(err.is_conflict());

        // Another user, or another title, is fine.
        store.insert("reviews", review("u2", "m1", 3)).await.unwrap();
        store.insert("reviews", review("u1", "m2", 3)).await.unwrap();
        assert_eq!(store.len("reviews"), 3);
    }

    #[tokio::test]
    async fn select_orders_newest_first_with_stable_ties() {
        let store = InMemoryRemoteStore::new();
        for user in ["u1", "u2", "u3"] {
            store.insert("reviews", review(user, "m1", 4)).await.unwrap();
        }
        store.insert("reviews", review("u4", "m2", 4)).await.unwrap();

        let rows = store
            .select(
                "reviews",
                &Filter::new().eq("movie_id", "m1"),
                Some(&Order::desc(CREATED_AT_FIELD)),
            )
            .await
            .unwrap();
        let users: Vec<&str> = rows.iter().map(|r| r["user_id"].as_str().unwrap()).collect();
        assert_eq!(users, vec!["u3", "u2", "u1"]);
    }

    #[tokio::test]
    async fn update_is_scoped_by_filter_and_advances_updated_at() {
        let store = InMemoryRemoteStore::new();
        let stored = store.insert("reviews", review("u1", "m1", 5)).await.unwrap();
        let id = stored["id"].as_str().unwrap().to_string();

        let wrong_owner = Filter::new().eq("id", id.as_str()).eq("user_id", "u2");
        let affected = store
            .update("reviews", &wrong_owner, row(json!({ "rating": 1 })))
            .await
            .unwrap();
        assert_eq!(affected, 0);

        let owner = Filter::new().eq("id", id.as_str()).eq("user_id", "u1");
        let affected = store
            .update(
                "reviews",
                &owner,
                row(json!({ "rating": 4, "created_at": "1999-01-01T00:00:00Z" })),
            )
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let rows = store.select("reviews", &Filter::new(), None).await.unwrap();
        assert_eq!(rows[0]["rating"], json!(4));
        assert_eq!(rows[0]["created_at"], stored["created_at"]);
        assert!(rows[0]["updated_at"].as_str() > stored["updated_at"].as_str());
    }

    #[tokio::test]
    async fn delete_counts_removed_rows() {
        let store = InMemoryRemoteStore::new();
        store.insert("reviews", review("u1", "m1", 5)).await.unwrap();
        store.insert("reviews", review("u1", "m2", 5)).await.unwrap();
        store.insert("reviews", review("u2", "m1", 5)).await.unwrap();

        let removed = store
            .delete("reviews", &Filter::new().eq("user_id", "u1"))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(
            store.count("reviews", &Filter::new()).await.unwrap(),
            1
        );
        assert_eq!(
            store
                .delete("missing", &Filter::new())
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn unavailable_collection_fails_every_call() {
        let store = InMemoryRemoteStore::new();
        store.set_unavailable("profiles", true);

        let err = store
            .select("profiles", &Filter::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(store.insert("profiles", row(json!({}))).await.is_err());

        store.set_unavailable("profiles", false);
        assert!(store.select("profiles", &Filter::new(), None).await.is_ok());
    }

    #[tokio::test]
    async fn clone_shares_storage() {
        let store = InMemoryRemoteStore::new();
        let clone = store.clone();
        store.insert("reviews", review("u1", "m1", 5)).await.unwrap();
        assert_eq!(clone.len("reviews"), 1);
    }
}
