//! RemoteStore - the query contract of the hosted table service.

use async_trait::async_trait;

use super::{Filter, Order, StoreError};
use crate::record::Row;

/// Record-oriented remote storage, addressed by collection name.
///
/// Filters are conjunctions of field predicates. Collections may declare
/// uniqueness constraints; an insert violating one fails with
/// [`StoreError::Conflict`] instead of a generic error.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Rows matching `filter`, sorted by `order` when given. Rows comparing
    /// equal keep their insertion order.
    async fn select(
        &self,
        collection: &str,
        filter: &Filter,
        order: Option<&Order>,
    ) -> Result<Vec<Row>, StoreError>;

    /// Insert a row. The store assigns `id`, `created_at` and `updated_at`
    /// and returns the stored row.
    async fn insert(&self, collection: &str, row: Row) -> Result<Row, StoreError>;

    /// Apply `fields` to every row matching `filter` and refresh their
    /// `updated_at`. Returns the number of rows affected.
    async fn update(&self, collection: &str, filter: &Filter, fields: Row)
        -> Result<u64, StoreError>;

    /// Delete every row matching `filter`. Returns the number of rows removed.
    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Number of rows matching `filter`.
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        Ok(self.select(collection, filter, None).await?.len() as u64)
    }
}
