//! Error types for synchronizer operations.

use crate::record::RecordError;
use crate::store::StoreError;

/// Outcome of a failed synchronizer operation.
///
/// Every variant is recovered at the synchronizer boundary: mutating calls
/// have already notified the user when one of these is returned, and the
/// synchronizer stays usable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// A mutating call was made with nobody signed in.
    #[error("not authenticated")]
    NotAuthenticated,
    /// The store rejected a create because the actor already has a record
    /// for this subject.
    #[error("duplicate record")]
    DuplicateRecord,
    /// A create, update or delete failed for any other reason.
    #[error("write failed: {0}")]
    WriteFailed(String),
    /// The collection could not be loaded.
    #[error("fetch failed: {0}")]
    FetchFailed(String),
    /// Input was rejected before reaching the store.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => SyncError::DuplicateRecord,
            other => SyncError::WriteFailed(other.to_string()),
        }
    }
}

impl From<RecordError> for SyncError {
    fn from(err: RecordError) -> Self {
        SyncError::WriteFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_map_to_duplicates() {
        let err: SyncError = StoreError::Conflict {
            collection: "reviews".into(),
            constraint: "user_id,movie_id".into(),
        }
        .into();
        assert_eq!(err, SyncError::DuplicateRecord);

        let err: SyncError = StoreError::Unavailable("down".into()).into();
        assert_eq!(err, SyncError::WriteFailed("store unavailable: down".into()));
    }
}
