//! Collection state and refresh sequencing.

use std::sync::atomic::{AtomicU64, Ordering};

use super::config::Scope;
use crate::record::Enriched;

/// Monotonic stamps for refreshes, taken when a refresh is initiated.
#[derive(Debug, Default)]
pub(crate) struct RefreshSequence {
    initiated: AtomicU64,
}

impl RefreshSequence {
    pub(crate) fn begin(&self) -> u64 {
        self.initiated.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn latest(&self) -> u64 {
        self.initiated.load(Ordering::SeqCst)
    }
}

/// What a refresh hands back to be applied.
pub(crate) struct Loaded<P> {
    pub(crate) seq: u64,
    pub(crate) scope: Scope,
    pub(crate) collection: Vec<Enriched<P>>,
    pub(crate) own_record: Option<Enriched<P>>,
}

pub(crate) struct SyncState<P> {
    pub(crate) scope: Scope,
    pub(crate) collection: Vec<Enriched<P>>,
    pub(crate) is_loading: bool,
    pub(crate) own_record: Option<Enriched<P>>,
    /// Stamp of the refresh whose result is currently shown.
    pub(crate) applied: u64,
}

impl<P> SyncState<P> {
    pub(crate) fn new(scope: Scope) -> Self {
        SyncState {
            scope,
            collection: Vec::new(),
            is_loading: true,
            own_record: None,
            applied: 0,
        }
    }

    /// Apply a refresh result unless a newer one is already shown or the
    /// scope moved while it was in flight. Returns whether it was applied.
    pub(crate) fn apply(&mut self, loaded: Loaded<P>, latest: u64) -> bool {
        if loaded.seq < self.applied || loaded.scope != self.scope {
            self.settle(loaded.seq, latest);
            return false;
        }
        self.applied = loaded.seq;
        self.collection = loaded.collection;
        self.own_record = loaded.own_record;
        self.settle(loaded.seq, latest);
        true
    }

    /// Loading ends when the most recently initiated refresh completes,
    /// whatever its outcome.
    pub(crate) fn settle(&mut self, seq: u64, latest: u64) {
        if seq >= latest {
            self.is_loading = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{OwnerSnapshot, Record};
    use chrono::Utc;

    fn enriched(id: &str) -> Enriched<u32> {
        Enriched {
            record: Record {
                id: id.to_string(),
                owner_id: "u1".into(),
                parent_key: "m1".into(),
                payload: 0,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            owner: OwnerSnapshot::default(),
        }
    }

    fn loaded(seq: u64, ids: &[&str]) -> Loaded<u32> {
        Loaded {
            seq,
            scope: Scope::Parent("m1".into()),
            collection: ids.iter().map(|id| enriched(id)).collect(),
            own_record: None,
        }
    }

    #[test]
    fn sequence_is_monotonic() {
        let seq = RefreshSequence::default();
        assert_eq!(seq.begin(), 1);
        assert_eq!(seq.begin(), 2);
        assert_eq!(seq.latest(), 2);
    }

    #[test]
    fn stale_result_is_discarded() {
        let mut state = SyncState::new(Scope::Parent("m1".into()));

        assert!(state.apply(loaded(2, &["new"]), 2));
        assert!(!state.apply(loaded(1, &["old"]), 2));

        assert_eq!(state.collection.len(), 1);
        assert_eq!(state.collection[0].id, "new");
        assert!(!state.is_loading);
    }

    #[test]
    fn older_result_keeps_loading_until_latest_lands() {
        let mut state = SyncState::new(Scope::Parent("m1".into()));

        assert!(state.apply(loaded(1, &["a"]), 2));
        assert!(state.is_loading);

        assert!(state.apply(loaded(2, &["a", "b"]), 2));
        assert!(!state.is_loading);
        assert_eq!(state.collection.len(), 2);
    }

    #[test]
    fn result_for_previous_scope_is_discarded() {
        let mut state = SyncState::new(Scope::Parent("m2".into()));
        assert!(!state.apply(loaded(1, &["a"]), 1));
        assert!(state.collection.is_empty());
        assert!(!state.is_loading);
    }
}
