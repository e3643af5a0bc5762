//! # Snapshot
//!
//! A convenience copy of the last record and the last collection a
//! [`RequestService`](crate::RequestService) received. It exists so several readers can look
//! at recent data without awaiting a new operation.
//!
//! **The snapshot is not authoritative.** It is written when an operation is fulfilled,
//! last write wins, and nothing invalidates it when the server changes. Every value is
//! stamped with the instant it was stored so readers can judge its age. The service itself
//! never reads from it.

use arc_swap::ArcSwapOption;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A value together with the instant it was stored.
#[derive(Debug, Clone)]
pub struct Stamped<V> {
    pub value: V,
    pub stored_at: Instant,
}

impl<V> Stamped<V> {
    fn now(value: V) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }
}

struct Slots<T> {
    record: ArcSwapOption<Stamped<T>>,
    collection: ArcSwapOption<Stamped<Vec<T>>>,
}

/// Last-known record and collection, shared by every clone of a service.
pub struct Snapshot<T> {
    slots: Arc<Slots<T>>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
        }
    }
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Slots {
                record: ArcSwapOption::empty(),
                collection: ArcSwapOption::empty(),
            }),
        }
    }
}

impl<T> Snapshot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last record fulfilled by `get`, `save` or `update`.
    pub fn record(&self) -> Option<Arc<Stamped<T>>> {
        self.slots.record.load_full()
    }

    /// Last collection fulfilled by `query`.
    pub fn collection(&self) -> Option<Arc<Stamped<Vec<T>>>> {
        self.slots.collection.load_full()
    }

    pub(crate) fn store_record(&self, record: T) {
        self.slots.record.store(Some(Arc::new(Stamped::now(record))));
    }

    pub(crate) fn store_collection(&self, records: Vec<T>) {
        self.slots
            .collection
            .store(Some(Arc::new(Stamped::now(records))));
    }

    /// Drops the record snapshot if `matches` says it is the one that was removed.
    pub(crate) fn forget_record_if(&self, matches: impl Fn(&T) -> bool) {
        self.slots.record.rcu(|current| match current {
            Some(stamped) if matches(&stamped.value) => None,
            other => other.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins() {
        let snapshot = Snapshot::new();
        snapshot.store_record(1u32);
        snapshot.store_record(2u32);
        assert_eq!(snapshot.record().map(|s| s.value), Some(2));
        assert!(snapshot.collection().is_none());
    }

    #[test]
    fn forget_only_matching_record() {
        let snapshot = Snapshot::new();
        snapshot.store_record(5u32);
        snapshot.forget_record_if(|v| *v == 6);
        assert!(snapshot.record().is_some());
        snapshot.forget_record_if(|v| *v == 5);
        assert!(snapshot.record().is_none());
    }
}
