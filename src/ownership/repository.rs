//! Versioned collection
//!
//! In-memory document store with compare-and-swap writes. Used for state
//! that is versioned as a whole rather than event sourced.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::StreamId;
use crate::event_store::EventStoreError;

/// A record together with the version it was stored at
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub record: T,
    pub version: i64,
}

/// Documents keyed by id; every successful save bumps the version by one.
#[derive(Debug)]
pub struct VersionedCollection<T> {
    entries: Arc<Mutex<HashMap<StreamId, Versioned<T>>>>,
}

impl<T> Clone for VersionedCollection<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T> Default for VersionedCollection<T> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T: Clone> VersionedCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, id: &StreamId) -> Option<Versioned<T>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Store `record` if the stored version equals `expected_version`
    /// (0 for a missing record). Returns the new version.
    pub fn save(
        &self,
        id: &StreamId,
        record: T,
        expected_version: i64,
    ) -> Result<i64, EventStoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        let current_version = entries.get(id).map_or(0, |entry| entry.version);
        if current_version != expected_version {
            tracing::warn!(
                id = %id,
                expected = expected_version,
                actual = current_version,
                "Concurrency conflict on versioned save"
            );
            return Err(EventStoreError::ConcurrencyConflict {
                stream_id: id.clone(),
                expected: expected_version,
                actual: current_version,
            });
        }

        let version = expected_version + 1;
        entries.insert(id.clone(), Versioned { record, version });
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_missing_record() {
        let collection = VersionedCollection::<String>::new();
        assert!(collection.find(&StreamId::new("missing")).is_none());
    }

    #[test]
    fn test_save_bumps_version_sequentially() {
        let collection = VersionedCollection::new();
        let id = StreamId::new("doc");

        for expected in 0..5 {
            let version = collection.save(&id, format!("v{expected}"), expected).unwrap();
            assert_eq!(version, expected + 1);
        }

        let stored = collection.find(&id).unwrap();
        assert_eq!(stored.version, 5);
        assert_eq!(stored.record, "v4");
    }

    #[test]
    fn test_stale_save_fails() {
        let collection = VersionedCollection::new();
        let id = StreamId::new("doc");
        collection.save(&id, 1, 0).unwrap();

        let result = collection.save(&id, 2, 0);

        assert!(matches!(result, Err(EventStoreError::ConcurrencyConflict { actual: 1, .. })));
        assert_eq!(collection.find(&id).unwrap().record, 1);
    }

    #[test]
    fn test_cant_update_concurrently() {
        let collection = VersionedCollection::new();
        let id = StreamId::new("doc");

        let results: Vec<bool> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..10)
                .map(|i| {
                    let collection = collection.clone();
                    let id = id.clone();
                    scope.spawn(move || collection.save(&id, i, 0).is_ok())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|ok| **ok).count(), 1);
        assert_eq!(collection.find(&id).unwrap().version, 1);
    }
}
