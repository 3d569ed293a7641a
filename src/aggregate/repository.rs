//! Aggregate Repository
//!
//! Loads aggregates by replaying their stream and saves pending events under
//! an expected-version check.

use std::marker::PhantomData;

use crate::domain::StreamId;
use crate::event_store::{EventStore, EventStoreError};

use super::{Aggregate, AggregateRoot};

/// Repository for one aggregate type on top of the shared event store
#[derive(Debug, Clone)]
pub struct Repository<A: Aggregate> {
    event_store: EventStore,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A: Aggregate> Repository<A> {
    pub fn new(event_store: EventStore) -> Self {
        Self {
            event_store,
            _aggregate: PhantomData,
        }
    }

    /// Reconstruct an aggregate by replaying its stream.
    ///
    /// A missing stream yields the initial state at version 0.
    pub fn find(&self, stream_id: &StreamId) -> AggregateRoot<A> {
        let events = self.event_store.read::<A::Event>(stream_id);
        let root = AggregateRoot::from_events(&events);

        tracing::debug!(
            aggregate_type = A::aggregate_type(),
            stream_id = %stream_id,
            version = root.version(),
            "Loaded aggregate"
        );

        root
    }

    /// Save pending events, expecting the version the root was loaded at
    pub fn save(&self, root: &mut AggregateRoot<A>) -> Result<(), EventStoreError> {
        let expected_version = root.loaded_version();
        self.save_expecting(root, expected_version)
    }

    /// Save pending events with an explicit expected version.
    ///
    /// On conflict the root keeps its pending events; callers re-load
    /// instead of re-saving it.
    pub fn save_expecting(
        &self,
        root: &mut AggregateRoot<A>,
        expected_version: i64,
    ) -> Result<(), EventStoreError> {
        let Some(stream_id) = root.state().stream_id() else {
            // Nothing was ever applied, so there is nothing to write.
            return Ok(());
        };

        self.event_store
            .append(&stream_id, root.pending_events().to_vec(), expected_version)?;
        let saved = root.mark_committed();

        tracing::debug!(
            aggregate_type = A::aggregate_type(),
            stream_id = %stream_id,
            saved = saved.len(),
            version = root.version(),
            "Saved aggregate"
        );

        Ok(())
    }
}
