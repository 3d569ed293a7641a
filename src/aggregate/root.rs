//! Aggregate root
//!
//! Wraps an aggregate state with the events produced since it was loaded.

use super::Aggregate;

/// Loaded aggregate plus its not-yet-persisted ("pending") events.
///
/// `loaded_version` is the stream version the state was rebuilt from; it is
/// the expected version when the pending events are saved.
#[derive(Debug, Clone)]
pub struct AggregateRoot<A: Aggregate> {
    state: A,
    loaded_version: i64,
    pending: Vec<A::Event>,
}

impl<A: Aggregate> Default for AggregateRoot<A> {
    fn default() -> Self {
        Self::from_state(A::default())
    }
}

impl<A: Aggregate> AggregateRoot<A> {
    /// Rebuild from a full stream
    pub fn from_events(events: &[A::Event]) -> Self {
        Self::from_state(A::recreate(events))
    }

    fn from_state(state: A) -> Self {
        let loaded_version = state.version();
        Self {
            state,
            loaded_version,
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> &A {
        &self.state
    }

    /// Version including pending events
    pub fn version(&self) -> i64 {
        self.state.version()
    }

    pub fn loaded_version(&self) -> i64 {
        self.loaded_version
    }

    pub fn pending_events(&self) -> &[A::Event] {
        &self.pending
    }

    /// Run a command against the current state.
    ///
    /// On success the emitted events are applied immediately and queued as
    /// pending. On error nothing changes.
    pub fn execute<F, E>(&mut self, command: F) -> Result<(), E>
    where
        F: FnOnce(&A) -> Result<Vec<A::Event>, E>,
    {
        let events = command(&self.state)?;
        for event in events {
            self.record(event);
        }
        Ok(())
    }

    /// Apply one event and queue it as pending
    pub(crate) fn record(&mut self, event: A::Event) {
        let state = std::mem::take(&mut self.state);
        self.state = state.apply(&event);
        self.pending.push(event);
    }

    /// Drain the pending queue after a successful save
    pub(crate) fn mark_committed(&mut self) -> Vec<A::Event> {
        self.loaded_version = self.state.version();
        std::mem::take(&mut self.pending)
    }
}
