//! Event Store Repository
//!
//! Core implementation of the Event Store pattern.
//! Provides in-memory, append-only streams with optimistic concurrency
//! control and synchronous publish-after-append.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::domain::{StreamEvent, StreamId};

use super::{EventEnvelope, EventHandler, EventStoreError, EventStream};

#[derive(Default)]
struct Inner {
    streams: Mutex<HashMap<StreamId, EventStream>>,
    subscribers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

/// Event Store for persisting and retrieving events
///
/// Cloning is cheap; every clone shares the same streams and subscribers.
#[derive(Clone, Default)]
pub struct EventStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for EventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStore")
            .field("streams", &self.stream_count())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl EventStore {
    /// Create an empty event store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `events` to `stream_id` if its current version equals
    /// `expected_version`.
    ///
    /// The version check and the write happen under one lock, so of two
    /// appends racing with the same expected version at most one succeeds.
    /// On success the new events are published to every subscriber on the
    /// caller's thread, after the lock is released.
    pub fn append<E: StreamEvent>(
        &self,
        stream_id: &StreamId,
        events: Vec<E>,
        expected_version: i64,
    ) -> Result<(), EventStoreError> {
        let appended = {
            let mut streams = self
                .inner
                .streams
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            let current_version = streams.get(stream_id).map_or(0, EventStream::version);
            if current_version != expected_version {
                tracing::warn!(
                    stream_id = %stream_id,
                    expected = expected_version,
                    actual = current_version,
                    "Concurrency conflict on append"
                );
                return Err(EventStoreError::ConcurrencyConflict {
                    stream_id: stream_id.clone(),
                    expected: expected_version,
                    actual: current_version,
                });
            }

            if events.is_empty() {
                return Ok(());
            }

            let stream = streams.entry(stream_id.clone()).or_default();
            let appended = stream.append(
                stream_id,
                events.into_iter().map(StreamEvent::into_domain).collect(),
            );

            tracing::info!(
                stream_id = %stream_id,
                new_version = stream.version(),
                event_count = appended.len(),
                "Appended events to stream"
            );

            appended
        };

        self.publish(&appended);
        Ok(())
    }

    /// Read all events of family `E` from a stream, in append order.
    ///
    /// An unknown stream reads as empty.
    pub fn read<E: StreamEvent>(&self, stream_id: &StreamId) -> Vec<E> {
        let streams = self
            .inner
            .streams
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let events: Vec<E> = streams
            .get(stream_id)
            .map(|stream| {
                stream
                    .events()
                    .iter()
                    .filter_map(|envelope| E::from_domain(&envelope.data).cloned())
                    .collect()
            })
            .unwrap_or_default();

        tracing::debug!(stream_id = %stream_id, count = events.len(), "Read events");
        events
    }

    /// Read full envelopes of a stream, in append order.
    pub fn read_envelopes(&self, stream_id: &StreamId) -> Vec<EventEnvelope> {
        self.inner
            .streams
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(stream_id)
            .map(|stream| stream.events().to_vec())
            .unwrap_or_default()
    }

    /// Current version (number of events) of a stream; 0 if it doesn't exist
    pub fn stream_version(&self, stream_id: &StreamId) -> i64 {
        self.inner
            .streams
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(stream_id)
            .map_or(0, EventStream::version)
    }

    /// Check if a stream has at least one event
    pub fn stream_exists(&self, stream_id: &StreamId) -> bool {
        self.stream_version(stream_id) > 0
    }

    /// Number of non-empty streams
    pub fn stream_count(&self) -> usize {
        self.inner
            .streams
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Register a handler; handlers run in registration order
    pub fn subscribe<H: EventHandler + 'static>(&self, handler: H) {
        tracing::info!(handler = handler.name(), "Subscriber registered");
        self.inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(handler));
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn publish(&self, events: &[EventEnvelope]) {
        // Snapshot so handlers may append (and subscribe) re-entrantly.
        let subscribers: Vec<Arc<dyn EventHandler>> = self
            .inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for handler in &subscribers {
            for event in events {
                let outcome = catch_unwind(AssertUnwindSafe(|| handler.handle(self, event)));
                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::error!(
                        handler = handler.name(),
                        stream_id = %event.stream_id,
                        event_type = event.event_type,
                        error = %e,
                        "Subscriber failed"
                    ),
                    Err(_) => tracing::error!(
                        handler = handler.name(),
                        stream_id = %event.stream_id,
                        event_type = event.event_type,
                        "Subscriber panicked"
                    ),
                }
            }
        }
    }
}
