//! Event envelopes
//!
//! Stored events wrapped with their stream metadata.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{DomainEvent, StreamId};

/// An event as held by the store. Immutable once appended.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    pub data: DomainEvent,
    pub stream_id: StreamId,
    pub event_type: &'static str,
    pub event_id: Uuid,
    /// 1-based position within the stream
    pub stream_version: i64,
    pub occurred_at: DateTime<Utc>,
}

impl EventEnvelope {
    pub fn new(stream_id: StreamId, data: DomainEvent, stream_version: i64) -> Self {
        Self {
            event_type: data.event_type(),
            data,
            stream_id,
            event_id: Uuid::new_v4(),
            stream_version,
            occurred_at: Utc::now(),
        }
    }
}

/// Ordered events of one stream. `version()` is the number of events.
#[derive(Debug, Clone, Default)]
pub struct EventStream {
    events: Vec<EventEnvelope>,
}

impl EventStream {
    pub fn version(&self) -> i64 {
        self.events.len() as i64
    }

    pub fn events(&self) -> &[EventEnvelope] {
        &self.events
    }

    /// Wrap `events` into envelopes numbered after the current version and
    /// append them. Returns the appended envelopes.
    pub(crate) fn append(
        &mut self,
        stream_id: &StreamId,
        events: Vec<DomainEvent>,
    ) -> Vec<EventEnvelope> {
        let start = self.version();
        let appended: Vec<EventEnvelope> = events
            .into_iter()
            .enumerate()
            .map(|(offset, event)| {
                EventEnvelope::new(stream_id.clone(), event, start + offset as i64 + 1)
            })
            .collect();
        self.events.extend(appended.iter().cloned());
        appended
    }
}
