//! Event Store module
//!
//! In-memory persistence layer for Event Sourcing.
//! Streams live for the lifetime of the process.

mod envelope;
mod error;
mod repository;
mod subscriber;

pub use envelope::{EventEnvelope, EventStream};
pub use error::EventStoreError;
pub use repository::EventStore;
pub use subscriber::EventHandler;
