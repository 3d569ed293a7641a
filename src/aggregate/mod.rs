//! Aggregate module
//!
//! Aggregate Root pattern implementation for Event Sourcing.
//! State is a pure fold over a stream's events; commands only decide which
//! events to emit.

pub mod billing_cycle;
pub mod credit_line;
mod repository;
mod root;

pub use billing_cycle::{BillingCycle, CycleStatus, MAX_WITHDRAWALS_IN_CYCLE};
pub use credit_line::{CreditLine, CurrentCycle};
pub use repository::Repository;
pub use root::AggregateRoot;

use crate::domain::{StreamEvent, StreamId};

/// Aggregate trait that all aggregates must implement
pub trait Aggregate: Sized + Default + Clone {
    /// The event family this aggregate folds
    type Event: StreamEvent;

    /// Get the aggregate type name (for logs)
    fn aggregate_type() -> &'static str;

    /// Stream this aggregate is stored in (None before its first event)
    fn stream_id(&self) -> Option<StreamId>;

    /// Get the current version (number of events applied)
    fn version(&self) -> i64;

    /// Apply an event to update the aggregate state
    fn apply(self, event: &Self::Event) -> Self;

    /// Rebuild state by folding a full stream from the initial state
    fn recreate<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a Self::Event>,
    {
        events.into_iter().fold(Self::default(), Self::apply)
    }
}
