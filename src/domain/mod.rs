//! Domain module
//!
//! Core domain types: money, identifiers, events and errors.

pub mod error;
pub mod events;
pub mod ids;
pub mod money;

pub use error::DomainError;
pub use events::{BillingCycleEvent, CreditLineEvent, DomainEvent, StreamEvent};
pub use ids::{BillingCycleId, CardId, OwnerId, StreamId, CYCLE_LENGTH_DAYS};
pub use money::{Currency, Limit, Money, MoneyError};
