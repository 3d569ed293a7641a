//! card_consistency Library
//!
//! Event-sourced credit lines and billing cycles kept consistent by a
//! reconciliation process over an in-memory event store.

pub mod aggregate;
pub mod config;
pub mod domain;
pub mod event_store;
pub mod handlers;
pub mod ownership;
pub mod reconciliation;

mod error;

pub use config::{Config, LogFormat};
pub use domain::{
    BillingCycleEvent, BillingCycleId, CardId, CreditLineEvent, Currency, DomainError, DomainEvent,
    Limit, Money, OwnerId,
};
pub use error::{AppError, AppResult};
pub use event_store::{EventStore, EventStoreError};
pub use handlers::Handlers;
pub use reconciliation::{Reconciler, RetryPolicy};
