//! Command Handlers module
//!
//! Thin command services: load an aggregate, run one command, save once.
//! A conflict is returned to the caller; nothing here retries.

mod billing_cycle_handler;
mod credit_line_handler;
mod ownership_handler;

#[cfg(test)]
mod tests;

pub use billing_cycle_handler::BillingCycleHandler;
pub use credit_line_handler::CreditLineHandler;
pub use ownership_handler::OwnershipHandler;

use crate::event_store::EventStore;
use crate::ownership::OwnershipRepository;
use crate::reconciliation::{Reconciler, RetryPolicy};

/// All handlers wired to one event store with the reconciliation process
/// subscribed.
#[derive(Debug, Clone)]
pub struct Handlers {
    pub event_store: EventStore,
    pub credit_lines: CreditLineHandler,
    pub billing_cycles: BillingCycleHandler,
    pub ownership: OwnershipHandler,
}

impl Handlers {
    pub fn new(policy: RetryPolicy) -> Self {
        let event_store = EventStore::new();
        event_store.subscribe(Reconciler::new(policy));

        let ownership = OwnershipRepository::new();

        Self {
            credit_lines: CreditLineHandler::new(event_store.clone()),
            billing_cycles: BillingCycleHandler::new(event_store.clone(), ownership.clone()),
            ownership: OwnershipHandler::new(ownership),
            event_store,
        }
    }
}
