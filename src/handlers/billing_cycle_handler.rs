//! Billing Cycle Handler
//!
//! Withdrawals, repayments and closing of billing cycles.

use crate::aggregate::{BillingCycle, Repository};
use crate::domain::{BillingCycleId, DomainError, Money, OwnerId};
use crate::error::AppResult;
use crate::event_store::EventStore;
use crate::ownership::OwnershipRepository;

/// Handler for billing cycle commands
#[derive(Debug, Clone)]
pub struct BillingCycleHandler {
    billing_cycles: Repository<BillingCycle>,
    ownership: OwnershipRepository,
}

impl BillingCycleHandler {
    pub fn new(event_store: EventStore, ownership: OwnershipRepository) -> Self {
        Self {
            billing_cycles: Repository::new(event_store),
            ownership,
        }
    }

    /// Withdraw on behalf of `owner`, who must have access to the card
    pub fn withdraw(
        &self,
        cycle_id: &BillingCycleId,
        amount: &Money,
        owner: OwnerId,
    ) -> AppResult<()> {
        if !self.ownership.find(cycle_id.card_id()).record.has_access(owner) {
            tracing::warn!(cycle_id = %cycle_id, owner = %owner, "Withdrawal without access");
            return Err(DomainError::AccessDenied(owner.to_string()).into());
        }

        let mut cycle = self.billing_cycles.find(&cycle_id.stream_id());
        cycle.execute(|state| state.withdraw(amount))?;
        self.billing_cycles.save(&mut cycle)?;

        tracing::info!(cycle_id = %cycle_id, amount = %amount, "Withdrawal recorded");
        Ok(())
    }

    pub fn repay(&self, cycle_id: &BillingCycleId, amount: &Money) -> AppResult<()> {
        let mut cycle = self.billing_cycles.find(&cycle_id.stream_id());
        cycle.execute(|state| state.repay(amount))?;
        self.billing_cycles.save(&mut cycle)?;

        tracing::info!(cycle_id = %cycle_id, amount = %amount, "Repayment recorded");
        Ok(())
    }

    /// Close the cycle; the reconciliation process records the closure on
    /// the credit line when the event is published.
    pub fn close(&self, cycle_id: &BillingCycleId) -> AppResult<()> {
        let mut cycle = self.billing_cycles.find(&cycle_id.stream_id());
        cycle.execute(|state| state.close_cycle())?;
        self.billing_cycles.save(&mut cycle)?;

        tracing::info!(cycle_id = %cycle_id, "Billing cycle closed");
        Ok(())
    }

    pub fn available_limit(&self, cycle_id: &BillingCycleId) -> Option<Money> {
        self.billing_cycles
            .find(&cycle_id.stream_id())
            .state()
            .available_limit()
    }

    /// Current state of a billing cycle (initial state if it doesn't exist)
    pub fn billing_cycle(&self, cycle_id: &BillingCycleId) -> BillingCycle {
        self.billing_cycles.find(&cycle_id.stream_id()).state().clone()
    }
}
