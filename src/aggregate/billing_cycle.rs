//! Billing Cycle Aggregate
//!
//! One billing window of a credit line. Withdrawals and repayments happen
//! here; the credit line only learns about the cycle when it closes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{BillingCycleEvent, BillingCycleId, CardId, DomainError, Limit, Money, StreamId};

use super::{Aggregate, AggregateRoot};

/// Maximum number of withdrawals within one cycle
pub const MAX_WITHDRAWALS_IN_CYCLE: u32 = 45;

/// Billing cycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CycleStatus {
    /// No `CycleOpened` event yet
    #[default]
    NotOpened,
    Opened,
    Closed,
}

/// Billing Cycle Aggregate
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BillingCycle {
    cycle_id: Option<BillingCycleId>,
    card_id: Option<CardId>,
    status: CycleStatus,
    limit: Option<Limit>,
    withdrawals_in_cycle: u32,
    version: i64,
}

impl BillingCycle {
    /// Open a cycle; the root holds the pending `CycleOpened` event
    pub fn open(
        cycle_id: BillingCycleId,
        starting_limit: Limit,
        opened_at: DateTime<Utc>,
    ) -> AggregateRoot<Self> {
        let mut root = AggregateRoot::default();
        root.record(BillingCycleEvent::CycleOpened {
            card_id: cycle_id.card_id(),
            from: cycle_id.from(),
            to: cycle_id.to(),
            cycle_id,
            starting_limit,
            opened_at,
        });
        root
    }

    /// Withdraw money within the available limit.
    ///
    /// Besides the lifecycle, limit and count checks, the amount must be
    /// strictly positive: a zero or negative withdrawal is `InvalidAmount`.
    pub fn withdraw(&self, amount: &Money) -> Result<Vec<BillingCycleEvent>, DomainError> {
        let (cycle_id, card_id, limit) = self.require_opened()?;

        if !amount.is_positive() {
            return Err(DomainError::InvalidAmount(amount.to_string()));
        }
        let available = limit.available();
        if available.is_less_than(amount)? {
            return Err(DomainError::insufficient_limit(
                amount.amount(),
                available.amount(),
            ));
        }
        if self.withdrawals_in_cycle >= MAX_WITHDRAWALS_IN_CYCLE {
            return Err(DomainError::WithdrawalLimitReached {
                max: MAX_WITHDRAWALS_IN_CYCLE,
            });
        }

        Ok(vec![BillingCycleEvent::CardWithdrawn {
            cycle_id,
            card_id,
            amount: amount.clone(),
            withdrawn_at: Utc::now(),
        }])
    }

    /// Repay money; repaying more than is used clamps the debt at zero.
    ///
    /// A closed cycle rejects repayments, so debt left at closure can only
    /// be carried into the credit line's next limit. As with withdrawals, a
    /// zero or negative amount is `InvalidAmount`.
    pub fn repay(&self, amount: &Money) -> Result<Vec<BillingCycleEvent>, DomainError> {
        let (cycle_id, card_id, limit) = self.require_opened()?;

        if !amount.is_positive() {
            return Err(DomainError::InvalidAmount(amount.to_string()));
        }
        limit.top_up(amount)?;

        Ok(vec![BillingCycleEvent::CardRepaid {
            cycle_id,
            card_id,
            amount: amount.clone(),
            repaid_at: Utc::now(),
        }])
    }

    /// Close the cycle, publishing the final limit and withdrawal count
    pub fn close_cycle(&self) -> Result<Vec<BillingCycleEvent>, DomainError> {
        let (cycle_id, card_id, limit) = self.require_opened()?;

        Ok(vec![BillingCycleEvent::CycleClosed {
            cycle_id,
            card_id,
            closing_limit: limit.clone(),
            withdrawals_in_cycle: self.withdrawals_in_cycle,
            closed_at: Utc::now(),
        }])
    }

    fn require_opened(&self) -> Result<(BillingCycleId, CardId, &Limit), DomainError> {
        match (self.status, &self.cycle_id, self.card_id, &self.limit) {
            (CycleStatus::Opened, Some(cycle_id), Some(card_id), Some(limit)) => {
                Ok((cycle_id.clone(), card_id, limit))
            }
            (CycleStatus::Closed, ..) => Err(DomainError::CycleClosed),
            _ => Err(DomainError::CycleNotOpened),
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn cycle_id(&self) -> Option<&BillingCycleId> {
        self.cycle_id.as_ref()
    }

    pub fn card_id(&self) -> Option<CardId> {
        self.card_id
    }

    pub fn status(&self) -> CycleStatus {
        self.status
    }

    pub fn limit(&self) -> Option<&Limit> {
        self.limit.as_ref()
    }

    pub fn available_limit(&self) -> Option<Money> {
        self.limit.as_ref().map(Limit::available)
    }

    pub fn withdrawals_in_cycle(&self) -> u32 {
        self.withdrawals_in_cycle
    }
}

impl Aggregate for BillingCycle {
    type Event = BillingCycleEvent;

    fn aggregate_type() -> &'static str {
        "BillingCycle"
    }

    fn stream_id(&self) -> Option<StreamId> {
        self.cycle_id.as_ref().map(BillingCycleId::stream_id)
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(mut self, event: &Self::Event) -> Self {
        match event {
            BillingCycleEvent::CycleOpened {
                cycle_id,
                card_id,
                starting_limit,
                ..
            } => {
                self.cycle_id = Some(cycle_id.clone());
                self.card_id = Some(*card_id);
                self.status = CycleStatus::Opened;
                self.limit = Some(starting_limit.clone());
            }

            BillingCycleEvent::CardWithdrawn { amount, .. } => {
                if let Some(limit) = &self.limit {
                    match limit.use_amount(amount) {
                        Ok(limit) => self.limit = Some(limit),
                        Err(e) => {
                            tracing::error!(
                                "Invalid withdrawal during replay for cycle {:?}: {}",
                                self.cycle_id, e
                            );
                        }
                    }
                }
                self.withdrawals_in_cycle += 1;
            }

            BillingCycleEvent::CardRepaid { amount, .. } => {
                if let Some(limit) = &self.limit {
                    match limit.top_up(amount) {
                        Ok(limit) => self.limit = Some(limit),
                        Err(e) => {
                            tracing::error!(
                                "Invalid repayment during replay for cycle {:?}: {}",
                                self.cycle_id, e
                            );
                        }
                    }
                }
            }

            BillingCycleEvent::CycleClosed { .. } => {
                self.status = CycleStatus::Closed;
            }
        }

        self.version += 1;
        self
    }
}
