//! Credit Line Aggregate
//!
//! A virtual credit card: owns the limit, decides when the next billing
//! cycle opens and records the debt each closed cycle leaves behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    BillingCycleId, CardId, CreditLineEvent, Currency, DomainError, Limit, Money, StreamId,
};

use super::{Aggregate, AggregateRoot};

/// Reference to the most recent billing cycle of a credit line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentCycle {
    pub cycle_id: BillingCycleId,
    pub is_open: bool,
}

/// Credit Line Aggregate
///
/// State is derived from events, never directly mutated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CreditLine {
    card_id: Option<CardId>,
    currency: Option<Currency>,
    limit: Option<Limit>,
    current_cycle: Option<CurrentCycle>,
    /// Debt left by the last closed cycle
    debt: Option<Money>,
    active: bool,
    version: i64,
}

impl CreditLine {
    /// Create a new credit line; the root holds the pending `Created` event
    pub fn create(card_id: CardId, currency: Currency) -> AggregateRoot<Self> {
        let mut root = AggregateRoot::default();
        root.record(CreditLineEvent::Created {
            card_id,
            currency,
            created_at: Utc::now(),
        });
        root
    }

    /// Assign a new limit. Debt carried from closed cycles stays in use.
    pub fn assign_limit(&self, amount: &Money) -> Result<Vec<CreditLineEvent>, DomainError> {
        let card_id = self.require_active()?;

        if amount.is_negative() {
            return Err(DomainError::InvalidAmount(amount.to_string()));
        }
        // Validates the currency against the carried debt.
        Limit::with_debt(amount.clone(), self.carried_debt()?)?;

        Ok(vec![CreditLineEvent::LimitAssigned {
            card_id,
            amount: amount.clone(),
            assigned_at: Utc::now(),
        }])
    }

    /// Open the successor of the last cycle (or the first one, from today)
    pub fn open_next_cycle(&self) -> Result<Vec<CreditLineEvent>, DomainError> {
        let card_id = self.require_active()?;

        let cycle_id = match &self.current_cycle {
            Some(current) if current.is_open => return Err(DomainError::CycleAlreadyOpen),
            Some(current) => current.cycle_id.next(),
            None => BillingCycleId::from_now(card_id),
        };
        let starting_limit = self.limit.clone().ok_or(DomainError::CardNotFound)?;

        Ok(vec![CreditLineEvent::CycleOpened {
            from: cycle_id.from(),
            to: cycle_id.to(),
            cycle_id,
            card_id,
            starting_limit,
            opened_at: Utc::now(),
        }])
    }

    /// Record that a billing cycle was closed.
    ///
    /// Does nothing unless `cycle_id` is the currently open cycle. A closure
    /// with outstanding debt also deactivates the card.
    pub fn record_cycle_closure(
        &self,
        cycle_id: &BillingCycleId,
        closing_limit: &Limit,
        closed_at: DateTime<Utc>,
    ) -> Result<Vec<CreditLineEvent>, DomainError> {
        let Some(card_id) = self.card_id else {
            return Err(DomainError::CardNotFound);
        };
        let is_current = matches!(
            &self.current_cycle,
            Some(current) if current.is_open && &current.cycle_id == cycle_id
        );
        if !is_current {
            tracing::debug!(
                card_id = %card_id,
                cycle_id = %cycle_id,
                "Ignoring closure of a cycle that is not currently open"
            );
            return Ok(Vec::new());
        }

        let debt = closing_limit.used().clone();
        let has_debt = !debt.is_zero();

        let mut events = vec![CreditLineEvent::CycleClosed {
            cycle_id: cycle_id.clone(),
            card_id,
            debt,
            closed_at,
        }];
        if has_debt {
            events.push(CreditLineEvent::Deactivated {
                card_id,
                deactivated_at: closed_at,
            });
        }
        Ok(events)
    }

    fn require_active(&self) -> Result<CardId, DomainError> {
        let card_id = self.card_id.ok_or(DomainError::CardNotFound)?;
        if !self.active {
            return Err(DomainError::CardInactive);
        }
        Ok(card_id)
    }

    fn carried_debt(&self) -> Result<Money, DomainError> {
        match (&self.debt, &self.currency) {
            (Some(debt), _) => Ok(debt.clone()),
            (None, Some(currency)) => Ok(Money::zero(currency.clone())),
            (None, None) => Err(DomainError::CardNotFound),
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn card_id(&self) -> Option<CardId> {
        self.card_id
    }

    pub fn currency(&self) -> Option<&Currency> {
        self.currency.as_ref()
    }

    pub fn limit(&self) -> Option<&Limit> {
        self.limit.as_ref()
    }

    pub fn available_limit(&self) -> Option<Money> {
        self.limit.as_ref().map(Limit::available)
    }

    pub fn current_cycle(&self) -> Option<&CurrentCycle> {
        self.current_cycle.as_ref()
    }

    /// The cycle id, if a cycle is open right now
    pub fn open_cycle_id(&self) -> Option<&BillingCycleId> {
        self.current_cycle
            .as_ref()
            .filter(|current| current.is_open)
            .map(|current| &current.cycle_id)
    }

    pub fn debt(&self) -> Option<&Money> {
        self.debt.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Aggregate for CreditLine {
    type Event = CreditLineEvent;

    fn aggregate_type() -> &'static str {
        "CreditLine"
    }

    fn stream_id(&self) -> Option<StreamId> {
        self.card_id.map(|card_id| card_id.stream_id())
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(mut self, event: &Self::Event) -> Self {
        match event {
            CreditLineEvent::Created {
                card_id, currency, ..
            } => {
                self.card_id = Some(*card_id);
                self.currency = Some(currency.clone());
                self.limit = Some(Limit::initial(Money::zero(currency.clone())));
                self.debt = Some(Money::zero(currency.clone()));
                self.active = true;
            }

            CreditLineEvent::LimitAssigned { amount, .. } => {
                let debt = self
                    .debt
                    .clone()
                    .unwrap_or_else(|| Money::zero(amount.currency().clone()));
                match Limit::with_debt(amount.clone(), debt) {
                    Ok(limit) => self.limit = Some(limit),
                    Err(e) => {
                        tracing::error!(
                            "Invalid LimitAssigned during replay for card {:?}: {}",
                            self.card_id, e
                        );
                    }
                }
            }

            CreditLineEvent::CycleOpened { cycle_id, .. } => {
                self.current_cycle = Some(CurrentCycle {
                    cycle_id: cycle_id.clone(),
                    is_open: true,
                });
            }

            CreditLineEvent::CycleClosed { cycle_id, debt, .. } => {
                self.current_cycle = Some(CurrentCycle {
                    cycle_id: cycle_id.clone(),
                    is_open: false,
                });
                if let Some(limit) = &self.limit {
                    match Limit::with_debt(limit.max().clone(), debt.clone()) {
                        Ok(limit) => self.limit = Some(limit),
                        Err(e) => {
                            tracing::error!(
                                "Invalid CycleClosed debt during replay for card {:?}: {}",
                                self.card_id, e
                            );
                        }
                    }
                }
                self.debt = Some(debt.clone());
            }

            CreditLineEvent::Deactivated { .. } => {
                self.active = false;
            }
        }

        self.version += 1;
        self
    }
}
