//! Domain Events
//!
//! Event definitions for Event Sourcing.
//! Events are immutable facts that have happened in the system.
//! Each aggregate owns a closed event family; the store keeps them all
//! behind the `DomainEvent` tag.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{BillingCycleId, CardId, Currency, Limit, Money};

/// Credit line related events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CreditLineEvent {
    /// Credit line was created
    Created {
        card_id: CardId,
        currency: Currency,
        created_at: DateTime<Utc>,
    },

    /// A new limit was assigned (existing debt stays in use)
    LimitAssigned {
        card_id: CardId,
        amount: Money,
        assigned_at: DateTime<Utc>,
    },

    /// The next billing cycle was opened with a snapshot of the limit
    CycleOpened {
        cycle_id: BillingCycleId,
        card_id: CardId,
        from: NaiveDate,
        to: NaiveDate,
        starting_limit: Limit,
        opened_at: DateTime<Utc>,
    },

    /// The billing cycle was closed, carrying its outstanding debt
    CycleClosed {
        cycle_id: BillingCycleId,
        card_id: CardId,
        debt: Money,
        closed_at: DateTime<Utc>,
    },

    /// Credit line was deactivated because a cycle closed with debt
    Deactivated {
        card_id: CardId,
        deactivated_at: DateTime<Utc>,
    },
}

impl CreditLineEvent {
    /// Get the card ID this event relates to
    pub fn card_id(&self) -> CardId {
        match self {
            CreditLineEvent::Created { card_id, .. } => *card_id,
            CreditLineEvent::LimitAssigned { card_id, .. } => *card_id,
            CreditLineEvent::CycleOpened { card_id, .. } => *card_id,
            CreditLineEvent::CycleClosed { card_id, .. } => *card_id,
            CreditLineEvent::Deactivated { card_id, .. } => *card_id,
        }
    }
}

/// Billing cycle related events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BillingCycleEvent {
    /// Cycle was opened with the credit line's limit at that moment
    CycleOpened {
        cycle_id: BillingCycleId,
        card_id: CardId,
        from: NaiveDate,
        to: NaiveDate,
        starting_limit: Limit,
        opened_at: DateTime<Utc>,
    },

    /// Money was withdrawn within the cycle
    CardWithdrawn {
        cycle_id: BillingCycleId,
        card_id: CardId,
        amount: Money,
        withdrawn_at: DateTime<Utc>,
    },

    /// Money was repaid within the cycle
    CardRepaid {
        cycle_id: BillingCycleId,
        card_id: CardId,
        amount: Money,
        repaid_at: DateTime<Utc>,
    },

    /// Cycle was closed; the credit line consumes this to record the debt
    CycleClosed {
        cycle_id: BillingCycleId,
        card_id: CardId,
        closing_limit: Limit,
        withdrawals_in_cycle: u32,
        closed_at: DateTime<Utc>,
    },
}

impl BillingCycleEvent {
    /// Get the billing cycle ID this event relates to
    pub fn cycle_id(&self) -> &BillingCycleId {
        match self {
            BillingCycleEvent::CycleOpened { cycle_id, .. } => cycle_id,
            BillingCycleEvent::CardWithdrawn { cycle_id, .. } => cycle_id,
            BillingCycleEvent::CardRepaid { cycle_id, .. } => cycle_id,
            BillingCycleEvent::CycleClosed { cycle_id, .. } => cycle_id,
        }
    }
}

/// Every event the store can hold, tagged by event family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", content = "event")]
pub enum DomainEvent {
    CreditLine(CreditLineEvent),
    BillingCycle(BillingCycleEvent),
}

impl DomainEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::CreditLine(event) => event.event_type(),
            DomainEvent::BillingCycle(event) => event.event_type(),
        }
    }
}

/// An event family that can be stored in, and read back from, the event store.
pub trait StreamEvent: Clone + Send + Sync + 'static {
    /// Get the event type as a string
    fn event_type(&self) -> &'static str;

    /// Wrap into the store-wide tagged union
    fn into_domain(self) -> DomainEvent;

    /// Pick this family's events out of the store-wide tagged union
    fn from_domain(event: &DomainEvent) -> Option<&Self>;
}

impl StreamEvent for CreditLineEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CreditLineEvent::Created { .. } => "CreditLineCreated",
            CreditLineEvent::LimitAssigned { .. } => "LimitAssigned",
            CreditLineEvent::CycleOpened { .. } => "CreditLineCycleOpened",
            CreditLineEvent::CycleClosed { .. } => "CreditLineCycleClosed",
            CreditLineEvent::Deactivated { .. } => "CreditLineDeactivated",
        }
    }

    fn into_domain(self) -> DomainEvent {
        DomainEvent::CreditLine(self)
    }

    fn from_domain(event: &DomainEvent) -> Option<&Self> {
        match event {
            DomainEvent::CreditLine(event) => Some(event),
            _ => None,
        }
    }
}

impl StreamEvent for BillingCycleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BillingCycleEvent::CycleOpened { .. } => "BillingCycleOpened",
            BillingCycleEvent::CardWithdrawn { .. } => "CardWithdrawn",
            BillingCycleEvent::CardRepaid { .. } => "CardRepaid",
            BillingCycleEvent::CycleClosed { .. } => "BillingCycleClosed",
        }
    }

    fn into_domain(self) -> DomainEvent {
        DomainEvent::BillingCycle(self)
    }

    fn from_domain(event: &DomainEvent) -> Option<&Self> {
        match event {
            DomainEvent::BillingCycle(event) => Some(event),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_event_family_filtering() {
        let card_id = CardId::random();
        let event = CreditLineEvent::Deactivated {
            card_id,
            deactivated_at: Utc::now(),
        }
        .into_domain();

        assert!(CreditLineEvent::from_domain(&event).is_some());
        assert!(BillingCycleEvent::from_domain(&event).is_none());
        assert_eq!(event.event_type(), "CreditLineDeactivated");
    }

    #[test]
    fn test_billing_cycle_event_serialization() {
        let card_id = CardId::random();
        let event = BillingCycleEvent::CardWithdrawn {
            cycle_id: BillingCycleId::from_now(card_id),
            card_id,
            amount: Money::new(dec!(12.5), "USD".parse().unwrap()),
            withdrawn_at: Utc::now(),
        };

        let json = serde_json::to_string(&event.clone().into_domain()).unwrap();
        assert!(json.contains("CardWithdrawn"));
        assert!(json.contains("BillingCycle"));

        let deserialized: DomainEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(BillingCycleEvent::from_domain(&deserialized), Some(&event));
    }
}
