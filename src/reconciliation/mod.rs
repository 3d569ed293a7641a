//! Reconciliation module
//!
//! Keeps credit lines and billing cycles eventually consistent. Each
//! aggregate commits on its own stream; this subscriber reacts to one
//! aggregate's lifecycle events by commanding the other.

mod retry;

pub use retry::{retry_on_conflict, RetryPolicy};

use chrono::{DateTime, Utc};

use crate::aggregate::{AggregateRoot, BillingCycle, CreditLine, Repository};
use crate::domain::{BillingCycleEvent, BillingCycleId, CreditLineEvent, DomainEvent, Limit};
use crate::error::{AppError, AppResult};
use crate::event_store::{EventEnvelope, EventHandler, EventStore};

/// Stateless subscriber reconciling credit lines with their billing cycles.
///
/// - credit line `CycleOpened` creates the billing cycle stream
/// - billing cycle `CycleClosed` records the closure on the credit line,
///   retrying on conflict until it lands
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler {
    policy: RetryPolicy,
}

impl Reconciler {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Create the billing cycle announced by the credit line.
    ///
    /// The cycle stream must not exist yet; if it does, this is a duplicate
    /// delivery and the conflict is dropped.
    fn on_cycle_opened(
        &self,
        store: &EventStore,
        cycle_id: &BillingCycleId,
        starting_limit: &Limit,
        opened_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let repository = Repository::<BillingCycle>::new(store.clone());
        let mut cycle = BillingCycle::open(cycle_id.clone(), starting_limit.clone(), opened_at);

        match repository.save_expecting(&mut cycle, 0) {
            Ok(()) => {
                tracing::info!(cycle_id = %cycle_id, "Billing cycle opened");
                Ok(())
            }
            Err(e) if e.is_concurrency_conflict() => {
                tracing::debug!(cycle_id = %cycle_id, "Billing cycle already exists, ignoring");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Record a closed cycle on its credit line, re-reading on every conflict
    fn on_cycle_closed(
        &self,
        store: &EventStore,
        cycle_id: &BillingCycleId,
        closing_limit: &Limit,
        closed_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let repository = Repository::<CreditLine>::new(store.clone());
        let stream_id = cycle_id.card_id().stream_id();

        self.record_closure(
            &repository,
            |_| repository.find(&stream_id),
            cycle_id,
            closing_limit,
            closed_at,
        )
        .map(|_| ())
    }

    /// Retry loop behind `on_cycle_closed`. `load` supplies the credit line
    /// for each attempt. Returns the attempt that landed.
    fn record_closure<L>(
        &self,
        repository: &Repository<CreditLine>,
        mut load: L,
        cycle_id: &BillingCycleId,
        closing_limit: &Limit,
        closed_at: DateTime<Utc>,
    ) -> AppResult<u64>
    where
        L: FnMut(u64) -> AggregateRoot<CreditLine>,
    {
        retry_on_conflict(
            self.policy,
            |attempt| {
                let mut card = load(attempt);
                card.execute(|state| {
                    state.record_cycle_closure(cycle_id, closing_limit, closed_at)
                })?;
                repository.save(&mut card)?;

                tracing::info!(
                    card_id = %cycle_id.card_id(),
                    cycle_id = %cycle_id,
                    attempt = attempt,
                    active = card.state().is_active(),
                    "Billing cycle closure recorded"
                );
                Ok(attempt)
            },
            AppError::is_conflict,
        )
    }
}

impl EventHandler for Reconciler {
    fn name(&self) -> &str {
        "reconciler"
    }

    fn handle(&self, store: &EventStore, event: &EventEnvelope) -> anyhow::Result<()> {
        match &event.data {
            DomainEvent::CreditLine(CreditLineEvent::CycleOpened {
                cycle_id,
                starting_limit,
                opened_at,
                ..
            }) => self.on_cycle_opened(store, cycle_id, starting_limit, *opened_at)?,

            DomainEvent::BillingCycle(BillingCycleEvent::CycleClosed {
                cycle_id,
                closing_limit,
                closed_at,
                ..
            }) => self.on_cycle_closed(store, cycle_id, closing_limit, *closed_at)?,

            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Aggregate, CycleStatus};
    use crate::domain::{CardId, Money};
    use rust_decimal_macros::dec;

    fn usd(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, "USD".parse().unwrap())
    }

    fn store_with_reconciler() -> EventStore {
        let store = EventStore::new();
        store.subscribe(Reconciler::default());
        store
    }

    fn open_card(store: &EventStore) -> (CardId, BillingCycleId) {
        let cards = Repository::<CreditLine>::new(store.clone());
        let card_id = CardId::random();
        let mut card = CreditLine::create(card_id, "USD".parse().unwrap());
        card.execute(|c| c.assign_limit(&usd(dec!(100)))).unwrap();
        card.execute(|c| c.open_next_cycle()).unwrap();
        cards.save(&mut card).unwrap();
        let cycle_id = card.state().open_cycle_id().cloned().unwrap();
        (card_id, cycle_id)
    }

    #[test]
    fn test_cycle_opened_creates_billing_cycle() {
        let store = store_with_reconciler();

        let (_, cycle_id) = open_card(&store);

        let cycles = Repository::<BillingCycle>::new(store.clone());
        let cycle = cycles.find(&cycle_id.stream_id());
        assert_eq!(cycle.state().status(), CycleStatus::Opened);
        assert_eq!(cycle.state().available_limit(), Some(usd(dec!(100))));
        assert_eq!(store.stream_version(&cycle_id.stream_id()), 1);
    }

    #[test]
    fn test_duplicate_cycle_opened_is_ignored() {
        let store = store_with_reconciler();
        let (_, cycle_id) = open_card(&store);

        let result = Reconciler::default().on_cycle_opened(
            &store,
            &cycle_id,
            &Limit::initial(usd(dec!(999))),
            Utc::now(),
        );

        assert!(result.is_ok());
        assert_eq!(store.stream_version(&cycle_id.stream_id()), 1);
    }

    #[test]
    fn test_cycle_closed_with_debt_deactivates_card() {
        let store = store_with_reconciler();
        let (card_id, cycle_id) = open_card(&store);
        let cycles = Repository::<BillingCycle>::new(store.clone());

        let mut cycle = cycles.find(&cycle_id.stream_id());
        cycle.execute(|c| c.withdraw(&usd(dec!(40)))).unwrap();
        cycle.execute(|c| c.close_cycle()).unwrap();
        cycles.save(&mut cycle).unwrap();

        let card = Repository::<CreditLine>::new(store.clone()).find(&card_id.stream_id());
        assert!(!card.state().is_active());
        assert_eq!(card.state().debt(), Some(&usd(dec!(40))));
        assert!(card.state().open_next_cycle().is_err());
    }

    #[test]
    fn test_closure_retries_over_concurrent_card_change() {
        let store = EventStore::new();
        let (card_id, cycle_id) = open_card(&store);
        let cards = Repository::<CreditLine>::new(store.clone());
        let stream_id = card_id.stream_id();

        // Loaded before the limit change lands, so the first save conflicts.
        let mut stale = Some(cards.find(&stream_id));
        let mut other = cards.find(&stream_id);
        other.execute(|c| c.assign_limit(&usd(dec!(200)))).unwrap();
        cards.save(&mut other).unwrap();

        let landed = Reconciler::default()
            .record_closure(
                &cards,
                |_| stale.take().unwrap_or_else(|| cards.find(&stream_id)),
                &cycle_id,
                &Limit::initial(usd(dec!(100))),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(landed, 2);
        let card = cards.find(&stream_id);
        assert!(card.state().is_active());
        assert!(card.state().open_cycle_id().is_none());
        assert_eq!(card.state().limit().unwrap().max(), &usd(dec!(200)));
        assert_eq!(card.state().version(), 5);
    }
}
