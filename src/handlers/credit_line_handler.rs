//! Credit Line Handler
//!
//! Creates credit lines, assigns limits and opens billing cycles.

use crate::aggregate::{CreditLine, Repository};
use crate::domain::{BillingCycleId, CardId, Currency, DomainError, Money};
use crate::error::AppResult;
use crate::event_store::EventStore;

/// Handler for credit line commands
#[derive(Debug, Clone)]
pub struct CreditLineHandler {
    credit_lines: Repository<CreditLine>,
}

impl CreditLineHandler {
    pub fn new(event_store: EventStore) -> Self {
        Self {
            credit_lines: Repository::new(event_store),
        }
    }

    /// Create a credit line with a fresh random id
    pub fn create_card(&self, currency: Currency) -> AppResult<CardId> {
        let card_id = CardId::random();
        let mut card = CreditLine::create(card_id, currency);

        self.credit_lines.save_expecting(&mut card, 0)?;

        tracing::info!(card_id = %card_id, "Credit line created");
        Ok(card_id)
    }

    pub fn assign_limit(&self, card_id: CardId, limit: &Money) -> AppResult<()> {
        let mut card = self.credit_lines.find(&card_id.stream_id());

        card.execute(|state| state.assign_limit(limit))?;
        self.credit_lines.save(&mut card)?;

        tracing::info!(card_id = %card_id, limit = %limit, "Limit assigned");
        Ok(())
    }

    /// Open the next billing cycle; the reconciliation process creates the
    /// cycle stream when the event is published.
    pub fn open_next_cycle(&self, card_id: CardId) -> AppResult<BillingCycleId> {
        let mut card = self.credit_lines.find(&card_id.stream_id());

        card.execute(|state| state.open_next_cycle())?;
        self.credit_lines.save(&mut card)?;

        let cycle_id = card
            .state()
            .open_cycle_id()
            .cloned()
            .ok_or(DomainError::CycleNotOpened)?;

        tracing::info!(card_id = %card_id, cycle_id = %cycle_id, "Next billing cycle opened");
        Ok(cycle_id)
    }

    pub fn currently_opened_cycle(&self, card_id: CardId) -> Option<BillingCycleId> {
        self.credit_lines
            .find(&card_id.stream_id())
            .state()
            .open_cycle_id()
            .cloned()
    }

    /// Current state of a credit line (initial state if it doesn't exist)
    pub fn credit_line(&self, card_id: CardId) -> CreditLine {
        self.credit_lines.find(&card_id.stream_id()).state().clone()
    }
}
