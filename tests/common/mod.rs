//! Common test utilities
#![allow(dead_code)]

use card_consistency::{BillingCycleId, CardId, Currency, Handlers, Money, OwnerId, RetryPolicy};
use rust_decimal::Decimal;

/// Fresh store with the reconciliation process subscribed
pub fn setup() -> Handlers {
    Handlers::new(RetryPolicy::busy())
}

pub fn usd(amount: Decimal) -> Money {
    Money::new(amount, currency())
}

pub fn currency() -> Currency {
    "USD".parse().expect("valid currency")
}

/// A card with the given limit, one owner and an open billing cycle
pub fn open_card(handlers: &Handlers, limit: Decimal) -> (CardId, BillingCycleId, OwnerId) {
    let card_id = handlers
        .credit_lines
        .create_card(currency())
        .expect("card created");
    handlers
        .credit_lines
        .assign_limit(card_id, &usd(limit))
        .expect("limit assigned");

    let owner = OwnerId::random();
    handlers
        .ownership
        .add_access(card_id, owner)
        .expect("access granted");

    let cycle_id = handlers
        .credit_lines
        .open_next_cycle(card_id)
        .expect("cycle opened");

    (card_id, cycle_id, owner)
}
