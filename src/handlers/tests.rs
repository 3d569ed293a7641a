//! Handler tests against an in-memory store with reconciliation wired in

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::Handlers;
use crate::aggregate::CycleStatus;
use crate::domain::{BillingCycleId, CardId, Currency, DomainError, Money, OwnerId};
use crate::reconciliation::RetryPolicy;

fn usd(amount: Decimal) -> Money {
    Money::new(amount, "USD".parse::<Currency>().unwrap())
}

fn card_with_open_cycle(
    handlers: &Handlers,
    limit: Decimal,
) -> (CardId, BillingCycleId, OwnerId) {
    let card_id = handlers
        .credit_lines
        .create_card("USD".parse().unwrap())
        .unwrap();
    handlers
        .credit_lines
        .assign_limit(card_id, &usd(limit))
        .unwrap();
    let owner = OwnerId::random();
    handlers.ownership.add_access(card_id, owner).unwrap();
    let cycle_id = handlers.credit_lines.open_next_cycle(card_id).unwrap();
    (card_id, cycle_id, owner)
}

// =========================================================================
// Credit line handler
// =========================================================================

#[test]
fn test_create_card_starts_active_with_zero_limit() {
    let handlers = Handlers::new(RetryPolicy::busy());

    let card_id = handlers
        .credit_lines
        .create_card("USD".parse().unwrap())
        .unwrap();

    let card = handlers.credit_lines.credit_line(card_id);
    assert!(card.is_active());
    assert_eq!(card.available_limit(), Some(usd(dec!(0))));
    assert_eq!(handlers.credit_lines.currently_opened_cycle(card_id), None);
}

#[test]
fn test_assign_limit_to_unknown_card_is_rejected() {
    let handlers = Handlers::new(RetryPolicy::busy());

    let err = handlers
        .credit_lines
        .assign_limit(CardId::random(), &usd(dec!(100)))
        .unwrap_err();

    assert_eq!(err.as_domain(), Some(&DomainError::CardNotFound));
}

#[test]
fn test_open_next_cycle_creates_billing_cycle_stream() {
    let handlers = Handlers::new(RetryPolicy::busy());
    let (card_id, cycle_id, _) = card_with_open_cycle(&handlers, dec!(100));

    assert_eq!(
        handlers.credit_lines.currently_opened_cycle(card_id),
        Some(cycle_id.clone())
    );
    assert!(handlers.event_store.stream_exists(&cycle_id.stream_id()));
    assert_eq!(
        handlers.billing_cycles.available_limit(&cycle_id),
        Some(usd(dec!(100)))
    );
}

#[test]
fn test_cannot_open_two_cycles_at_once() {
    let handlers = Handlers::new(RetryPolicy::busy());
    let (card_id, _, _) = card_with_open_cycle(&handlers, dec!(100));

    let err = handlers.credit_lines.open_next_cycle(card_id).unwrap_err();
    assert_eq!(err.as_domain(), Some(&DomainError::CycleAlreadyOpen));
}

// =========================================================================
// Billing cycle handler
// =========================================================================

#[test]
fn test_withdraw_requires_access() {
    let handlers = Handlers::new(RetryPolicy::busy());
    let (_, cycle_id, _) = card_with_open_cycle(&handlers, dec!(100));

    let err = handlers
        .billing_cycles
        .withdraw(&cycle_id, &usd(dec!(10)), OwnerId::random())
        .unwrap_err();

    assert!(matches!(err.as_domain(), Some(DomainError::AccessDenied(_))));
    assert_eq!(
        handlers.billing_cycles.available_limit(&cycle_id),
        Some(usd(dec!(100)))
    );
}

#[test]
fn test_withdraw_and_repay_move_available_limit() {
    let handlers = Handlers::new(RetryPolicy::busy());
    let (_, cycle_id, owner) = card_with_open_cycle(&handlers, dec!(100));

    handlers
        .billing_cycles
        .withdraw(&cycle_id, &usd(dec!(70)), owner)
        .unwrap();
    handlers
        .billing_cycles
        .repay(&cycle_id, &usd(dec!(20)))
        .unwrap();

    assert_eq!(
        handlers.billing_cycles.available_limit(&cycle_id),
        Some(usd(dec!(50)))
    );
}

#[test]
fn test_close_with_debt_deactivates_card() {
    let handlers = Handlers::new(RetryPolicy::busy());
    let (card_id, cycle_id, owner) = card_with_open_cycle(&handlers, dec!(100));

    handlers
        .billing_cycles
        .withdraw(&cycle_id, &usd(dec!(30)), owner)
        .unwrap();
    handlers.billing_cycles.close(&cycle_id).unwrap();

    assert_eq!(
        handlers.billing_cycles.billing_cycle(&cycle_id).status(),
        CycleStatus::Closed
    );
    let card = handlers.credit_lines.credit_line(card_id);
    assert!(!card.is_active());
    assert_eq!(card.debt(), Some(&usd(dec!(30))));

    let err = handlers.credit_lines.open_next_cycle(card_id).unwrap_err();
    assert_eq!(err.as_domain(), Some(&DomainError::CardInactive));
}

#[test]
fn test_close_without_debt_allows_next_cycle() {
    let handlers = Handlers::new(RetryPolicy::busy());
    let (card_id, cycle_id, _) = card_with_open_cycle(&handlers, dec!(100));

    handlers.billing_cycles.close(&cycle_id).unwrap();
    assert_eq!(handlers.credit_lines.currently_opened_cycle(card_id), None);

    let next = handlers.credit_lines.open_next_cycle(card_id).unwrap();
    assert_eq!(next, cycle_id.next());
}

// =========================================================================
// Ownership handler
// =========================================================================

#[test]
fn test_ownership_is_capped() {
    let handlers = Handlers::new(RetryPolicy::busy());
    let (card_id, _, _) = card_with_open_cycle(&handlers, dec!(100));

    handlers
        .ownership
        .add_access(card_id, OwnerId::random())
        .unwrap();
    let err = handlers
        .ownership
        .add_access(card_id, OwnerId::random())
        .unwrap_err();

    assert_eq!(
        err.as_domain(),
        Some(&DomainError::OwnershipLimitReached { max: 2 })
    );
    assert_eq!(handlers.ownership.ownership(card_id).size(), 2);
}

#[test]
fn test_revoked_owner_cannot_withdraw() {
    let handlers = Handlers::new(RetryPolicy::busy());
    let (card_id, cycle_id, owner) = card_with_open_cycle(&handlers, dec!(100));

    handlers.ownership.revoke_access(card_id, owner).unwrap();

    let err = handlers
        .billing_cycles
        .withdraw(&cycle_id, &usd(dec!(10)), owner)
        .unwrap_err();
    assert!(err.is_rejection());
}
