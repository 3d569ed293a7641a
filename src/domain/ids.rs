//! Identifiers
//!
//! Identity types for cards, owners, billing cycles and event streams.

use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Length of a billing cycle in days
pub const CYCLE_LENGTH_DAYS: u64 = 30;

/// Identity of one event stream (one per aggregate instance)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StreamId(String);

impl StreamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Credit line (virtual credit card) identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(Uuid);

impl CardId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }

    pub fn stream_id(&self) -> StreamId {
        StreamId::new(format!("CreditLine:{}", self.0))
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Card owner identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerId(Uuid);

impl OwnerId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Billing cycle identity, derived from the card and the cycle window.
///
/// Two cycles of the same card never share a window, so the stream id is
/// deterministic: the reconciliation process can recreate it from a
/// `CycleOpened` event alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillingCycleId {
    card_id: CardId,
    from: NaiveDate,
    to: NaiveDate,
}

impl BillingCycleId {
    pub fn new(card_id: CardId, from: NaiveDate, to: NaiveDate) -> Self {
        Self { card_id, from, to }
    }

    /// First cycle of a card: today until today + 30 days.
    pub fn from_now(card_id: CardId) -> Self {
        Self::starting_at(card_id, Utc::now().date_naive())
    }

    /// Cycle window of 30 days starting at `from`.
    pub fn starting_at(card_id: CardId, from: NaiveDate) -> Self {
        let to = from
            .checked_add_days(Days::new(CYCLE_LENGTH_DAYS))
            .unwrap_or(NaiveDate::MAX);
        Self { card_id, from, to }
    }

    /// The successor window begins the day after this one ends.
    pub fn next(&self) -> Self {
        let from = self.to.succ_opt().unwrap_or(NaiveDate::MAX);
        Self::starting_at(self.card_id, from)
    }

    pub fn card_id(&self) -> CardId {
        self.card_id
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    pub fn stream_id(&self) -> StreamId {
        StreamId::new(self.to_string())
    }
}

impl fmt::Display for BillingCycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BillingCycle:{}:{}:{}", self.card_id, self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_window_is_thirty_days() {
        let card = CardId::random();
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let cycle = BillingCycleId::starting_at(card, from);

        assert_eq!(cycle.to(), NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    }

    #[test]
    fn test_next_cycle_starts_after_previous_end() {
        let card = CardId::random();
        let first = BillingCycleId::starting_at(card, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let second = first.next();

        assert_eq!(second.from(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(second.to(), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(second.card_id(), card);
    }

    #[test]
    fn test_stream_ids_are_deterministic() {
        let card = CardId::random();
        let from = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

        let a = BillingCycleId::starting_at(card, from);
        let b = BillingCycleId::starting_at(card, from);

        assert_eq!(a.stream_id(), b.stream_id());
        assert!(a.stream_id().as_str().starts_with("BillingCycle:"));
        assert_ne!(a.stream_id(), card.stream_id());
    }
}
