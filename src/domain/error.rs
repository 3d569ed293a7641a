//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

use super::MoneyError;

/// Business rule violations and domain invariant failures.
///
/// A command that returns one of these produced no event and left the
/// aggregate untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Requested amount exceeds the available limit
    #[error("Insufficient limit: requested {requested}, available {available}")]
    InsufficientLimit {
        requested: Decimal,
        available: Decimal,
    },

    /// Withdrawal count cap for the cycle reached
    #[error("Withdrawal limit of {max} per cycle reached")]
    WithdrawalLimitReached { max: u32 },

    /// Operation on a billing cycle that is already closed
    #[error("Billing cycle is closed")]
    CycleClosed,

    /// Operation on a billing cycle that was never opened
    #[error("Billing cycle is not opened")]
    CycleNotOpened,

    /// Credit line already has an open billing cycle
    #[error("A billing cycle is already open")]
    CycleAlreadyOpen,

    /// Credit line was deactivated
    #[error("Credit line is not active")]
    CardInactive,

    /// Credit line stream has no `Created` event
    #[error("Credit line does not exist")]
    CardNotFound,

    /// Invalid amount (zero or negative where a positive value is required)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Owner has no access to the card
    #[error("Access denied for owner {0}")]
    AccessDenied(String),

    /// Card already has the maximum number of owners
    #[error("Ownership limit of {max} owners reached")]
    OwnershipLimitReached { max: usize },

    /// Money arithmetic failed (e.g. currency mismatch)
    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl DomainError {
    /// Create an insufficient limit error
    pub fn insufficient_limit(requested: Decimal, available: Decimal) -> Self {
        Self::InsufficientLimit {
            requested,
            available,
        }
    }
}
