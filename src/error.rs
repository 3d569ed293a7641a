//! Error handling module
//!
//! Centralized error type for command handlers and the reconciliation
//! process.

use crate::config::ConfigError;
use crate::domain::DomainError;
use crate::event_store::EventStoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
///
/// A command fails for one of two reasons that callers must treat
/// differently: a business rule rejected it (report to the user), or the
/// stream moved on since it was read (re-read and retry).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Invariant violation; no event was produced
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Optimistic concurrency conflict on save
    #[error(transparent)]
    EventStore(#[from] EventStoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// Check if this is a conflict error (retry may help)
    pub fn is_conflict(&self) -> bool {
        matches!(self, AppError::EventStore(e) if e.is_concurrency_conflict())
    }

    /// Check if a business rule rejected the command
    pub fn is_rejection(&self) -> bool {
        matches!(self, AppError::Domain(_))
    }

    /// The domain error, if this is a business rejection
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            AppError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StreamId;

    #[test]
    fn test_conflict_is_distinguishable_from_rejection() {
        let conflict: AppError = EventStoreError::ConcurrencyConflict {
            stream_id: StreamId::new("CreditLine:x"),
            expected: 1,
            actual: 2,
        }
        .into();
        let rejection: AppError = DomainError::CycleClosed.into();

        assert!(conflict.is_conflict());
        assert!(!conflict.is_rejection());
        assert!(rejection.is_rejection());
        assert!(!rejection.is_conflict());
        assert_eq!(rejection.as_domain(), Some(&DomainError::CycleClosed));
    }
}
