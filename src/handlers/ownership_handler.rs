//! Ownership Handler

use crate::domain::{CardId, DomainError, OwnerId};
use crate::error::AppResult;
use crate::ownership::{Ownership, OwnershipRepository, MAX_OWNERS};

/// Handler for granting and revoking card access
#[derive(Debug, Clone)]
pub struct OwnershipHandler {
    ownership: OwnershipRepository,
}

impl OwnershipHandler {
    pub fn new(ownership: OwnershipRepository) -> Self {
        Self { ownership }
    }

    pub fn add_access(&self, card_id: CardId, owner: OwnerId) -> AppResult<()> {
        let current = self.ownership.find(card_id);

        if !current.record.has_access(owner) && current.record.size() >= MAX_OWNERS {
            return Err(DomainError::OwnershipLimitReached { max: MAX_OWNERS }.into());
        }

        self.ownership
            .save(card_id, current.record.add_access(owner), current.version)?;

        tracing::info!(card_id = %card_id, owner = %owner, "Access granted");
        Ok(())
    }

    pub fn revoke_access(&self, card_id: CardId, owner: OwnerId) -> AppResult<()> {
        let current = self.ownership.find(card_id);

        self.ownership
            .save(card_id, current.record.revoke(owner), current.version)?;

        tracing::info!(card_id = %card_id, owner = %owner, "Access revoked");
        Ok(())
    }

    pub fn ownership(&self, card_id: CardId) -> Ownership {
        self.ownership.find(card_id).record
    }
}
