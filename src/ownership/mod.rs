//! Ownership module
//!
//! Who may withdraw from a card. Ownership is a plain versioned document,
//! not an event-sourced aggregate.

mod repository;

pub use repository::{Versioned, VersionedCollection};

use std::collections::BTreeSet;

use crate::domain::{CardId, OwnerId, StreamId};
use crate::event_store::EventStoreError;

/// Maximum number of owners per card
pub const MAX_OWNERS: usize = 2;

/// Set of owners with access to a card
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ownership {
    owners: BTreeSet<OwnerId>,
}

impl Ownership {
    pub fn of(owners: impl IntoIterator<Item = OwnerId>) -> Self {
        Self {
            owners: owners.into_iter().collect(),
        }
    }

    pub fn has_access(&self, owner: OwnerId) -> bool {
        self.owners.contains(&owner)
    }

    pub fn add_access(&self, owner: OwnerId) -> Self {
        let mut owners = self.owners.clone();
        owners.insert(owner);
        Self { owners }
    }

    pub fn revoke(&self, owner: OwnerId) -> Self {
        let mut owners = self.owners.clone();
        owners.remove(&owner);
        Self { owners }
    }

    pub fn size(&self) -> usize {
        self.owners.len()
    }

    pub fn owners(&self) -> impl Iterator<Item = &OwnerId> {
        self.owners.iter()
    }
}

/// Ownership documents keyed by card
#[derive(Debug, Clone, Default)]
pub struct OwnershipRepository {
    collection: VersionedCollection<Ownership>,
}

impl OwnershipRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ownership of a card with its version; empty at version 0 if unknown
    pub fn find(&self, card_id: CardId) -> Versioned<Ownership> {
        self.collection
            .find(&Self::key(card_id))
            .unwrap_or_else(|| Versioned {
                record: Ownership::default(),
                version: 0,
            })
    }

    pub fn save(
        &self,
        card_id: CardId,
        ownership: Ownership,
        expected_version: i64,
    ) -> Result<i64, EventStoreError> {
        self.collection
            .save(&Self::key(card_id), ownership, expected_version)
    }

    fn key(card_id: CardId) -> StreamId {
        StreamId::new(format!("Ownership:{card_id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_revoke_access() {
        let owner = OwnerId::random();
        let ownership = Ownership::default().add_access(owner);

        assert!(ownership.has_access(owner));
        assert_eq!(ownership.size(), 1);

        let ownership = ownership.revoke(owner);
        assert!(!ownership.has_access(owner));
    }

    #[test]
    fn test_adding_same_owner_twice_is_idempotent() {
        let owner = OwnerId::random();
        let ownership = Ownership::of([owner]).add_access(owner);

        assert_eq!(ownership.size(), 1);
    }

    #[test]
    fn test_repository_defaults_to_empty() {
        let repository = OwnershipRepository::new();
        let card_id = CardId::random();

        let found = repository.find(card_id);
        assert_eq!(found.version, 0);
        assert_eq!(found.record.size(), 0);

        let owner = OwnerId::random();
        repository
            .save(card_id, found.record.add_access(owner), found.version)
            .unwrap();
        assert!(repository.find(card_id).record.has_access(owner));
    }
}
