//! Drop registry: every live drop, keyed by id

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use cistern_core::{AccountId, CisternError, DropId, Result, Timestamp};

/// One minted drop
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropRecord {
    /// Pseudo-random identifier, unique for the registry's lifetime
    pub id: DropId,
    pub owner: AccountId,
    /// Host clock time at mint
    pub created_at: Timestamp,
    /// Bound drops carry their storage cost inside the drop itself and
    /// cannot be transferred
    pub bound: bool,
}

/// Registry of live drops with an owner-ordered secondary index
///
/// The index is a `(owner, id)` set kept in lockstep with the primary rows:
/// ownership changes reindex, bound-flag changes do not.
#[derive(Clone, Debug, Default)]
pub struct DropRegistry {
    rows: BTreeMap<DropId, DropRecord>,
    by_owner: BTreeSet<(AccountId, DropId)>,
}

impl DropRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, id: DropId) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn get(&self, id: DropId) -> Option<&DropRecord> {
        self.rows.get(&id)
    }

    /// Fetch a record, failing when no drop has this id
    pub fn require(&self, id: DropId) -> Result<&DropRecord> {
        self.rows.get(&id).ok_or(CisternError::DropNotFound(id))
    }

    /// Fetch a record, failing unless `owner` owns it
    pub fn require_owned(&self, id: DropId, owner: &AccountId) -> Result<&DropRecord> {
        let record = self.require(id)?;
        if &record.owner != owner {
            return Err(CisternError::NotOwner {
                id,
                owner: owner.clone(),
            });
        }
        Ok(record)
    }

    /// Insert a freshly minted drop. The id must be unused.
    pub fn insert(&mut self, record: DropRecord) -> Result<()> {
        if self.rows.contains_key(&record.id) {
            return Err(CisternError::DropExists(record.id));
        }
        self.by_owner.insert((record.owner.clone(), record.id));
        self.rows.insert(record.id, record);
        Ok(())
    }

    /// Remove a destroyed drop, returning its final record
    pub fn remove(&mut self, id: DropId) -> Result<DropRecord> {
        let record = self.rows.remove(&id).ok_or(CisternError::DropNotFound(id))?;
        self.by_owner.remove(&(record.owner.clone(), id));
        Ok(record)
    }

    /// Reassign ownership, keeping the owner index in lockstep
    pub fn set_owner(&mut self, id: DropId, new_owner: &AccountId) -> Result<()> {
        let record = self.rows.get_mut(&id).ok_or(CisternError::DropNotFound(id))?;
        let old_owner = std::mem::replace(&mut record.owner, new_owner.clone());
        self.by_owner.remove(&(old_owner, id));
        self.by_owner.insert((new_owner.clone(), id));
        Ok(())
    }

    /// Flip the bound flag in place
    pub fn set_bound(&mut self, id: DropId, bound: bool) -> Result<()> {
        let record = self.rows.get_mut(&id).ok_or(CisternError::DropNotFound(id))?;
        record.bound = bound;
        Ok(())
    }

    /// All of `owner`'s drops in ascending id order
    pub fn drops_of<'a>(&'a self, owner: &AccountId) -> impl Iterator<Item = &'a DropRecord> + 'a {
        let start = (owner.clone(), DropId::new(0));
        let end = (owner.clone(), DropId::new(u64::MAX));
        self.by_owner
            .range(start..=end)
            .filter_map(move |(_, id)| self.rows.get(id))
    }

    /// How many drops `owner` holds
    pub fn count_of(&self, owner: &AccountId) -> usize {
        self.drops_of(owner).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str) -> AccountId {
        AccountId::new(name).unwrap()
    }

    fn record(id: u64, owner: &str) -> DropRecord {
        DropRecord {
            id: DropId::new(id),
            owner: account(owner),
            created_at: 1_700_000_000,
            bound: false,
        }
    }

    #[test]
    fn test_insert_and_require() {
        let mut registry = DropRegistry::new();
        registry.insert(record(10, "alice")).unwrap();

        assert!(registry.contains(DropId::new(10)));
        assert_eq!(registry.require(DropId::new(10)).unwrap().owner, account("alice"));
        assert!(matches!(
            registry.require(DropId::new(11)).unwrap_err(),
            CisternError::DropNotFound(_)
        ));
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let mut registry = DropRegistry::new();
        registry.insert(record(10, "alice")).unwrap();
        let err = registry.insert(record(10, "bob")).unwrap_err();
        assert!(matches!(err, CisternError::DropExists(id) if id == DropId::new(10)));
        // Original row is intact.
        assert_eq!(registry.require(DropId::new(10)).unwrap().owner, account("alice"));
    }

    #[test]
    fn test_require_owned_checks_ownership() {
        let mut registry = DropRegistry::new();
        registry.insert(record(10, "alice")).unwrap();

        assert!(registry.require_owned(DropId::new(10), &account("alice")).is_ok());
        let err = registry
            .require_owned(DropId::new(10), &account("bob"))
            .unwrap_err();
        assert!(matches!(err, CisternError::NotOwner { .. }));
    }

    #[test]
    fn test_owner_index_follows_transfers() {
        let mut registry = DropRegistry::new();
        registry.insert(record(5, "alice")).unwrap();
        registry.insert(record(9, "alice")).unwrap();
        registry.insert(record(7, "bob")).unwrap();

        assert_eq!(registry.count_of(&account("alice")), 2);
        registry.set_owner(DropId::new(9), &account("bob")).unwrap();

        assert_eq!(registry.count_of(&account("alice")), 1);
        let bobs: Vec<u64> = registry
            .drops_of(&account("bob"))
            .map(|r| r.id.value())
            .collect();
        assert_eq!(bobs, vec![7, 9]);
    }

    #[test]
    fn test_bound_flip_keeps_index() {
        let mut registry = DropRegistry::new();
        registry.insert(record(5, "alice")).unwrap();

        registry.set_bound(DropId::new(5), true).unwrap();
        assert!(registry.require(DropId::new(5)).unwrap().bound);
        assert_eq!(registry.count_of(&account("alice")), 1);
    }

    #[test]
    fn test_remove_clears_index() {
        let mut registry = DropRegistry::new();
        registry.insert(record(5, "alice")).unwrap();
        registry.insert(record(6, "alice")).unwrap();

        let removed = registry.remove(DropId::new(5)).unwrap();
        assert_eq!(removed.id, DropId::new(5));
        assert_eq!(registry.count_of(&account("alice")), 1);
        assert!(matches!(
            registry.remove(DropId::new(5)).unwrap_err(),
            CisternError::DropNotFound(_)
        ));
    }
}
