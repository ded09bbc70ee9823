//! Per-account balance book with treasury mirroring

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use cistern_core::{AccountId, AssetKind, CisternError, Result};

/// One account's holdings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub owner: AccountId,
    /// Count of drops owned, never negative
    pub drops: i64,
    /// Resource bytes available for minting, never negative
    pub resource_bytes: i64,
}

impl Balance {
    fn opened(owner: AccountId) -> Self {
        Self {
            owner,
            drops: 0,
            resource_bytes: 0,
        }
    }
}

/// Account balance book with a self-balancing treasury row
///
/// The treasury row carries the sum of every user row: each user-side
/// mutation applies the same delta to the treasury in the same call, except
/// transfers, which move ownership without changing supply. After every
/// successful call, `treasury.drops == Σ user drops` and
/// `treasury.resource_bytes == Σ user resource_bytes`.
///
/// Rows are created by [`BalanceBook::open`] and never deleted. Missing
/// rows are an error, not an implicit zero; opening on demand is the
/// engine's per-operation decision.
#[derive(Clone, Debug)]
pub struct BalanceBook {
    rows: BTreeMap<AccountId, Balance>,
    treasury: AccountId,
}

impl BalanceBook {
    /// Create an empty book. The treasury row itself starts unopened.
    pub fn new(treasury: AccountId) -> Self {
        Self {
            rows: BTreeMap::new(),
            treasury,
        }
    }

    /// The account whose row mirrors the user totals
    pub fn treasury(&self) -> &AccountId {
        &self.treasury
    }

    /// Create a zeroed row if none exists. Returns whether one was created.
    pub fn open(&mut self, owner: &AccountId) -> bool {
        if self.rows.contains_key(owner) {
            return false;
        }
        self.rows
            .insert(owner.clone(), Balance::opened(owner.clone()));
        debug!("Opened balance row for {owner}");
        true
    }

    pub fn is_open(&self, owner: &AccountId) -> bool {
        self.rows.contains_key(owner)
    }

    pub fn get(&self, owner: &AccountId) -> Option<&Balance> {
        self.rows.get(owner)
    }

    /// Fetch a row, failing when the account has never been opened
    pub fn require(&self, owner: &AccountId) -> Result<&Balance> {
        self.rows
            .get(owner)
            .ok_or_else(|| CisternError::AccountNotOpened(owner.clone()))
    }

    /// All rows in account order, treasury included
    pub fn accounts(&self) -> impl Iterator<Item = &Balance> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    // === Validation (no mutation) ===

    /// Resource bytes available to `owner`; zero when the row is missing
    pub fn resource_available(&self, owner: &AccountId) -> i64 {
        self.rows.get(owner).map_or(0, |row| row.resource_bytes)
    }

    /// Check a prospective resource debit without performing it
    pub fn check_resource(&self, owner: &AccountId, required: i64) -> Result<()> {
        let available = self.require(owner)?.resource_bytes;
        if available < required {
            return Err(CisternError::InsufficientBalance {
                owner: owner.clone(),
                asset: AssetKind::ResourceBytes,
                required,
                available,
            });
        }
        Ok(())
    }

    /// Check a prospective drop debit without performing it
    pub fn check_drops(&self, owner: &AccountId, required: i64) -> Result<()> {
        let available = self.require(owner)?.drops;
        if available < required {
            return Err(CisternError::InsufficientBalance {
                owner: owner.clone(),
                asset: AssetKind::Drops,
                required,
                available,
            });
        }
        Ok(())
    }

    // === Mutation (treasury-mirrored) ===

    /// Credit `bytes` to `owner` and the treasury. Returns the new balance.
    pub fn add_resource(&mut self, owner: &AccountId, bytes: i64) -> Result<i64> {
        self.guard_user(owner)?;
        self.require(owner)?;
        self.require(&self.treasury)?;

        let row = self.row_mut(owner)?;
        row.resource_bytes += bytes;
        let after = row.resource_bytes;
        let treasury = self.treasury.clone();
        self.row_mut(&treasury)?.resource_bytes += bytes;
        debug!("Resource bytes for {owner}: +{bytes} -> {after}");
        Ok(after)
    }

    /// Debit `bytes` from `owner` and the treasury. Returns the new balance.
    pub fn deduct_resource(&mut self, owner: &AccountId, bytes: i64) -> Result<i64> {
        self.guard_user(owner)?;
        self.check_resource(owner, bytes)?;
        self.require(&self.treasury)?;

        let row = self.row_mut(owner)?;
        row.resource_bytes -= bytes;
        let after = row.resource_bytes;
        let treasury = self.treasury.clone();
        self.row_mut(&treasury)?.resource_bytes -= bytes;
        debug!("Resource bytes for {owner}: -{bytes} -> {after}");
        Ok(after)
    }

    /// Credit `count` freshly minted drops to `owner` and the treasury
    pub fn mint_drops(&mut self, owner: &AccountId, count: i64) -> Result<i64> {
        self.guard_user(owner)?;
        self.require(owner)?;
        self.require(&self.treasury)?;

        let row = self.row_mut(owner)?;
        row.drops += count;
        let after = row.drops;
        let treasury = self.treasury.clone();
        self.row_mut(&treasury)?.drops += count;
        debug!("Drops for {owner}: +{count} -> {after}");
        Ok(after)
    }

    /// Debit `count` destroyed drops from `owner` and the treasury
    pub fn burn_drops(&mut self, owner: &AccountId, count: i64) -> Result<i64> {
        self.guard_user(owner)?;
        self.check_drops(owner, count)?;
        self.require(&self.treasury)?;

        let row = self.row_mut(owner)?;
        row.drops -= count;
        let after = row.drops;
        let treasury = self.treasury.clone();
        self.row_mut(&treasury)?.drops -= count;
        debug!("Drops for {owner}: -{count} -> {after}");
        Ok(after)
    }

    /// Move `count` drops between user rows. Ownership moves, supply does
    /// not, so the treasury row is untouched.
    pub fn transfer_drops(&mut self, from: &AccountId, to: &AccountId, count: i64) -> Result<()> {
        self.guard_user(from)?;
        self.guard_user(to)?;
        self.check_drops(from, count)?;
        self.require(to)?;

        self.row_mut(from)?.drops -= count;
        self.row_mut(to)?.drops += count;
        debug!("Moved {count} drops from {from} to {to}");
        Ok(())
    }

    fn row_mut(&mut self, owner: &AccountId) -> Result<&mut Balance> {
        self.rows
            .get_mut(owner)
            .ok_or_else(|| CisternError::AccountNotOpened(owner.clone()))
    }

    /// User-level mutations must never target the treasury row directly, or
    /// the mirror would count itself.
    fn guard_user(&self, owner: &AccountId) -> Result<()> {
        if owner == &self.treasury {
            return Err(CisternError::InvalidInput(format!(
                "account {owner} is the treasury and cannot hold a user balance"
            )));
        }
        Ok(())
    }
}
