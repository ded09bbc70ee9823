//! The operation surface of the drop ledger
//!
//! One `CisternEngine` owns the three stores and serializes every mutating
//! operation behind a fixed guard order: state, then balances, then
//! registry, then the effects outbox. Operations validate everything under
//! their guards before mutating anything, so each one is atomic: it either
//! commits completely or leaves no trace.
//!
//! ```text
//!             ┌───────────────────────────────────────────┐
//!             │              CisternEngine                │
//!             │                                           │
//!    caller ──►  generate / transfer / bind / unbind /    │
//!             │  destroy / open / claim / enable          │
//!             │        │                                  │
//!             │        ▼                                  │
//!             │  SystemState ─ BalanceBook ─ DropRegistry │
//!             │        │                                  │
//!             │        ▼                                  │
//!             │  effects outbox ──► drained by the host   │
//!             └───────────────────────────────────────────┘
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::info;

use cistern_core::constants::MIN_ENTROPY_LEN;
use cistern_core::{
    derive_batch, AccountId, AssetKind, CisternError, Clock, CurrencyAmount, DropId, Result,
    SystemClock, Timestamp,
};
use cistern_ledger::{Balance, BalanceBook, DropRecord, DropRegistry, SystemState};
use cistern_market::{resource_cost_with_fee, resource_proceeds_minus_fee, ReserveFeed};

use crate::config::CisternConfig;
use crate::effects::EffectRequest;
use crate::receipts::{
    BindReceipt, ClaimPayout, ClaimReceipt, DestroyReceipt, GenerateReceipt, UnbindReceipt,
};

/// The drop ledger engine
pub struct CisternEngine {
    pub(crate) config: CisternConfig,
    pub(crate) state: RwLock<SystemState>,
    pub(crate) balances: RwLock<BalanceBook>,
    pub(crate) registry: RwLock<DropRegistry>,
    pub(crate) reserves: Arc<dyn ReserveFeed>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) effects: Mutex<Vec<EffectRequest>>,
}

impl CisternEngine {
    /// Build an engine over the given market feed and clock
    pub fn new(
        config: CisternConfig,
        reserves: Arc<dyn ReserveFeed>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let state = SystemState::new(config.units_per_drop);
        let balances = BalanceBook::new(config.treasury.clone());
        Ok(Self {
            config,
            state: RwLock::new(state),
            balances: RwLock::new(balances),
            registry: RwLock::new(DropRegistry::new()),
            reserves,
            clock,
            effects: Mutex::new(Vec::new()),
        })
    }

    /// Engine on the system wall clock
    pub fn with_system_clock(config: CisternConfig, reserves: Arc<dyn ReserveFeed>) -> Result<Self> {
        Self::new(config, reserves, Arc::new(SystemClock))
    }

    pub fn config(&self) -> &CisternConfig {
        &self.config
    }

    // === Lifecycle operations ===

    /// Mint `amount` drops for `owner`
    ///
    /// Ids are derived from the entropy string salted with the global
    /// sequence. Unbound drops debit `amount * units_per_drop` resource
    /// bytes from the owner; bound drops carry their cost in the drop
    /// itself and debit nothing. The whole batch succeeds or nothing
    /// changes.
    pub fn generate(
        &self,
        caller: &AccountId,
        owner: &AccountId,
        bound: bool,
        amount: u32,
        entropy: &str,
        to_notify: Option<&AccountId>,
    ) -> Result<GenerateReceipt> {
        self.authorize(caller, owner)?;

        let mut state = self.state.write();
        let mut balances = self.balances.write();
        let mut registry = self.registry.write();

        Self::check_enabled(&state)?;
        if owner == &self.config.treasury {
            return Err(CisternError::InvalidInput(
                "the treasury cannot mint drops for itself".into(),
            ));
        }
        if amount == 0 {
            return Err(CisternError::InvalidInput(
                "generate amount must be positive".into(),
            ));
        }
        if entropy.len() < MIN_ENTROPY_LEN {
            return Err(CisternError::InvalidInput(format!(
                "entropy must be at least {MIN_ENTROPY_LEN} characters, got {}",
                entropy.len()
            )));
        }

        // Derive and collision-check every id before touching any store.
        let ids = derive_batch(amount, state.sequence, entropy);
        let mut seen = BTreeSet::new();
        for id in &ids {
            if registry.contains(*id) || !seen.insert(*id) {
                return Err(CisternError::DropExists(*id));
            }
        }

        let bytes_charged = if bound {
            0
        } else {
            state.units_per_drop * i64::from(amount)
        };
        let available = balances.resource_available(owner);
        if available < bytes_charged {
            return Err(CisternError::InsufficientBalance {
                owner: owner.clone(),
                asset: AssetKind::ResourceBytes,
                required: bytes_charged,
                available,
            });
        }

        // Commit.
        balances.open(owner);
        if bytes_charged > 0 {
            balances.deduct_resource(owner, bytes_charged)?;
        }
        balances.mint_drops(owner, i64::from(amount))?;
        state.advance_sequence(amount);

        let created_at = self.clock.now();
        for id in &ids {
            registry.insert(DropRecord {
                id: *id,
                owner: owner.clone(),
                created_at,
                bound,
            })?;
        }
        let bytes_balance = balances.resource_available(owner);

        let mut effects = self.effects.lock();
        effects.push(EffectRequest::Notify {
            account: owner.clone(),
        });
        if let Some(account) = to_notify {
            effects.push(EffectRequest::Notify {
                account: account.clone(),
            });
        }

        info!(
            "Generated {amount} {} drops for {owner}, charged {bytes_charged} bytes",
            if bound { "bound" } else { "unbound" }
        );
        Ok(GenerateReceipt {
            ids,
            bytes_charged,
            bytes_balance,
        })
    }

    /// Move unbound drops from `from` to `to`
    pub fn transfer(
        &self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        ids: &[DropId],
        memo: &str,
    ) -> Result<()> {
        self.authorize(caller, from)?;

        let state = self.state.read();
        let mut balances = self.balances.write();
        let mut registry = self.registry.write();

        Self::check_enabled(&state)?;
        if to == from {
            return Err(CisternError::InvalidInput("cannot transfer to self".into()));
        }
        if to == &self.config.treasury {
            return Err(CisternError::InvalidInput(
                "cannot transfer drops to the treasury".into(),
            ));
        }
        Self::check_batch(ids)?;

        // Validate the whole batch before moving anything.
        for id in ids {
            let record = registry.require_owned(*id, from)?;
            if record.bound {
                return Err(CisternError::InvalidState(format!(
                    "drop {id} is bound and cannot be transferred"
                )));
            }
        }
        balances.check_drops(from, ids.len() as i64)?;

        // Commit.
        balances.open(to);
        for id in ids {
            registry.set_owner(*id, to)?;
        }
        balances.transfer_drops(from, to, ids.len() as i64)?;

        let mut effects = self.effects.lock();
        effects.push(EffectRequest::Notify {
            account: from.clone(),
        });
        effects.push(EffectRequest::Notify { account: to.clone() });

        if memo.is_empty() {
            info!("Transferred {} drops from {from} to {to}", ids.len());
        } else {
            info!("Transferred {} drops from {from} to {to}: {memo}", ids.len());
        }
        Ok(())
    }

    /// Bind drops, folding their storage cost into the drops themselves
    ///
    /// Each bound drop releases `units_per_drop` bytes back to the owner's
    /// balance; the bytes stay claimable until spent or withdrawn.
    pub fn bind(
        &self,
        caller: &AccountId,
        owner: &AccountId,
        ids: &[DropId],
    ) -> Result<BindReceipt> {
        self.authorize(caller, owner)?;

        let state = self.state.read();
        let mut balances = self.balances.write();
        let mut registry = self.registry.write();

        Self::check_enabled(&state)?;
        Self::check_batch(ids)?;
        for id in ids {
            let record = registry.require_owned(*id, owner)?;
            if record.bound {
                return Err(CisternError::InvalidState(format!(
                    "drop {id} is already bound"
                )));
            }
        }
        let bytes_released = state.units_per_drop * ids.len() as i64;

        // Commit.
        balances.open(owner);
        for id in ids {
            registry.set_bound(*id, true)?;
        }
        let bytes_balance = balances.add_resource(owner, bytes_released)?;

        info!(
            "Bound {} drops for {owner}, released {bytes_released} bytes",
            ids.len()
        );
        Ok(BindReceipt {
            bytes_released,
            bytes_balance,
        })
    }

    /// Unbind drops, charging their storage cost back to the owner
    pub fn unbind(
        &self,
        caller: &AccountId,
        owner: &AccountId,
        ids: &[DropId],
    ) -> Result<UnbindReceipt> {
        self.authorize(caller, owner)?;

        let state = self.state.read();
        let mut balances = self.balances.write();
        let mut registry = self.registry.write();

        Self::check_enabled(&state)?;
        Self::check_batch(ids)?;
        for id in ids {
            let record = registry.require_owned(*id, owner)?;
            if !record.bound {
                return Err(CisternError::InvalidState(format!(
                    "drop {id} is not bound"
                )));
            }
        }
        let bytes_charged = state.units_per_drop * ids.len() as i64;
        balances.check_resource(owner, bytes_charged)?;

        // Commit.
        for id in ids {
            registry.set_bound(*id, false)?;
        }
        let bytes_balance = balances.deduct_resource(owner, bytes_charged)?;

        info!(
            "Unbound {} drops for {owner}, charged {bytes_charged} bytes",
            ids.len()
        );
        Ok(UnbindReceipt {
            bytes_charged,
            bytes_balance,
        })
    }

    /// Destroy drops, reclaiming the footprint of the unbound ones
    pub fn destroy(
        &self,
        caller: &AccountId,
        owner: &AccountId,
        ids: &[DropId],
        memo: &str,
        to_notify: Option<&AccountId>,
    ) -> Result<DestroyReceipt> {
        self.authorize(caller, owner)?;

        let state = self.state.read();
        let mut balances = self.balances.write();
        let mut registry = self.registry.write();

        Self::check_enabled(&state)?;
        Self::check_batch(ids)?;
        let mut unbound_destroyed = 0usize;
        for id in ids {
            let record = registry.require_owned(*id, owner)?;
            if !record.bound {
                unbound_destroyed += 1;
            }
        }
        balances.check_drops(owner, ids.len() as i64)?;
        let bytes_reclaimed = state.units_per_drop * unbound_destroyed as i64;

        // Commit.
        balances.open(owner);
        for id in ids {
            registry.remove(*id)?;
        }
        balances.burn_drops(owner, ids.len() as i64)?;
        if bytes_reclaimed > 0 {
            balances.add_resource(owner, bytes_reclaimed)?;
        }

        let mut effects = self.effects.lock();
        effects.push(EffectRequest::Notify {
            account: owner.clone(),
        });
        if let Some(account) = to_notify {
            effects.push(EffectRequest::Notify {
                account: account.clone(),
            });
        }

        if memo.is_empty() {
            info!(
                "Destroyed {} drops for {owner} ({unbound_destroyed} unbound, {bytes_reclaimed} bytes reclaimed)",
                ids.len()
            );
        } else {
            info!(
                "Destroyed {} drops for {owner} ({unbound_destroyed} unbound, {bytes_reclaimed} bytes reclaimed): {memo}",
                ids.len()
            );
        }
        Ok(DestroyReceipt {
            destroyed: ids.len(),
            unbound_destroyed,
            bytes_reclaimed,
        })
    }

    /// Open a zeroed balance row for `owner`
    ///
    /// Idempotent; returns whether a row was created. Available even while
    /// the system is disabled.
    pub fn open(&self, caller: &AccountId, owner: &AccountId) -> Result<bool> {
        self.authorize(caller, owner)?;
        let mut balances = self.balances.write();
        Ok(balances.open(owner))
    }

    /// Withdraw `owner`'s entire resource balance
    ///
    /// A zero balance is a successful no-op. Otherwise the full balance is
    /// debited and paid out: sold at market for currency by default, or
    /// handed over as raw bytes when the engine is configured for in-kind
    /// payouts. Available even while the system is disabled, so holders can
    /// always exit.
    pub fn claim(&self, caller: &AccountId, owner: &AccountId) -> Result<ClaimReceipt> {
        self.authorize(caller, owner)?;

        let mut balances = self.balances.write();
        let bytes = balances.require(owner)?.resource_bytes;
        if bytes == 0 {
            return Ok(ClaimReceipt {
                bytes: 0,
                payout: ClaimPayout::None,
            });
        }
        balances.deduct_resource(owner, bytes)?;

        let mut effects = self.effects.lock();
        let payout = if self.config.payout_in_resource {
            effects.push(EffectRequest::TransferResource {
                to: owner.clone(),
                bytes,
                memo: "claimed resource balance".into(),
            });
            ClaimPayout::Resource(bytes)
        } else {
            let proceeds = resource_proceeds_minus_fee(bytes, &self.reserves.reserves());
            effects.push(EffectRequest::SellResource { bytes });
            effects.push(EffectRequest::TransferCurrency {
                to: owner.clone(),
                amount: proceeds,
                memo: "claimed resource balance".into(),
            });
            ClaimPayout::Currency(proceeds)
        };

        info!("Claimed {bytes} resource bytes for {owner}");
        Ok(ClaimReceipt { bytes, payout })
    }

    // === Administration ===

    /// Flip the kill switch
    ///
    /// The first enabling stamps the genesis time and opens the treasury
    /// row.
    pub fn enable(&self, caller: &AccountId, enabled: bool) -> Result<()> {
        self.authorize(caller, &self.config.admin)?;

        let mut state = self.state.write();
        let mut balances = self.balances.write();

        balances.open(&self.config.treasury);
        state.enabled = enabled;
        if enabled && state.genesis.is_none() {
            let genesis = self.clock.now();
            state.genesis = Some(genesis);
            info!("Genesis stamped at {genesis}");
        }

        info!(
            "Drop operations {}",
            if enabled { "enabled" } else { "disabled" }
        );
        Ok(())
    }

    /// Retune the per-drop resource footprint
    ///
    /// Rejected while any drops exist: live drops were charged at the old
    /// rate and the bind/unbind/destroy arithmetic would stop reconciling.
    pub fn set_units_per_drop(&self, caller: &AccountId, units: i64) -> Result<()> {
        self.authorize(caller, &self.config.admin)?;
        if units <= 0 {
            return Err(CisternError::InvalidInput(
                "units per drop must be positive".into(),
            ));
        }

        let mut state = self.state.write();
        let registry = self.registry.read();
        if !registry.is_empty() {
            return Err(CisternError::InvalidState(format!(
                "cannot change units per drop while {} drops exist",
                registry.len()
            )));
        }
        state.units_per_drop = units;
        info!("Units per drop set to {units}");
        Ok(())
    }

    // === Read-only surface ===

    /// Full purchase price of `bytes`, fee included
    pub fn quote_resource_cost(&self, bytes: i64) -> Result<CurrencyAmount> {
        resource_cost_with_fee(bytes, &self.reserves.reserves())
    }

    /// Cost of minting `amount` unbound drops at the current footprint
    pub fn quote_generate_cost(&self, amount: u32) -> Result<CurrencyAmount> {
        let bytes = {
            let state = self.state.read();
            state.units_per_drop * i64::from(amount)
        };
        self.quote_resource_cost(bytes)
    }

    /// Resource bytes a deposit of `quantity` would purchase right now
    pub fn quote_deposit_bytes(&self, quantity: CurrencyAmount) -> i64 {
        cistern_market::deposit_bytes(quantity, &self.reserves.reserves())
    }

    pub fn balance_of(&self, owner: &AccountId) -> Option<Balance> {
        self.balances.read().get(owner).cloned()
    }

    pub fn drop_record(&self, id: DropId) -> Option<DropRecord> {
        self.registry.read().get(id).cloned()
    }

    /// All of `owner`'s drops in ascending id order
    pub fn drops_of(&self, owner: &AccountId) -> Vec<DropRecord> {
        self.registry.read().drops_of(owner).cloned().collect()
    }

    pub fn system_state(&self) -> SystemState {
        self.state.read().clone()
    }

    /// Take every pending side-effect request, in emission order
    pub fn drain_effects(&self) -> Vec<EffectRequest> {
        std::mem::take(&mut *self.effects.lock())
    }

    pub fn pending_effects(&self) -> usize {
        self.effects.lock().len()
    }

    /// Engine statistics
    pub fn stats(&self) -> EngineStats {
        let state = self.state.read();
        let balances = self.balances.read();
        let registry = self.registry.read();

        let treasury = balances.get(balances.treasury());
        EngineStats {
            live_drops: registry.len(),
            accounts: balances.len(),
            total_drops: treasury.map_or(0, |row| row.drops),
            pooled_resource_bytes: treasury.map_or(0, |row| row.resource_bytes),
            sequence: state.sequence,
            genesis: state.genesis,
            enabled: state.enabled,
        }
    }

    // === Shared checks ===

    pub(crate) fn check_enabled(state: &SystemState) -> Result<()> {
        if !state.enabled {
            return Err(CisternError::SystemDisabled);
        }
        Ok(())
    }

    fn authorize(&self, caller: &AccountId, required: &AccountId) -> Result<()> {
        if caller != required {
            return Err(CisternError::Unauthorized {
                caller: caller.clone(),
                required: required.clone(),
            });
        }
        Ok(())
    }

    /// Batch id lists must be non-empty and duplicate-free; a duplicate
    /// would double-apply its balance movement.
    fn check_batch(ids: &[DropId]) -> Result<()> {
        if ids.is_empty() {
            return Err(CisternError::InvalidInput("no drop ids supplied".into()));
        }
        let mut seen = BTreeSet::new();
        for id in ids {
            if !seen.insert(*id) {
                return Err(CisternError::InvalidInput(format!(
                    "drop {id} appears more than once in the batch"
                )));
            }
        }
        Ok(())
    }
}

/// Point-in-time engine statistics
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Rows in the drop registry
    pub live_drops: usize,

    /// Opened balance rows, treasury included
    pub accounts: usize,

    /// Treasury mirror of the drop supply; always equals `live_drops`
    pub total_drops: i64,

    /// Treasury mirror of all user resource bytes
    pub pooled_resource_bytes: i64,

    pub sequence: u64,
    pub genesis: Option<Timestamp>,
    pub enabled: bool,
}
