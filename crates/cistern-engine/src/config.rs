//! Engine configuration
//!
//! Every field has a default, so a TOML file only needs to override what
//! deviates from the stock layout.

use serde::{Deserialize, Serialize};

use cistern_core::constants::DEFAULT_UNITS_PER_DROP;
use cistern_core::{AccountId, CisternError, Result};

/// Longest currency symbol the settlement layer accepts
const MAX_SYMBOL_LEN: usize = 7;

/// Configuration of a [`crate::CisternEngine`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CisternConfig {
    /// Account holding the mirror row; also the account deposits are sent to
    pub treasury: AccountId,

    /// Account allowed to flip the kill switch and retune the footprint
    pub admin: AccountId,

    /// Marketplace settlement account; its inbound transfers are sale
    /// proceeds, not user deposits
    pub market_account: AccountId,

    /// Symbol deposits must be denominated in
    pub currency_symbol: String,

    /// Resource bytes charged per unbound drop at startup
    pub units_per_drop: i64,

    /// Allow a deposit memo to fund an account other than the sender
    pub allow_gifting: bool,

    /// Pay claims out in raw resource bytes instead of selling for currency
    pub payout_in_resource: bool,
}

impl Default for CisternConfig {
    fn default() -> Self {
        Self {
            treasury: AccountId::from_static("cistern"),
            admin: AccountId::from_static("cistern"),
            market_account: AccountId::from_static("resource.mkt"),
            currency_symbol: "CST".to_string(),
            units_per_drop: DEFAULT_UNITS_PER_DROP,
            allow_gifting: false,
            payout_in_resource: false,
        }
    }
}

impl CisternConfig {
    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.units_per_drop <= 0 {
            return Err(CisternError::InvalidInput(format!(
                "units_per_drop must be positive, got {}",
                self.units_per_drop
            )));
        }
        if self.treasury == self.market_account {
            return Err(CisternError::InvalidInput(
                "treasury and market_account must differ".into(),
            ));
        }
        if self.currency_symbol.is_empty()
            || self.currency_symbol.len() > MAX_SYMBOL_LEN
            || !self.currency_symbol.bytes().all(|b| b.is_ascii_uppercase())
        {
            return Err(CisternError::InvalidInput(format!(
                "currency symbol '{}' must be 1-{MAX_SYMBOL_LEN} uppercase letters",
                self.currency_symbol
            )));
        }
        Ok(())
    }
}
