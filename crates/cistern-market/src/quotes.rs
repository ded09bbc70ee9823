//! Quote calculations against a reserve snapshot
//!
//! The four conversions the ledger needs. Buy-side fees are charged on top
//! of the curve price (divide by 0.995); sell-side and deposit fees are
//! carved out of the amount first (0.5% rounded up). Every rounding lands
//! in the caller's disfavor.

use cistern_core::{CisternError, CurrencyAmount, Result};

use crate::bancor::{bancor_input, bancor_output, purchase_fee};
use crate::reserves::ReserveSnapshot;

/// Raw curve cost of taking `bytes` out of the pool
///
/// Fails with [`CisternError::MarketExhausted`] when the pool cannot supply
/// `bytes`.
pub fn resource_cost(bytes: i64, snap: &ReserveSnapshot) -> Result<CurrencyAmount> {
    if bytes >= snap.resource {
        return Err(CisternError::MarketExhausted {
            requested: bytes,
            reserve: snap.resource,
        });
    }
    Ok(bancor_input(snap.resource, snap.currency, bytes))
}

/// Cost of `bytes` including the 0.5% purchase fee
pub fn resource_cost_with_fee(bytes: i64, snap: &ReserveSnapshot) -> Result<CurrencyAmount> {
    let cost = resource_cost(bytes, snap)?;
    Ok((cost as f64 / 0.995) as CurrencyAmount)
}

/// Currency received for selling `bytes` back to the pool, after the fee
pub fn resource_proceeds_minus_fee(bytes: i64, snap: &ReserveSnapshot) -> CurrencyAmount {
    let out = bancor_output(snap.resource, snap.currency, bytes);
    out - purchase_fee(out)
}

/// Resource bytes a deposit of `quantity` purchases
///
/// The 0.5% fee comes out of the deposit before it goes through the curve.
/// Returns zero for deposits too small to buy a single byte; the settlement
/// layer turns that into a hard failure.
pub fn deposit_bytes(quantity: CurrencyAmount, snap: &ReserveSnapshot) -> i64 {
    let after_fee = quantity - purchase_fee(quantity);
    bancor_output(snap.currency, snap.resource, after_fee)
}
