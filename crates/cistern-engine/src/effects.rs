//! Deferred side-effect requests
//!
//! Operations never call out to the market or the currency layer directly.
//! They append requests to an ordered outbox after all local validation has
//! passed; the host drains the outbox and executes each request once the
//! operation's state changes commit. Outcomes are not observable here: a
//! host-side failure rolls back the whole transaction, ledger mutations
//! included.

use serde::{Deserialize, Serialize};
use std::fmt;

use cistern_core::{AccountId, CurrencyAmount};

/// A request for the host to execute after commit
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectRequest {
    /// Spend `cost` at the marketplace, restocking the resource pool
    BuyResource { cost: CurrencyAmount },

    /// Sell `bytes` from the pool back to the marketplace
    SellResource { bytes: i64 },

    /// Pay settlement currency to `to`
    TransferCurrency {
        to: AccountId,
        amount: CurrencyAmount,
        memo: String,
    },

    /// Hand raw resource bytes to `to`
    TransferResource {
        to: AccountId,
        bytes: i64,
        memo: String,
    },

    /// Tell `account` that an operation touched it
    Notify { account: AccountId },
}

impl fmt::Display for EffectRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectRequest::BuyResource { cost } => write!(f, "buy resource for {cost}"),
            EffectRequest::SellResource { bytes } => write!(f, "sell {bytes} resource bytes"),
            EffectRequest::TransferCurrency { to, amount, .. } => {
                write!(f, "pay {amount} to {to}")
            }
            EffectRequest::TransferResource { to, bytes, .. } => {
                write!(f, "hand {bytes} resource bytes to {to}")
            }
            EffectRequest::Notify { account } => write!(f, "notify {account}"),
        }
    }
}
