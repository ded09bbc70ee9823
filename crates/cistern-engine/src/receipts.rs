//! Operation receipts
//!
//! Mutating operations return a small serializable record of what they did,
//! mirroring what the audit log carries. Hosts surface these to callers and
//! indexers.

use serde::{Deserialize, Serialize};

use cistern_core::{AccountId, CurrencyAmount, DropId};

/// Result of a generate batch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateReceipt {
    /// Ids minted, in batch order
    pub ids: Vec<DropId>,

    /// Resource bytes debited; zero for bound batches
    pub bytes_charged: i64,

    /// The owner's resource balance after the batch
    pub bytes_balance: i64,
}

/// Result of binding drops
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindReceipt {
    /// Resource bytes credited back to the owner
    pub bytes_released: i64,

    /// The owner's resource balance after the bind
    pub bytes_balance: i64,
}

/// Result of unbinding drops
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbindReceipt {
    /// Resource bytes debited from the owner
    pub bytes_charged: i64,

    /// The owner's resource balance after the unbind
    pub bytes_balance: i64,
}

/// Result of destroying drops
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestroyReceipt {
    /// How many drops were removed
    pub destroyed: usize,

    /// How many of them were unbound, and so reclaimed their footprint
    pub unbound_destroyed: usize,

    /// Resource bytes credited back to the owner
    pub bytes_reclaimed: i64,
}

/// How a claim paid out
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimPayout {
    /// Nothing to claim
    None,

    /// Bytes sold at market, currency on its way to the owner
    Currency(CurrencyAmount),

    /// Bytes handed over directly
    Resource(i64),
}

/// Result of a claim
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    /// Resource bytes withdrawn from the owner's balance
    pub bytes: i64,

    pub payout: ClaimPayout,
}

/// What the settlement layer made of an inbound transfer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepositOutcome {
    /// Not a user deposit; nothing happened
    Ignored,

    /// Deposit accepted and converted to resource bytes
    Credited { receiver: AccountId, bytes: i64 },
}
