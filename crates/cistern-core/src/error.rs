//! Error types for cistern operations

use crate::types::{AccountId, AssetKind, CurrencyAmount, DropId};
use thiserror::Error;

/// Result type alias for cistern operations
pub type Result<T> = std::result::Result<T, CisternError>;

/// Errors that can occur across the cistern subsystem
///
/// Every violation rejects its whole operation: no partial commits, no
/// automatic retries.
#[derive(Error, Debug, Clone)]
pub enum CisternError {
    // === System Gating ===
    /// Drop operations are switched off
    #[error("Drop operations are disabled")]
    SystemDisabled,

    /// Caller does not hold the authority the operation requires
    #[error("{caller} is not authorized to act for {required}")]
    Unauthorized {
        caller: AccountId,
        required: AccountId,
    },

    // === Drop Registry ===
    /// No drop with this id exists
    #[error("Drop {0} not found")]
    DropNotFound(DropId),

    /// Drop exists but belongs to another account
    #[error("Drop {id} is not owned by {owner}")]
    NotOwner { id: DropId, owner: AccountId },

    /// Operation not valid in the current drop or system state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Freshly derived id collides with an existing drop
    #[error("Drop {0} already exists")]
    DropExists(DropId),

    // === Balances ===
    /// Account row has not been opened
    #[error("Account {0} has no open balance row")]
    AccountNotOpened(AccountId),

    /// Balance too small for the requested debit
    #[error("{owner} has {available} {asset}, needs {required}")]
    InsufficientBalance {
        owner: AccountId,
        asset: AssetKind,
        required: i64,
        available: i64,
    },

    // === Market ===
    /// Purchase would drain the resource side of the pool
    #[error("Cannot purchase {requested} resource bytes; pool holds {reserve}")]
    MarketExhausted { requested: i64, reserve: i64 },

    /// Deposit too small to purchase a single resource byte
    #[error("Deposit of {quantity} buys zero resource bytes")]
    UnderfundedDeposit { quantity: CurrencyAmount },

    // === General ===
    /// Malformed or out-of-range input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Error codes for host-facing responses
impl CisternError {
    /// Get the numeric code for API responses
    pub fn code(&self) -> u32 {
        match self {
            Self::SystemDisabled => 1001,
            Self::Unauthorized { .. } => 1002,
            Self::DropNotFound(_) => 1003,
            Self::NotOwner { .. } => 1004,
            Self::InvalidState(_) => 1005,
            Self::DropExists(_) => 1006,
            Self::AccountNotOpened(_) => 1007,
            Self::InsufficientBalance { .. } => 1008,
            Self::MarketExhausted { .. } => 1009,
            Self::UnderfundedDeposit { .. } => 1010,
            Self::InvalidInput(_) => 1011,
        }
    }

    /// Check if the condition can clear without operator intervention
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SystemDisabled
                | Self::InsufficientBalance { .. }
                | Self::MarketExhausted { .. }
                | Self::UnderfundedDeposit { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str) -> AccountId {
        AccountId::new(name).unwrap()
    }

    #[test]
    fn test_error_codes() {
        let err = CisternError::DropNotFound(DropId::new(42));
        assert_eq!(err.code(), 1003);

        let err = CisternError::SystemDisabled;
        assert_eq!(err.code(), 1001);
    }

    #[test]
    fn test_error_display_carries_context() {
        let err = CisternError::InsufficientBalance {
            owner: account("alice"),
            asset: AssetKind::ResourceBytes,
            required: 277,
            available: 100,
        };
        let msg = format!("{err}");
        assert!(msg.contains("alice"));
        assert!(msg.contains("277"));
        assert!(msg.contains("100"));
        assert!(msg.contains("resource bytes"));
    }

    #[test]
    fn test_not_owner_names_both_sides() {
        let err = CisternError::NotOwner {
            id: DropId::new(7),
            owner: account("bob"),
        };
        let msg = format!("{err}");
        assert!(msg.contains('7'));
        assert!(msg.contains("bob"));
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(CisternError::SystemDisabled.is_recoverable());
        assert!(CisternError::MarketExhausted {
            requested: 10,
            reserve: 5
        }
        .is_recoverable());
        assert!(!CisternError::DropNotFound(DropId::new(1)).is_recoverable());
    }
}
