//! Core type definitions for the cistern drop ledger
//!
//! Identifiers, amount aliases, and the system constants shared by the
//! pricing, ledger, and engine crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CisternError;

/// Seconds since the Unix epoch, as reported by the host clock.
pub type Timestamp = i64;

/// Amount of the settlement currency, in atomic units.
pub type CurrencyAmount = i64;

/// AccountId - validated compact account name
///
/// Account names use the host alphabet: 1-12 characters drawn from
/// `a-z`, `1-5`, and `.`, not ending in `.`. Deposit memos are parsed into
/// this type, so validation lives here rather than at the edges.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create a validated account id
    pub fn new(name: &str) -> Result<Self, CisternError> {
        Self::validate(name)?;
        Ok(Self(name.to_string()))
    }

    /// Wrap a compile-time name without the fallible path
    ///
    /// For literals that are valid by inspection, such as built-in
    /// configuration defaults. External input goes through
    /// [`AccountId::new`].
    pub fn from_static(name: &'static str) -> Self {
        debug_assert!(Self::validate(name).is_ok(), "invalid static account name");
        Self(name.to_string())
    }

    /// View as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(name: &str) -> Result<(), CisternError> {
        if name.is_empty() || name.len() > constants::MAX_ACCOUNT_NAME_LEN {
            return Err(CisternError::InvalidInput(format!(
                "account name '{}' must be 1-{} characters",
                name,
                constants::MAX_ACCOUNT_NAME_LEN
            )));
        }
        if !name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || (b'1'..=b'5').contains(&b) || b == b'.')
        {
            return Err(CisternError::InvalidInput(format!(
                "account name '{name}' contains characters outside a-z, 1-5, and '.'"
            )));
        }
        if name.ends_with('.') {
            return Err(CisternError::InvalidInput(format!(
                "account name '{name}' must not end with '.'"
            )));
        }
        Ok(())
    }
}

impl FromStr for AccountId {
    type Err = CisternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// DropId - 64-bit identifier of a drop
///
/// Derived from the first eight bytes of a SHA-256 digest (see [`crate::seed`])
/// and rendered in decimal everywhere.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct DropId(u64);

impl DropId {
    /// Wrap a raw 64-bit id
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw 64-bit value
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for DropId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Debug for DropId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DropId({})", self.0)
    }
}

impl fmt::Display for DropId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two balances carried per account row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    /// Count of drops owned
    Drops,
    /// Resource bytes available for minting
    ResourceBytes,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Drops => write!(f, "drops"),
            AssetKind::ResourceBytes => write!(f, "resource bytes"),
        }
    }
}

/// System constants
pub mod constants {
    /// Storage footprint of a drop's primary row, in resource bytes
    pub const DROP_ROW_BYTES: i64 = 145;

    /// Storage footprint of a drop's owner-index entry, in resource bytes
    pub const DROP_INDEX_BYTES: i64 = 132;

    /// Default resource charge per unbound drop (row plus index)
    pub const DEFAULT_UNITS_PER_DROP: i64 = DROP_ROW_BYTES + DROP_INDEX_BYTES;

    /// Minimum entropy length accepted by generate
    pub const MIN_ENTROPY_LEN: usize = 32;

    /// Longest account name the host alphabet allows
    pub const MAX_ACCOUNT_NAME_LEN: usize = 12;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_accepts_valid_names() {
        for name in ["alice", "drops.sys", "a", "abc123", "x.y.z", "name12345234"] {
            assert!(AccountId::new(name).is_ok(), "rejected {name}");
        }
    }

    #[test]
    fn test_account_id_rejects_invalid_names() {
        for name in [
            "",
            "Alice",
            "alice0",
            "alice_",
            "toolonganame-x",
            "trailingdot.",
            "with space",
            "678",
        ] {
            assert!(AccountId::new(name).is_err(), "accepted {name}");
        }
    }

    #[test]
    fn test_account_id_display_roundtrip() {
        let id = AccountId::new("alice").unwrap();
        assert_eq!(id.to_string(), "alice");
        assert_eq!("alice".parse::<AccountId>().unwrap(), id);
    }

    #[test]
    fn test_drop_id_decimal_display() {
        let id = DropId::new(5760566682885896338);
        assert_eq!(id.to_string(), "5760566682885896338");
        assert_eq!(format!("{id:?}"), "DropId(5760566682885896338)");
    }

    #[test]
    fn test_drop_id_ordering_is_numeric() {
        assert!(DropId::new(9) < DropId::new(10));
        assert_eq!(DropId::from(7).value(), 7);
    }

    #[test]
    fn test_default_units_per_drop() {
        assert_eq!(constants::DEFAULT_UNITS_PER_DROP, 277);
    }
}
