//! # Cistern Core
//!
//! Fundamental types for the cistern drop ledger.
//!
//! This crate provides the building blocks shared by every other crate:
//! - `AccountId` / `DropId` - validated identifiers for owners and drops
//! - `CisternError` - the single error surface of the subsystem
//! - `Clock` - wall-clock seam so tests can pin creation timestamps
//! - `seed` - deterministic pseudo-random drop id derivation

pub mod clock;
pub mod error;
pub mod seed;
pub mod types;

pub use clock::*;
pub use error::*;
pub use seed::*;
pub use types::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::error::{CisternError, Result};
    pub use crate::seed::{derive_batch, derive_drop_id};
    pub use crate::types::*;
}
