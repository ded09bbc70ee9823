//! # Cistern Ledger
//!
//! The bookkeeping layer of the drop ledger: who owns what, and how much
//! resource headroom each account has.
//!
//! Three stores make up the layer:
//! - [`BalanceBook`] - per-account drop counts and resource bytes, with a
//!   treasury row that mirrors the sums of all user rows
//! - [`DropRegistry`] - every live drop, keyed by id, with an owner-ordered
//!   secondary index
//! - [`SystemState`] - the singleton holding genesis time, the per-drop
//!   resource footprint, the derivation sequence, and the kill switch
//!
//! Stores are plain single-threaded structures. Locking and cross-store
//! atomicity live one level up, in the engine.

pub mod balances;
pub mod registry;
pub mod state;

pub use balances::*;
pub use registry::*;
pub use state::*;
