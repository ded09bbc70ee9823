//! # Cistern Engine - Drop Ledger Operations
//!
//! The operation surface of the cistern drop ledger. One [`CisternEngine`]
//! owns the system state, balance book and drop registry, and exposes the
//! full lifecycle:
//!
//! - **generate** - mint pseudo-random drops, metered in resource bytes
//! - **transfer** - move unbound drops between accounts
//! - **bind / unbind** - fold a drop's storage cost into the drop, or back out
//! - **destroy** - burn drops and reclaim the unbound footprint
//! - **open / claim** - manage and withdraw the resource byte balance
//! - **deposit** - settle inbound currency transfers into resource bytes
//! - **enable / set_units_per_drop** - administration
//!
//! Mutations the host must perform on the engine's behalf (market trades,
//! currency payouts, notifications) are queued as [`EffectRequest`]s and
//! drained in order after the operation commits.

pub mod config;
pub mod effects;
pub mod engine;
pub mod receipts;
pub mod settlement;

// Re-exports
pub use config::CisternConfig;
pub use effects::EffectRequest;
pub use engine::{CisternEngine, EngineStats};
pub use receipts::{
    BindReceipt, ClaimPayout, ClaimReceipt, DepositOutcome, DestroyReceipt, GenerateReceipt,
    UnbindReceipt,
};
