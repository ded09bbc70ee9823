//! # Cistern Performance Benchmarks
//!
//! Criterion benchmarks for the hot paths of the drop ledger: id
//! derivation, market quoting, and the engine lifecycle operations.
//!
//! ## Usage
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench --package cistern-benchmarks
//!
//! # Run a specific group
//! cargo bench --package cistern-benchmarks -- derivation
//!
//! # Compare against a saved baseline
//! cargo bench --package cistern-benchmarks -- --save-baseline main
//! ```

use std::sync::Arc;

use cistern_core::{AccountId, ManualClock};
use cistern_engine::{CisternConfig, CisternEngine};
use cistern_market::FixedReserves;

/// Entropy string reused across benchmark runs
pub const BENCH_ENTROPY: &str = "abcdefghijklmnopqrstuvwxyz012345";

/// Reserves deep enough that repeated purchases never drain the pool
pub fn bench_reserves() -> Arc<FixedReserves> {
    Arc::new(FixedReserves::new(10_000_000_000, 5_000_000_000))
}

pub fn alice() -> AccountId {
    AccountId::new("alice").expect("valid account name")
}

/// Enabled engine with alice opened and funded far beyond any batch size
/// the benchmarks mint
pub fn funded_engine() -> CisternEngine {
    let engine = CisternEngine::new(
        CisternConfig::default(),
        bench_reserves(),
        Arc::new(ManualClock::new(1_700_000_000)),
    )
    .expect("engine construction");
    let admin = AccountId::new("cistern").expect("valid account name");
    engine.enable(&admin, true).expect("enable");

    let owner = alice();
    engine.open(&owner, &owner).expect("open");
    engine
        .deposit(&owner, &admin, 100_000_000, "CST", "alice")
        .expect("deposit");
    engine.drain_effects();
    engine
}
