//! Singleton system state

use serde::{Deserialize, Serialize};

use cistern_core::constants::DEFAULT_UNITS_PER_DROP;
use cistern_core::Timestamp;

/// The singleton state row
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemState {
    /// Set once, at the first enabling
    pub genesis: Option<Timestamp>,

    /// Resource bytes charged per unbound drop, and released per bound one
    pub units_per_drop: i64,

    /// Monotonic salt for id derivation; advances by the batch size on
    /// every mint
    pub sequence: u64,

    /// Kill switch: when false, mutating drop operations and deposits are
    /// rejected (opening rows and claiming out remain possible)
    pub enabled: bool,
}

impl Default for SystemState {
    fn default() -> Self {
        Self {
            genesis: None,
            units_per_drop: DEFAULT_UNITS_PER_DROP,
            sequence: 0,
            enabled: false,
        }
    }
}

impl SystemState {
    /// Fresh state with a custom per-drop footprint
    pub fn new(units_per_drop: i64) -> Self {
        Self {
            units_per_drop,
            ..Self::default()
        }
    }

    /// Reserve `count` sequence slots, returning the first
    pub fn advance_sequence(&mut self, count: u32) -> u64 {
        let start = self.sequence;
        self.sequence += u64::from(count);
        start
    }
}
