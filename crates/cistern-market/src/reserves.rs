//! Market reserve snapshots
//!
//! Quotes price against the marketplace's two reserve balances, read
//! through the [`ReserveFeed`] seam. The engine holds a shared feed
//! supplied by the host; tests and the CLI pin reserves with
//! [`FixedReserves`].

use serde::{Deserialize, Serialize};

/// Point-in-time reserve balances of the resource marketplace
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveSnapshot {
    /// Resource bytes held by the pool
    pub resource: i64,

    /// Settlement currency held by the pool, in atomic units
    pub currency: i64,
}

impl ReserveSnapshot {
    /// Create a snapshot from raw balances
    pub fn new(resource: i64, currency: i64) -> Self {
        Self { resource, currency }
    }
}

/// Read access to the marketplace reserves
pub trait ReserveFeed: Send + Sync {
    /// Current reserve balances
    fn reserves(&self) -> ReserveSnapshot;
}

/// Feed pinned to constant reserves
#[derive(Clone, Copy, Debug)]
pub struct FixedReserves(ReserveSnapshot);

impl FixedReserves {
    /// Pin the feed at the given balances
    pub fn new(resource: i64, currency: i64) -> Self {
        Self(ReserveSnapshot::new(resource, currency))
    }
}

impl ReserveFeed for FixedReserves {
    fn reserves(&self) -> ReserveSnapshot {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_feed_returns_pinned_snapshot() {
        let feed = FixedReserves::new(1_000_000, 500_000);
        let snap = feed.reserves();
        assert_eq!(snap, ReserveSnapshot::new(1_000_000, 500_000));
    }
}
