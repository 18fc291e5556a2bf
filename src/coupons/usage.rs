//! Coupon Usage

use std::fmt::Debug;

use rustc_hash::FxHashMap;

use crate::{cart::CustomerId, coupons::CouponKey};

/// Source of per-customer redemption counts.
pub trait UsageLedger: Debug {
    /// Number of successfully paid orders in which `customer` redeemed `coupon`.
    fn times_used(&self, customer: CustomerId, coupon: CouponKey) -> u32;
}

/// Ledger with no recorded redemptions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUsage;

impl UsageLedger for NoUsage {
    fn times_used(&self, _customer: CustomerId, _coupon: CouponKey) -> u32 {
        0
    }
}

/// In-memory redemption counts.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUsageLedger {
    redemptions: FxHashMap<(CustomerId, CouponKey), u32>,
}

impl InMemoryUsageLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one paid redemption.
    pub fn record(&mut self, customer: CustomerId, coupon: CouponKey) {
        *self.redemptions.entry((customer, coupon)).or_default() += 1;
    }
}

impl UsageLedger for InMemoryUsageLedger {
    fn times_used(&self, customer: CustomerId, coupon: CouponKey) -> u32 {
        self.redemptions
            .get(&(customer, coupon))
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_ledger_counts_per_customer() {
        let mut ledger = InMemoryUsageLedger::new();
        let coupon = CouponKey::default();

        ledger.record(CustomerId(1), coupon);
        ledger.record(CustomerId(1), coupon);
        ledger.record(CustomerId(2), coupon);

        assert_eq!(ledger.times_used(CustomerId(1), coupon), 2);
        assert_eq!(ledger.times_used(CustomerId(2), coupon), 1);
        assert_eq!(ledger.times_used(CustomerId(3), coupon), 0);
        assert_eq!(NoUsage.times_used(CustomerId(1), coupon), 0);
    }
}
