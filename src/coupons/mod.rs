//! Coupons

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use slotmap::new_key_type;

pub mod conditions;
pub mod policy;
pub mod rejection;
pub mod repository;
pub mod usage;
pub mod validation;

pub use conditions::{CouponConditions, EmailRestrictions};
pub use policy::{AllowAll, CouponPolicy};
pub use rejection::CouponRejection;
pub use repository::{CouponRepository, InMemoryCouponRepository};
pub use usage::{InMemoryUsageLedger, NoUsage, UsageLedger};

new_key_type! {
    /// Coupon Key
    pub struct CouponKey;
}

/// How a coupon discounts the items it applies to.
#[derive(Debug, Clone, Copy)]
pub enum CouponKind<'a> {
    /// Take a percentage off every eligible item (e.g. "15% off").
    Percentage(Percentage),

    /// Take a fixed amount off the eligible items, spread in proportion to
    /// their remaining totals (e.g. "$10 off").
    Fixed(Money<'a, Currency>),
}

/// Lifecycle status of a coupon. Only active coupons are ever applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CouponStatus {
    /// Available for use.
    #[default]
    Active,

    /// Disabled by a merchant.
    Inactive,

    /// Waiting for a future launch.
    Scheduled,

    /// Past its campaign.
    Expired,
}

/// A discount code and the rules for applying it.
#[derive(Debug, Clone)]
pub struct Coupon<'a> {
    key: CouponKey,
    code: String,
    title: String,
    kind: CouponKind<'a>,
    status: CouponStatus,
    stackable: bool,
    priority: i32,
    recurring: bool,
    use_count: u32,
    starts_at: Option<Timestamp>,
    ends_at: Option<Timestamp>,
    conditions: CouponConditions<'a>,
}

impl<'a> Coupon<'a> {
    /// Creates an active, non-stackable coupon with no conditions.
    pub fn new(key: CouponKey, code: impl Into<String>, kind: CouponKind<'a>) -> Self {
        let code = code.into();

        Self {
            key,
            title: code.clone(),
            code,
            kind,
            status: CouponStatus::Active,
            stackable: false,
            priority: 0,
            recurring: false,
            use_count: 0,
            starts_at: None,
            ends_at: None,
            conditions: CouponConditions::default(),
        }
    }

    /// Sets the display title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: CouponStatus) -> Self {
        self.status = status;
        self
    }

    /// Allows the coupon to be combined with other stackable coupons.
    #[must_use]
    pub fn stackable(mut self, stackable: bool) -> Self {
        self.stackable = stackable;
        self
    }

    /// Sets the priority; lower values are applied first.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Carries the discount onto subscription renewals.
    #[must_use]
    pub fn recurring(mut self, recurring: bool) -> Self {
        self.recurring = recurring;
        self
    }

    /// Sets how many times the coupon has been redeemed.
    #[must_use]
    pub fn with_use_count(mut self, use_count: u32) -> Self {
        self.use_count = use_count;
        self
    }

    /// Sets the validity window; either end may be open.
    #[must_use]
    pub fn valid_between(mut self, starts_at: Option<Timestamp>, ends_at: Option<Timestamp>) -> Self {
        self.starts_at = starts_at;
        self.ends_at = ends_at;
        self
    }

    /// Sets the conditions.
    #[must_use]
    pub fn with_conditions(mut self, conditions: CouponConditions<'a>) -> Self {
        self.conditions = conditions;
        self
    }

    /// Returns the coupon key.
    pub fn key(&self) -> CouponKey {
        self.key
    }

    /// Returns the code customers enter.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the display title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the discount kind.
    pub fn kind(&self) -> &CouponKind<'a> {
        &self.kind
    }

    /// Returns the status.
    pub fn status(&self) -> CouponStatus {
        self.status
    }

    /// Returns true if the coupon can be stacked.
    pub fn is_stackable(&self) -> bool {
        self.stackable
    }

    /// Returns the priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Returns true if the discount carries onto renewals.
    pub fn is_recurring(&self) -> bool {
        self.recurring
    }

    /// Returns the number of redemptions so far.
    pub fn use_count(&self) -> u32 {
        self.use_count
    }

    /// Returns the start of the validity window.
    pub fn starts_at(&self) -> Option<Timestamp> {
        self.starts_at
    }

    /// Returns the end of the validity window.
    pub fn ends_at(&self) -> Option<Timestamp> {
        self.ends_at
    }

    /// Returns the conditions.
    pub fn conditions(&self) -> &CouponConditions<'a> {
        &self.conditions
    }
}
