//! Discounts
//!
//! [`DiscountService`] applies coupon codes to a cart snapshot. Every call
//! starts from the cart with all coupon effects removed, so applying the same
//! codes twice produces the same items.

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::{Span, debug, info};

use crate::{
    cart::{Cart, CartError, CartItem, CustomerId, PerCouponDiscounts},
    coupons::{
        AllowAll, Coupon, CouponKind, CouponPolicy, CouponRejection, CouponRepository,
        CouponStatus, NoUsage, UsageLedger,
        validation::{ValidationContext, validate},
    },
};

mod allocation;
mod eligibility;

use allocation::{discount_percentage, distribute, reconcile_fixed};
use eligibility::applicable_items;

/// Errors returned when a set of coupon codes cannot be applied at all.
#[derive(Debug, Error, PartialEq)]
pub enum DiscountError {
    /// None of the requested codes resolved to a valid, active coupon.
    #[error("Coupon can not be applied.")]
    NoValidCoupons {
        /// Why each resolved coupon was refused.
        rejections: Vec<(String, CouponRejection)>,
    },

    /// The cart has no stored codes to revalidate.
    #[error("No coupons found to revalidate.")]
    NoCoupons,

    /// Cart totals could not be computed.
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// What happened to one requested coupon.
#[derive(Debug, Clone, PartialEq)]
pub enum CouponResult<'a> {
    /// The coupon was applied and granted `discount` in total.
    Applied {
        /// Total discount across all items.
        discount: Money<'a, Currency>,
    },

    /// The coupon was refused.
    Rejected(CouponRejection),
}

impl CouponResult<'_> {
    /// Returns true if the coupon was applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, CouponResult::Applied { .. })
    }
}

/// Snapshot of the service state after applying coupons.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountOutcome<'a> {
    /// Codes applied, in application order.
    pub applied_codes: Vec<String>,

    /// Per-code results: rejections first, then applied coupons in order.
    pub coupon_results: Vec<(String, CouponResult<'a>)>,

    /// Discounted items.
    pub items: Vec<CartItem<'a>>,

    /// Discount granted by each applied coupon.
    pub per_coupon_discounts: PerCouponDiscounts<'a>,
}

impl<'a> DiscountOutcome<'a> {
    /// Look up the result for a code.
    pub fn coupon_result(&self, code: &str) -> Option<&CouponResult<'a>> {
        self.coupon_results
            .iter()
            .find(|(result_code, _)| result_code == code)
            .map(|(_, result)| result)
    }
}

/// Applies coupons to a cart.
#[derive(Debug)]
pub struct DiscountService<'a, 'r> {
    cart: Cart<'a>,
    items: Vec<CartItem<'a>>,
    repository: &'r dyn CouponRepository<'a>,
    policy: &'r dyn CouponPolicy,
    usage: &'r dyn UsageLedger,
    customer: Option<CustomerId>,
    now: Timestamp,
    applied_coupons: Vec<String>,
    coupon_results: Vec<(String, CouponResult<'a>)>,
    per_coupon_discounts: PerCouponDiscounts<'a>,
}

impl<'a, 'r> DiscountService<'a, 'r> {
    /// Create a service over `cart`, resolving codes through `repository`.
    ///
    /// The customer defaults to the cart's customer and the clock to the
    /// current time.
    pub fn new(cart: Cart<'a>, repository: &'r dyn CouponRepository<'a>) -> Self {
        Self {
            items: cart.items().to_vec(),
            customer: cart.customer(),
            cart,
            repository,
            policy: &AllowAll,
            usage: &NoUsage,
            now: Timestamp::now(),
            applied_coupons: Vec::new(),
            coupon_results: Vec::new(),
            per_coupon_discounts: PerCouponDiscounts::new(),
        }
    }

    /// Use `policy` to veto coupons or skip items.
    #[must_use]
    pub fn with_policy(mut self, policy: &'r dyn CouponPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use `usage` for per-customer redemption limits.
    #[must_use]
    pub fn with_usage_ledger(mut self, usage: &'r dyn UsageLedger) -> Self {
        self.usage = usage;
        self
    }

    /// Validate coupons on behalf of `customer`.
    #[must_use]
    pub fn with_customer(mut self, customer: CustomerId) -> Self {
        self.set_customer(Some(customer));
        self
    }

    /// Replace the customer; `None` falls back to the cart's customer.
    pub fn set_customer(&mut self, customer: Option<CustomerId>) {
        self.customer = customer.or_else(|| self.cart.customer());
    }

    /// Validate coupon windows against `now` instead of the current time.
    #[must_use]
    pub fn at(mut self, now: Timestamp) -> Self {
        self.now = now;
        self
    }

    /// The cart the service was created with, including any saved state.
    pub fn cart(&self) -> &Cart<'a> {
        &self.cart
    }

    /// Working items.
    pub fn items(&self) -> &[CartItem<'a>] {
        &self.items
    }

    /// Discount granted by each applied coupon.
    pub fn per_coupon_discounts(&self) -> &PerCouponDiscounts<'a> {
        &self.per_coupon_discounts
    }

    /// Codes applied so far, in application order.
    pub fn applied_coupons(&self) -> &[String] {
        &self.applied_coupons
    }

    /// Remove every coupon effect from the items and write them to the cart.
    pub fn reset_item_discounts(&mut self) -> &mut Self {
        for item in &mut self.items {
            item.reset_coupon_discount();
        }

        self.cart.set_items(self.items.clone());

        self
    }

    /// Apply the cart's stored codes plus `codes`.
    ///
    /// Codes are trimmed, blanks dropped and duplicates removed, keeping the
    /// first occurrence. When two or more coupons are valid only stackable
    /// ones are kept (or the first, if none stacks); they are then applied
    /// in ascending priority, ties keeping request order.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::NoValidCoupons`] if no requested code resolves
    /// to an active coupon that passes validation.
    #[tracing::instrument(
        name = "discounts.apply_coupon_codes",
        skip_all,
        fields(
            requested = tracing::field::Empty,
            resolved = tracing::field::Empty,
            applied = tracing::field::Empty
        ),
        err(level = "debug")
    )]
    pub fn apply_coupon_codes<S: AsRef<str>>(
        &mut self,
        codes: &[S],
    ) -> Result<DiscountOutcome<'a>, DiscountError> {
        let codes = normalize_codes(
            self.cart
                .coupons()
                .iter()
                .map(String::as_str)
                .chain(codes.iter().map(AsRef::as_ref)),
        );

        let span = Span::current();

        span.record("requested", codes.len());

        let coupons = self.resolve(&codes);

        span.record("resolved", coupons.len());

        if coupons.is_empty() {
            return Err(DiscountError::NoValidCoupons {
                rejections: Vec::new(),
            });
        }

        let ctx = ValidationContext {
            now: self.now,
            estimated_total: self.cart.estimated_total()?,
            customer: self.customer,
            usage: self.usage,
        };

        let mut rejections = Vec::new();
        let mut valid = Vec::new();

        for coupon in coupons {
            match validate(&coupon, &ctx) {
                Ok(()) => valid.push(coupon),
                Err(rejection) => {
                    debug!(code = coupon.code(), reason = rejection.code(), "coupon invalid");
                    rejections.push((coupon.code().to_string(), rejection));
                }
            }
        }

        if valid.is_empty() {
            return Err(DiscountError::NoValidCoupons { rejections });
        }

        let mut valid = enforce_stacking(valid, &mut rejections);

        valid.sort_by_key(Coupon::priority);

        self.reset_item_discounts();
        self.applied_coupons.clear();
        self.per_coupon_discounts.clear();

        let mut results: Vec<_> = rejections
            .into_iter()
            .map(|(code, rejection)| (code, CouponResult::Rejected(rejection)))
            .collect();

        let mut applied = Vec::with_capacity(valid.len());

        for coupon in &valid {
            let code = coupon.code().to_string();

            match self.apply(coupon) {
                Ok(discount) => applied.push((code, CouponResult::Applied { discount })),
                Err(rejection) => {
                    debug!(code, reason = rejection.code(), "coupon not applied");
                    results.push((code, CouponResult::Rejected(rejection)));
                }
            }
        }

        results.extend(applied);

        self.coupon_results = results;

        span.record("applied", self.applied_coupons.len());

        Ok(self.result())
    }

    /// Reapply the codes stored on the cart.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::NoCoupons`] if the cart has no codes, or any
    /// error from [`DiscountService::apply_coupon_codes`].
    pub fn revalidate_coupons(&mut self) -> Result<DiscountOutcome<'a>, DiscountError> {
        if self.cart.coupons().is_empty() {
            return Err(DiscountError::NoCoupons);
        }

        self.apply_coupon_codes::<&str>(&[])
    }

    /// Apply one coupon on top of any discounts already on the items.
    ///
    /// The items are only changed when the coupon grants a discount.
    ///
    /// # Errors
    ///
    /// Returns a [`CouponRejection`] if the policy refuses the coupon, no item
    /// has anything left to discount, or the discount works out to zero.
    #[tracing::instrument(
        name = "discounts.apply",
        skip_all,
        fields(code = coupon.code(), eligible = tracing::field::Empty),
        err(level = "debug")
    )]
    pub fn apply(&mut self, coupon: &Coupon<'a>) -> Result<Money<'a, Currency>, CouponRejection> {
        self.policy
            .can_use(coupon, &self.cart, &self.items)
            .map_err(CouponRejection::CannotBeUsed)?;

        let eligible = applicable_items(&self.items, coupon, &self.cart, self.policy);

        Span::current().record("eligible", eligible.len());

        let (subtotal, existing) = eligible
            .iter()
            .filter_map(|idx| self.items.get(*idx))
            .fold((0_i64, 0_i64), |(subtotal, existing), item| {
                (
                    subtotal.saturating_add(item.effective_subtotal_minor()),
                    existing.saturating_add(item.coupon_discount_minor()),
                )
            });

        let remaining = subtotal - existing;

        if remaining <= 0 {
            return Err(CouponRejection::NoApplicableItems);
        }

        let currency = self.cart.currency();
        let percent = discount_percentage(coupon, remaining, currency)?;

        let mut items = self.items.clone();
        let mut allocation = distribute(&mut items, &eligible, &percent, coupon.is_recurring())?;

        if let CouponKind::Fixed(amount) = coupon.kind() {
            reconcile_fixed(&mut items, &mut allocation, amount.to_minor_units());
        }

        let total = allocation.total();

        if total <= 0 {
            return Err(CouponRejection::NoDiscountApplied);
        }

        for item in &mut items {
            item.update_totals();
        }

        self.items = items;

        let discount = Money::from_minor(total, currency);

        self.applied_coupons.push(coupon.code().to_string());
        self.per_coupon_discounts
            .push((coupon.code().to_string(), discount));

        info!(code = coupon.code(), discount = total, "applied coupon");

        Ok(discount)
    }

    /// Current state of the service.
    pub fn result(&self) -> DiscountOutcome<'a> {
        DiscountOutcome {
            applied_codes: self.applied_coupons.clone(),
            coupon_results: self.coupon_results.clone(),
            items: self.items.clone(),
            per_coupon_discounts: self.per_coupon_discounts.clone(),
        }
    }

    /// Write the items, applied codes and per-coupon discounts to the cart.
    pub fn save_cart(&mut self) -> &Cart<'a> {
        self.cart.set_items(self.items.clone());
        self.cart.set_coupons(self.applied_coupons.clone());
        self.cart
            .set_per_coupon_discounts(self.per_coupon_discounts.clone());

        &self.cart
    }

    /// Save and return the cart.
    pub fn into_cart(mut self) -> Cart<'a> {
        self.save_cart();
        self.cart
    }

    /// Active coupons for `codes`, in the order the codes were given.
    fn resolve(&self, codes: &[String]) -> Vec<Coupon<'a>> {
        let found = self.repository.find_by_codes(codes);

        codes
            .iter()
            .filter_map(|code| {
                let coupon = found.iter().find(|coupon| coupon.code() == code);

                if coupon.is_none() {
                    debug!(code, "unknown coupon code");
                }

                coupon
            })
            .filter(|coupon| coupon.status() == CouponStatus::Active)
            .map(|coupon| (*coupon).clone())
            .collect()
    }
}

/// Trim codes, drop blanks and keep the first of any duplicates.
fn normalize_codes<'c>(codes: impl IntoIterator<Item = &'c str>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();

    for code in codes.into_iter().map(str::trim) {
        if !code.is_empty() && !normalized.iter().any(|seen| seen == code) {
            normalized.push(code.to_string());
        }
    }

    normalized
}

/// With two or more coupons keep only stackable ones, or the first coupon if
/// none stacks. Dropped coupons are recorded as [`CouponRejection::NotStackable`].
fn enforce_stacking<'a>(
    valid: Vec<Coupon<'a>>,
    rejections: &mut Vec<(String, CouponRejection)>,
) -> Vec<Coupon<'a>> {
    if valid.len() < 2 {
        return valid;
    }

    let (stackable, single): (Vec<_>, Vec<_>) = valid.into_iter().partition(Coupon::is_stackable);

    let (kept, dropped) = if stackable.is_empty() {
        let mut single = single.into_iter();

        (single.next().into_iter().collect(), single.collect())
    } else {
        (stackable, single)
    };

    rejections.extend(
        dropped
            .iter()
            .map(|coupon: &Coupon<'a>| (coupon.code().to_string(), CouponRejection::NotStackable)),
    );

    kept
}
