//! Coupon Validation
//!
//! Cart-level checks run before a coupon is allowed anywhere near the items.

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};

use crate::{
    cart::CustomerId,
    coupons::{Coupon, CouponRejection, UsageLedger},
};

/// Everything a coupon is validated against.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a, 'l> {
    /// The moment the coupon is being redeemed.
    pub now: Timestamp,

    /// Cart total before coupons.
    pub estimated_total: Money<'a, Currency>,

    /// Customer redeeming the coupon, if known.
    pub customer: Option<CustomerId>,

    /// Redemption history.
    pub usage: &'l dyn UsageLedger,
}

/// Check a coupon's validity window, purchase limits and usage limits.
///
/// # Errors
///
/// Returns the first [`CouponRejection`] that applies, in this order: not
/// started, expired, maximum purchase, minimum purchase, total uses,
/// per-customer uses.
pub fn validate(coupon: &Coupon<'_>, ctx: &ValidationContext<'_, '_>) -> Result<(), CouponRejection> {
    if coupon.starts_at().is_some_and(|starts_at| starts_at > ctx.now) {
        return Err(CouponRejection::NotStarted);
    }

    if coupon.ends_at().is_some_and(|ends_at| ends_at < ctx.now) {
        return Err(CouponRejection::Expired);
    }

    let conditions = coupon.conditions();
    let total = ctx.estimated_total;

    if let Some(max) = conditions.max_purchase_amount {
        ensure_same_currency(&max, &total)?;

        if total.to_minor_units() > max.to_minor_units() {
            return Err(CouponRejection::MaxPurchaseExceeded);
        }
    }

    if let Some(min) = conditions.min_purchase_amount {
        ensure_same_currency(&min, &total)?;

        if total.to_minor_units() < min.to_minor_units() {
            return Err(CouponRejection::MinPurchaseNotMet);
        }
    }

    let use_count = coupon.use_count();

    // A coupon nobody has redeemed yet cannot have hit either limit.
    if use_count == 0 {
        return Ok(());
    }

    if conditions
        .max_uses
        .is_some_and(|max_uses| max_uses > 0 && use_count >= max_uses)
    {
        return Err(CouponRejection::MaxUsesExceeded);
    }

    if let (Some(max_per_customer), Some(customer)) = (conditions.max_per_customer, ctx.customer)
        && max_per_customer > 0
    {
        let used = ctx.usage.times_used(customer, coupon.key());

        if used > 0 && used >= max_per_customer {
            return Err(CouponRejection::MaxPerCustomerExceeded);
        }
    }

    Ok(())
}

fn ensure_same_currency(
    limit: &Money<'_, Currency>,
    total: &Money<'_, Currency>,
) -> Result<(), CouponRejection> {
    if limit.currency() == total.currency() {
        Ok(())
    } else {
        Err(CouponRejection::CurrencyMismatch {
            coupon: limit.currency().iso_alpha_code,
            cart: total.currency().iso_alpha_code,
        })
    }
}
