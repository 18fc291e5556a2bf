//! Discount Allocation
//!
//! Spreads one coupon's discount over the eligible items and, for fixed
//! coupons, moves the rounding remainder so the coupon grants exactly its face
//! value.

use decimal_percentage::Percentage;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tracing::debug;

use crate::{
    cart::CartItem,
    coupons::{Coupon, CouponKind, CouponRejection},
    discounts::eligibility::EligibleItems,
    pricing::{PricingError, clamp_percentage, fixed_amount_percentage, percent_of_minor},
};

/// One coupon's contribution to each eligible item, in minor units.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Allocation {
    shares: SmallVec<[(usize, i64); 8]>,
}

impl Allocation {
    /// Total discount granted by the coupon.
    pub(crate) fn total(&self) -> i64 {
        self.shares
            .iter()
            .fold(0_i64, |total, (_, share)| total.saturating_add(*share))
    }

    #[cfg(test)]
    pub(crate) fn share(&self, item_idx: usize) -> Option<i64> {
        self.shares
            .iter()
            .find(|(idx, _)| *idx == item_idx)
            .map(|(_, share)| *share)
    }
}

/// The percentage a coupon takes off the `remaining` eligible total.
///
/// # Errors
///
/// Returns a [`CouponRejection`] if a fixed amount is in another currency or
/// the ratio cannot be represented.
pub(crate) fn discount_percentage(
    coupon: &Coupon<'_>,
    remaining: i64,
    currency: &Currency,
) -> Result<Percentage, CouponRejection> {
    match coupon.kind() {
        CouponKind::Percentage(percent) => Ok(clamp_percentage(*percent)),
        CouponKind::Fixed(amount) => {
            if amount.currency() != currency {
                return Err(CouponRejection::CurrencyMismatch {
                    coupon: amount.currency().iso_alpha_code,
                    cart: currency.iso_alpha_code,
                });
            }

            Ok(fixed_amount_percentage(amount.to_minor_units(), remaining)?)
        }
    }
}

/// Take `percent` off what remains of each eligible item, on top of any
/// earlier coupon discount.
///
/// Non-trial subscriptions always receive a recurring discount record; a
/// recurring coupon also discounts the renewal price by the same percentage.
///
/// # Errors
///
/// Returns a [`PricingError`] if the percentage arithmetic overflows.
pub(crate) fn distribute(
    items: &mut [CartItem<'_>],
    eligible: &EligibleItems,
    percent: &Percentage,
    recurring: bool,
) -> Result<Allocation, PricingError> {
    let mut allocation = Allocation::default();

    for &idx in eligible {
        let Some(item) = items.get_mut(idx) else {
            continue;
        };

        let existing = item.coupon_discount_minor();
        let subtotal = item.effective_subtotal_minor();
        let remaining = (subtotal - existing).max(0);

        let current = percent_of_minor(percent, remaining)?;
        let discount = (existing + current).min(subtotal);
        let share = (discount - existing).max(0);

        item.set_coupon_discount_minor(discount);
        allocation.shares.push((idx, share));

        if item.payment().is_subscription() && !item.payment().has_trial() {
            apply_recurring(item, percent, recurring)?;
        }

        debug!(item_idx = idx, existing, share, discount, "allocated coupon share");
    }

    Ok(allocation)
}

fn apply_recurring(
    item: &mut CartItem<'_>,
    percent: &Percentage,
    recurring: bool,
) -> Result<(), PricingError> {
    let unit_price = item.unit_price_minor();
    let currency = item.currency();
    let recurring_discounts = item.recurring_discounts_mut();

    if !recurring || unit_price <= 0 {
        return Ok(());
    }

    let previous = recurring_discounts.amount.to_minor_units();
    let remaining = (unit_price - previous).max(0);
    let discount = percent_of_minor(percent, remaining)?;
    let total = (previous + discount).min(unit_price);

    recurring_discounts.amount = Money::from_minor(total, currency);

    Ok(())
}

/// Shift single minor units between items until a fixed coupon's total
/// equals its face value.
///
/// A shortfall is added in item order, limited by each item's remaining
/// headroom. An overshoot is taken back in item order, never more than this
/// coupon contributed to the item.
pub(crate) fn reconcile_fixed(items: &mut [CartItem<'_>], allocation: &mut Allocation, face_value: i64) {
    let total = allocation.total();

    if total < face_value {
        let mut shortfall = face_value - total;

        for (idx, share) in &mut allocation.shares {
            if shortfall <= 0 {
                break;
            }

            let Some(item) = items.get_mut(*idx) else {
                continue;
            };

            let headroom = item.effective_subtotal_minor() - item.coupon_discount_minor();
            if headroom <= 0 {
                continue;
            }

            let added = headroom.min(shortfall);

            item.set_coupon_discount_minor(item.coupon_discount_minor() + added);
            *share += added;
            shortfall -= added;
        }
    } else if total > face_value {
        let mut excess = total - face_value;

        for (idx, share) in &mut allocation.shares {
            if excess <= 0 {
                break;
            }

            if *share <= 0 {
                continue;
            }

            let Some(item) = items.get_mut(*idx) else {
                continue;
            };

            let removed = (*share).min(excess);

            item.set_coupon_discount_minor(item.coupon_discount_minor() - removed);
            *share -= removed;
            excess -= removed;
        }
    }

    debug!(
        face_value,
        before = total,
        after = allocation.total(),
        "reconciled fixed coupon"
    );
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, USD};
    use smallvec::smallvec;
    use testresult::TestResult;

    use crate::{cart::PaymentType, coupons::CouponKey, products::ProductKey};

    use super::*;

    fn item(price: i64) -> CartItem<'static> {
        CartItem::new(ProductKey::default(), "Item", Money::from_minor(price, USD), 1)
    }

    fn fixed(amount: i64) -> Coupon<'static> {
        Coupon::new(
            CouponKey::default(),
            "FIXED",
            CouponKind::Fixed(Money::from_minor(amount, USD)),
        )
    }

    #[test]
    fn distribute_takes_percentage_of_each_item() -> TestResult {
        let mut items = [item(1_000), item(333)];
        let eligible: EligibleItems = smallvec![0, 1];

        let allocation = distribute(&mut items, &eligible, &Percentage::from(0.1), false)?;

        assert_eq!(allocation.share(0), Some(100));
        assert_eq!(allocation.share(1), Some(33));
        assert_eq!(allocation.total(), 133);

        Ok(())
    }

    #[test]
    fn distribute_builds_on_earlier_discounts() -> TestResult {
        let mut items = [item(1_000)];
        let eligible: EligibleItems = smallvec![0];

        distribute(&mut items, &eligible, &Percentage::from(0.5), false)?;
        let second = distribute(&mut items, &eligible, &Percentage::from(0.5), false)?;

        assert_eq!(second.total(), 250);
        assert_eq!(
            items.first().map(CartItem::coupon_discount),
            Some(Money::from_minor(750, USD))
        );

        Ok(())
    }

    #[test]
    fn distribute_never_exceeds_subtotal() -> TestResult {
        let mut items = [item(999)];
        let eligible: EligibleItems = smallvec![0];

        let allocation = distribute(&mut items, &eligible, &Percentage::from(1.0), false)?;

        assert_eq!(allocation.total(), 999);

        Ok(())
    }

    #[test]
    fn recurring_coupon_discounts_renewals() -> TestResult {
        let subscription = item(2_000).with_payment(PaymentType::Subscription {
            trial_days: 0,
            signup_fee: Money::from_minor(0, USD),
        });

        let mut items = [subscription.clone(), subscription];
        let eligible: EligibleItems = smallvec![0];

        distribute(&mut items, &eligible, &Percentage::from(0.25), true)?;

        let renewal = items
            .first()
            .and_then(CartItem::recurring_discounts)
            .map(|discounts| discounts.amount);

        assert_eq!(renewal, Some(Money::from_minor(500, USD)));

        let mut one_off = [items.get(1).cloned().ok_or("missing item")?];

        distribute(&mut one_off, &eligible, &Percentage::from(0.25), false)?;

        let renewal = one_off
            .first()
            .and_then(CartItem::recurring_discounts)
            .map(|discounts| discounts.amount);

        assert_eq!(renewal, Some(Money::from_minor(0, USD)));

        Ok(())
    }

    #[test]
    fn trial_subscriptions_get_no_recurring_record() -> TestResult {
        let mut items = [item(2_000).with_payment(PaymentType::Subscription {
            trial_days: 7,
            signup_fee: Money::from_minor(400, USD),
        })];
        let eligible: EligibleItems = smallvec![0];

        let allocation = distribute(&mut items, &eligible, &Percentage::from(0.5), true)?;

        assert_eq!(allocation.total(), 200);
        assert!(items.first().and_then(CartItem::recurring_discounts).is_none());

        Ok(())
    }

    #[test]
    fn reconcile_adds_shortfall_in_item_order() -> TestResult {
        // 1000 off 3 x 1000 is 33.33%, which rounds to 333 per item: 999 total.
        let mut items = [item(1_000), item(1_000), item(1_000)];
        let eligible: EligibleItems = smallvec![0, 1, 2];
        let percent = discount_percentage(&fixed(1_000), 3_000, USD)?;

        let mut allocation = distribute(&mut items, &eligible, &percent, false)?;
        assert_eq!(allocation.total(), 999);

        reconcile_fixed(&mut items, &mut allocation, 1_000);

        assert_eq!(allocation.total(), 1_000);
        assert_eq!(allocation.share(0), Some(334));
        assert_eq!(allocation.share(1), Some(333));

        Ok(())
    }

    #[test]
    fn reconcile_removes_overshoot_from_own_share_only() -> TestResult {
        let mut items = [item(1_000), item(1_000)];

        // An earlier coupon already took 100 off the first item.
        if let Some(first) = items.first_mut() {
            first.set_coupon_discount_minor(100);
        }

        let mut allocation = Allocation {
            shares: smallvec![(0, 0), (1, 30)],
        };

        if let Some(second) = items.get_mut(1) {
            second.set_coupon_discount_minor(30);
        }

        reconcile_fixed(&mut items, &mut allocation, 25);

        assert_eq!(allocation.total(), 25);
        assert_eq!(
            items.first().map(CartItem::coupon_discount),
            Some(Money::from_minor(100, USD))
        );
        assert_eq!(
            items.get(1).map(CartItem::coupon_discount),
            Some(Money::from_minor(25, USD))
        );

        Ok(())
    }

    #[test]
    fn reconcile_stops_when_items_are_fully_discounted() -> TestResult {
        let mut items = [item(500)];
        let eligible: EligibleItems = smallvec![0];
        let percent = discount_percentage(&fixed(1_000), 500, USD)?;

        let mut allocation = distribute(&mut items, &eligible, &percent, false)?;
        reconcile_fixed(&mut items, &mut allocation, 1_000);

        assert_eq!(allocation.total(), 500);

        Ok(())
    }

    #[test]
    fn fixed_coupon_in_other_currency_is_rejected() {
        let coupon = Coupon::new(
            CouponKey::default(),
            "POUND",
            CouponKind::Fixed(Money::from_minor(100, GBP)),
        );

        assert!(matches!(
            discount_percentage(&coupon, 1_000, USD),
            Err(CouponRejection::CurrencyMismatch { .. })
        ));
    }
}
