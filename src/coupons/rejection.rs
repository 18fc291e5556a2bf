//! Coupon Rejections

use thiserror::Error;

use crate::pricing::PricingError;

/// Reasons a coupon was not applied to a cart.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CouponRejection {
    /// The validity window has not opened yet.
    #[error("This coupon is not valid yet.")]
    NotStarted,

    /// The validity window has closed.
    #[error("This coupon is no longer valid.")]
    Expired,

    /// The cart total is above the coupon's maximum purchase amount.
    #[error("This coupon is no longer valid.")]
    MaxPurchaseExceeded,

    /// The cart total is below the coupon's minimum purchase amount.
    #[error("This coupon is no longer valid.")]
    MinPurchaseNotMet,

    /// The coupon has been redeemed the maximum number of times.
    #[error("This coupon has reached its maximum number of uses.")]
    MaxUsesExceeded,

    /// The customer has redeemed the coupon the maximum number of times.
    #[error("You have reached the maximum number of uses for this coupon.")]
    MaxPerCustomerExceeded,

    /// The coupon cannot be combined with the other coupons on the cart.
    #[error("This coupon cannot be stacked with other coupons.")]
    NotStackable,

    /// A [`CouponPolicy`](crate::coupons::CouponPolicy) refused the coupon.
    #[error("{0}")]
    CannotBeUsed(String),

    /// No cart item is eligible, or eligible items are already fully discounted.
    #[error("No applicable items found for this coupon.")]
    NoApplicableItems,

    /// The coupon produced a zero discount.
    #[error("This coupon could not apply any discount.")]
    NoDiscountApplied,

    /// A fixed amount or purchase limit is in a different currency to the cart.
    #[error("Coupon is in {coupon}, but cart is in {cart}.")]
    CurrencyMismatch {
        /// Coupon currency code
        coupon: &'static str,

        /// Cart currency code
        cart: &'static str,
    },

    /// Percentage arithmetic failed.
    #[error(transparent)]
    Calculation(#[from] PricingError),
}

impl CouponRejection {
    /// Stable machine-readable code for the rejection.
    pub fn code(&self) -> &'static str {
        match self {
            CouponRejection::NotStarted => "coupon_not_started",
            CouponRejection::Expired => "coupon_expired",
            CouponRejection::MaxPurchaseExceeded => "max_purchase_amount_exceeded",
            CouponRejection::MinPurchaseNotMet => "min_purchase_amount_not_met",
            CouponRejection::MaxUsesExceeded | CouponRejection::MaxPerCustomerExceeded => {
                "coupon_max_uses_exceeded"
            }
            CouponRejection::NotStackable => "coupon_not_stackable",
            CouponRejection::CannotBeUsed(_) => "coupon_cannot_be_used",
            CouponRejection::NoApplicableItems => "no_applicable_items",
            CouponRejection::NoDiscountApplied => "no_discount_applied",
            CouponRejection::CurrencyMismatch { .. } => "currency_mismatch",
            CouponRejection::Calculation(_) => "discount_calculation_failed",
        }
    }
}
