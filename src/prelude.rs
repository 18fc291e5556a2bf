//! Rebate prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartItem, CheckoutData, CustomerId, PaymentType, RecurringDiscounts},
    categories::Categories,
    coupons::{
        AllowAll, Coupon, CouponConditions, CouponKey, CouponKind, CouponPolicy, CouponRejection,
        CouponRepository, CouponStatus, EmailRestrictions, InMemoryCouponRepository,
        InMemoryUsageLedger, NoUsage, UsageLedger,
    },
    discounts::{CouponResult, DiscountError, DiscountOutcome, DiscountService},
    fixtures::{Fixture, FixtureError},
    pricing::PricingError,
    products::{Product, ProductKey},
    receipt::{Receipt, ReceiptError},
};
