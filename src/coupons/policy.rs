//! Coupon Policies
//!
//! Extension points consulted while a coupon is applied.

use std::fmt::Debug;

use crate::{
    cart::{Cart, CartItem},
    coupons::Coupon,
};

/// Hooks that can veto a coupon or exclude individual items from it.
pub trait CouponPolicy: Debug {
    /// Decide whether the coupon may be used on this cart at all.
    ///
    /// # Errors
    ///
    /// Returns the message shown to the customer when the coupon is refused.
    fn can_use(
        &self,
        _coupon: &Coupon<'_>,
        _cart: &Cart<'_>,
        _items: &[CartItem<'_>],
    ) -> Result<(), String> {
        Ok(())
    }

    /// Return true to keep the coupon off an otherwise eligible item.
    fn skip_item(&self, _item: &CartItem<'_>, _coupon: &Coupon<'_>, _cart: &Cart<'_>) -> bool {
        false
    }
}

/// Policy that never intervenes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl CouponPolicy for AllowAll {}
