//! Cart

use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

pub mod item;

pub use item::{CartItem, PaymentType, RecurringDiscounts};

/// Identifier of a known customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CustomerId(pub u64);

/// Discount granted by each applied coupon, in application order.
pub type PerCouponDiscounts<'a> = Vec<(String, Money<'a, Currency>)>;

/// Errors related to cart construction or totals.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// An amount on an item is in another currency than the cart (index, item currency, cart currency).
    #[error("Item {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),

    /// Wrapped money arithmetic error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Data carried from the cart into checkout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutData<'a> {
    /// Discount granted by each applied coupon.
    pub per_coupon_discounts: PerCouponDiscounts<'a>,
}

/// Cart
#[derive(Debug, Clone)]
pub struct Cart<'a> {
    items: Vec<CartItem<'a>>,
    currency: &'a Currency,
    email: Option<String>,
    customer: Option<CustomerId>,
    coupons: Vec<String>,
    checkout_data: CheckoutData<'a>,
}

impl<'a> Cart<'a> {
    /// Create an empty cart.
    pub fn new(currency: &'a Currency) -> Self {
        Cart {
            items: Vec::new(),
            currency,
            email: None,
            customer: None,
            coupons: Vec::new(),
            checkout_data: CheckoutData::default(),
        }
    }

    /// Create a cart with the given items.
    ///
    /// # Errors
    ///
    /// Returns a `CartError` if an item's price, manual discount or signup fee
    /// is in another currency.
    pub fn with_items(
        items: impl Into<Vec<CartItem<'a>>>,
        currency: &'a Currency,
    ) -> Result<Self, CartError> {
        let items = items.into();

        items.iter().enumerate().try_for_each(|(i, item)| {
            match item.currencies().find(|item_currency| *item_currency != currency) {
                Some(item_currency) => Err(CartError::CurrencyMismatch(
                    i,
                    item_currency.iso_alpha_code,
                    currency.iso_alpha_code,
                )),
                None => Ok(()),
            }
        })?;

        Ok(Cart {
            items,
            ..Cart::new(currency)
        })
    }

    /// Set the customer email used for coupon email restrictions.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the customer the cart belongs to.
    #[must_use]
    pub fn with_customer(mut self, customer: CustomerId) -> Self {
        self.customer = Some(customer);
        self
    }

    /// Set the coupon codes already stored on the cart.
    #[must_use]
    pub fn with_coupons<S: Into<String>>(mut self, codes: impl IntoIterator<Item = S>) -> Self {
        self.coupons = codes.into_iter().map(Into::into).collect();
        self
    }

    /// Items in cart order.
    pub fn items(&self) -> &[CartItem<'a>] {
        &self.items
    }

    /// Cart currency.
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }

    /// Customer email, if known.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Customer, if known.
    pub fn customer(&self) -> Option<CustomerId> {
        self.customer
    }

    /// Applied coupon codes.
    pub fn coupons(&self) -> &[String] {
        &self.coupons
    }

    /// Checkout data.
    pub fn checkout_data(&self) -> &CheckoutData<'a> {
        &self.checkout_data
    }

    /// Number of lines in the cart.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of line subtotals before any discount.
    ///
    /// # Errors
    ///
    /// Returns a `CartError` if money arithmetic fails.
    pub fn subtotal(&self) -> Result<Money<'a, Currency>, CartError> {
        let total = self
            .items
            .iter()
            .try_fold(Money::from_minor(0, self.currency), |acc, item| {
                acc.add(item.subtotal())
            })?;

        Ok(total)
    }

    /// Estimated total before coupons: subtotals less manual discounts.
    ///
    /// # Errors
    ///
    /// Returns a `CartError` if money arithmetic fails.
    pub fn estimated_total(&self) -> Result<Money<'a, Currency>, CartError> {
        let total = self
            .items
            .iter()
            .try_fold(Money::from_minor(0, self.currency), |acc, item| {
                acc.add(item.subtotal())?.sub(item.manual_discount())
            })?;

        Ok(total)
    }

    /// Sum of line totals.
    ///
    /// # Errors
    ///
    /// Returns a `CartError` if money arithmetic fails.
    pub fn total(&self) -> Result<Money<'a, Currency>, CartError> {
        let total = self
            .items
            .iter()
            .try_fold(Money::from_minor(0, self.currency), |acc, item| {
                acc.add(item.line_total())
            })?;

        Ok(total)
    }

    pub(crate) fn set_items(&mut self, items: Vec<CartItem<'a>>) {
        self.items = items;
    }

    pub(crate) fn set_coupons(&mut self, codes: Vec<String>) {
        self.coupons = codes;
    }

    pub(crate) fn set_per_coupon_discounts(&mut self, discounts: PerCouponDiscounts<'a>) {
        self.checkout_data.per_coupon_discounts = discounts;
    }
}
