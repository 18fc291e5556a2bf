//! Cart Items

use rusty_money::{Money, iso::Currency};

use crate::{categories::Categories, products::ProductKey};

/// How a line item is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PaymentType<'a> {
    /// Single payment.
    #[default]
    OneTime,

    /// Recurring payment, optionally with a free trial and a signup fee.
    Subscription {
        /// Days of free trial before the first renewal is charged.
        trial_days: u32,

        /// Fee charged per unit at signup.
        signup_fee: Money<'a, Currency>,
    },
}

impl PaymentType<'_> {
    /// Returns true for subscriptions.
    pub fn is_subscription(&self) -> bool {
        matches!(self, PaymentType::Subscription { .. })
    }

    /// Returns true for subscriptions with a free trial.
    pub fn has_trial(&self) -> bool {
        matches!(self, PaymentType::Subscription { trial_days, .. } if *trial_days > 0)
    }
}

/// Discounts carried onto subscription renewals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecurringDiscounts<'a> {
    /// Discount on the signup fee.
    pub signup: Money<'a, Currency>,

    /// Discount on each renewal payment.
    pub amount: Money<'a, Currency>,
}

impl<'a> RecurringDiscounts<'a> {
    /// No recurring discount, in the given currency.
    pub fn zero(currency: &'a Currency) -> Self {
        Self {
            signup: Money::from_minor(0, currency),
            amount: Money::from_minor(0, currency),
        }
    }
}

/// A single cart line.
///
/// Monetary fields are held in minor units alongside the line currency; the
/// coupon fields are maintained by [`DiscountService`](crate::discounts::DiscountService).
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem<'a> {
    product: ProductKey,
    name: String,
    categories: Categories,
    quantity: u32,
    currency: &'a Currency,
    unit_price: i64,
    subtotal: i64,
    manual_discount: i64,
    manual_discount_currency: &'a Currency,
    coupon_discount: i64,
    discount_total: i64,
    line_total: i64,
    payment: PaymentType<'a>,
    locked: bool,
    recurring_discounts: Option<RecurringDiscounts<'a>>,
}

impl<'a> CartItem<'a> {
    /// Creates a one-time line of `quantity` units at `unit_price`.
    pub fn new(
        product: ProductKey,
        name: impl Into<String>,
        unit_price: Money<'a, Currency>,
        quantity: u32,
    ) -> Self {
        let unit_minor = unit_price.to_minor_units();
        let subtotal = unit_minor.saturating_mul(i64::from(quantity));

        Self {
            product,
            name: name.into(),
            categories: Categories::empty(),
            quantity,
            currency: unit_price.currency(),
            unit_price: unit_minor,
            subtotal,
            manual_discount: 0,
            manual_discount_currency: unit_price.currency(),
            coupon_discount: 0,
            discount_total: 0,
            line_total: subtotal,
            payment: PaymentType::OneTime,
            locked: false,
            recurring_discounts: None,
        }
    }

    /// Sets the item categories.
    #[must_use]
    pub fn with_categories(mut self, categories: Categories) -> Self {
        self.categories = categories;
        self
    }

    /// Sets a manual (non-coupon) discount on the line.
    #[must_use]
    pub fn with_manual_discount(mut self, discount: Money<'a, Currency>) -> Self {
        self.manual_discount = discount.to_minor_units().max(0);
        self.manual_discount_currency = discount.currency();
        self.discount_total = self.manual_discount;
        self.line_total = (self.subtotal - self.discount_total).max(0);
        self
    }

    /// Sets the payment type.
    #[must_use]
    pub fn with_payment(mut self, payment: PaymentType<'a>) -> Self {
        self.payment = payment;
        self
    }

    /// Marks the line as locked; locked lines never receive coupon discounts.
    #[must_use]
    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Returns the product of the line.
    pub fn product(&self) -> ProductKey {
        self.product
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the categories.
    pub fn categories(&self) -> &Categories {
        &self.categories
    }

    /// Returns the quantity.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns the line currency.
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }

    /// Returns the unit price.
    pub fn unit_price(&self) -> Money<'a, Currency> {
        self.money(self.unit_price)
    }

    /// Returns the undiscounted line subtotal.
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.money(self.subtotal)
    }

    /// Returns the manual discount.
    pub fn manual_discount(&self) -> Money<'a, Currency> {
        self.money(self.manual_discount)
    }

    /// Returns the discount contributed by coupons.
    pub fn coupon_discount(&self) -> Money<'a, Currency> {
        self.money(self.coupon_discount)
    }

    /// Returns manual plus coupon discount.
    pub fn discount_total(&self) -> Money<'a, Currency> {
        self.money(self.discount_total)
    }

    /// Returns the amount charged for the line.
    pub fn line_total(&self) -> Money<'a, Currency> {
        self.money(self.line_total)
    }

    /// Currencies of every amount on the line: unit price, manual discount
    /// and signup fee.
    pub fn currencies(&self) -> impl Iterator<Item = &'a Currency> {
        let signup_fee = match self.payment {
            PaymentType::Subscription { signup_fee, .. } => Some(signup_fee.currency()),
            PaymentType::OneTime => None,
        };

        [Some(self.currency), Some(self.manual_discount_currency), signup_fee]
            .into_iter()
            .flatten()
    }

    /// Returns the payment type.
    pub fn payment(&self) -> &PaymentType<'a> {
        &self.payment
    }

    /// Returns true if the line is locked.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Returns the renewal discounts, present only for discounted subscriptions.
    pub fn recurring_discounts(&self) -> Option<&RecurringDiscounts<'a>> {
        self.recurring_discounts.as_ref()
    }

    /// Returns the subtotal coupons are measured against.
    ///
    /// Subscriptions in a free trial are charged only their signup fee today,
    /// so that is what a coupon can discount.
    pub fn effective_subtotal(&self) -> Money<'a, Currency> {
        self.money(self.effective_subtotal_minor())
    }

    pub(crate) fn effective_subtotal_minor(&self) -> i64 {
        match self.payment {
            PaymentType::Subscription {
                trial_days,
                signup_fee,
            } if trial_days > 0 => signup_fee
                .to_minor_units()
                .saturating_mul(i64::from(self.quantity.max(1))),
            _ => self.subtotal,
        }
    }

    pub(crate) fn unit_price_minor(&self) -> i64 {
        self.unit_price
    }

    pub(crate) fn coupon_discount_minor(&self) -> i64 {
        self.coupon_discount
    }

    pub(crate) fn set_coupon_discount_minor(&mut self, discount: i64) {
        self.coupon_discount = discount;
    }

    pub(crate) fn recurring_discounts_mut(&mut self) -> &mut RecurringDiscounts<'a> {
        let currency = self.currency;

        self.recurring_discounts
            .get_or_insert_with(|| RecurringDiscounts::zero(currency))
    }

    /// Drops every coupon effect from the line.
    pub(crate) fn reset_coupon_discount(&mut self) {
        self.discount_total = self.manual_discount;
        self.coupon_discount = 0;
        self.line_total = self.subtotal - self.discount_total;
        self.recurring_discounts = None;
    }

    /// Recomputes `discount_total` and `line_total` from the discounts.
    pub(crate) fn update_totals(&mut self) {
        self.discount_total = self.manual_discount + self.coupon_discount;
        self.line_total = (self.effective_subtotal_minor() - self.discount_total).max(0);
    }

    fn money(&self, minor: i64) -> Money<'a, Currency> {
        Money::from_minor(minor, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;

    use super::*;

    fn subscription<'a>(trial_days: u32, signup_fee: i64) -> PaymentType<'a> {
        PaymentType::Subscription {
            trial_days,
            signup_fee: Money::from_minor(signup_fee, USD),
        }
    }

    #[test]
    fn new_computes_subtotal_from_quantity() {
        let item = CartItem::new(ProductKey::default(), "Mug", Money::from_minor(1_250, USD), 3);

        assert_eq!(item.subtotal(), Money::from_minor(3_750, USD));
        assert_eq!(item.line_total(), Money::from_minor(3_750, USD));
        assert_eq!(item.discount_total(), Money::from_minor(0, USD));
    }

    #[test]
    fn manual_discount_reduces_line_total() {
        let item = CartItem::new(ProductKey::default(), "Mug", Money::from_minor(1_000, USD), 1)
            .with_manual_discount(Money::from_minor(150, USD));

        assert_eq!(item.discount_total(), Money::from_minor(150, USD));
        assert_eq!(item.line_total(), Money::from_minor(850, USD));
    }

    #[test]
    fn trial_subscription_uses_signup_fee_per_unit() {
        let item = CartItem::new(ProductKey::default(), "Plan", Money::from_minor(2_000, USD), 2)
            .with_payment(subscription(14, 500));

        assert!(item.payment().has_trial());
        assert_eq!(item.effective_subtotal(), Money::from_minor(1_000, USD));
    }

    #[test]
    fn subscription_without_trial_uses_subtotal() {
        let item = CartItem::new(ProductKey::default(), "Plan", Money::from_minor(2_000, USD), 1)
            .with_payment(subscription(0, 500));

        assert!(item.payment().is_subscription());
        assert!(!item.payment().has_trial());
        assert_eq!(item.effective_subtotal(), Money::from_minor(2_000, USD));
    }

    #[test]
    fn reset_clears_coupon_effects() {
        let mut item = CartItem::new(ProductKey::default(), "Plan", Money::from_minor(2_000, USD), 1)
            .with_manual_discount(Money::from_minor(100, USD))
            .with_payment(subscription(0, 0));

        item.set_coupon_discount_minor(400);
        item.recurring_discounts_mut().amount = Money::from_minor(400, USD);
        item.update_totals();

        assert_eq!(item.discount_total(), Money::from_minor(500, USD));
        assert_eq!(item.line_total(), Money::from_minor(1_500, USD));

        item.reset_coupon_discount();

        assert_eq!(item.coupon_discount(), Money::from_minor(0, USD));
        assert_eq!(item.discount_total(), Money::from_minor(100, USD));
        assert_eq!(item.line_total(), Money::from_minor(1_900, USD));
        assert!(item.recurring_discounts().is_none());
    }
}
