//! Cart Fixtures

use rusty_money::{Money, iso::Currency};
use serde::Deserialize;

use crate::{
    cart::PaymentType,
    fixtures::{FixtureError, products::parse_money},
};

/// Cart fixture from YAML
#[derive(Debug, Deserialize)]
pub struct CartFixture {
    /// Customer email used for email restrictions
    #[serde(default)]
    pub email: Option<String>,

    /// Customer id used for per-customer limits
    #[serde(default)]
    pub customer: Option<u64>,

    /// Codes already stored on the cart
    #[serde(default)]
    pub coupons: Vec<String>,

    /// Cart lines, in order
    pub items: Vec<CartItemFixture>,
}

/// Cart line fixture
#[derive(Debug, Deserialize)]
pub struct CartItemFixture {
    /// Product key from the products fixture
    pub product: String,

    /// Units bought
    #[serde(default = "default_quantity")]
    pub quantity: u32,

    /// Price override (e.g., "9.99 USD"); defaults to the product price
    #[serde(default)]
    pub price: Option<String>,

    /// Pre-existing manual discount (e.g., "1.00 USD")
    #[serde(default)]
    pub manual_discount: Option<String>,

    /// Locked lines never receive coupon discounts
    #[serde(default)]
    pub locked: bool,

    /// Subscription terms, if the line renews
    #[serde(default)]
    pub subscription: Option<SubscriptionFixture>,
}

/// Subscription terms for a cart line
#[derive(Debug, Deserialize)]
pub struct SubscriptionFixture {
    /// Free trial length in days
    #[serde(default)]
    pub trial_days: u32,

    /// Signup fee per unit (e.g., "5.00 USD")
    #[serde(default)]
    pub signup_fee: Option<String>,
}

impl SubscriptionFixture {
    /// Convert to a subscription payment in `currency` terms.
    ///
    /// # Errors
    ///
    /// Returns an error if the signup fee cannot be parsed or is not in
    /// `currency`.
    pub fn try_into_payment(
        self,
        currency: &'static Currency,
    ) -> Result<PaymentType<'static>, FixtureError> {
        let signup_fee = match self.signup_fee {
            Some(fee) => parse_money(&fee)?,
            None => Money::from_minor(0, currency),
        };

        if signup_fee.currency() != currency {
            return Err(FixtureError::CurrencyMismatch(
                currency.iso_alpha_code.to_string(),
                signup_fee.currency().iso_alpha_code.to_string(),
            ));
        }

        Ok(PaymentType::Subscription {
            trial_days: self.trial_days,
            signup_fee,
        })
    }
}

fn default_quantity() -> u32 {
    1
}
