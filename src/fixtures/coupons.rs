//! Coupon Fixtures

use jiff::Timestamp;
use serde::Deserialize;

use crate::{
    categories::Categories,
    coupons::{Coupon, CouponConditions, CouponKey, CouponKind, CouponStatus, EmailRestrictions},
    fixtures::{
        FixtureError,
        products::{parse_money, parse_percentage},
    },
    products::ProductKey,
};

/// Wrapper for coupons in YAML
#[derive(Debug, Deserialize)]
pub struct CouponsFixture {
    /// Coupons, in insertion order
    pub coupons: Vec<CouponFixture>,

    /// Paid redemptions per customer
    #[serde(default)]
    pub redemptions: Vec<RedemptionFixture>,
}

/// Coupon fixture from YAML
#[derive(Debug, Deserialize)]
pub struct CouponFixture {
    /// Code customers enter
    pub code: String,

    /// Display title; defaults to the code
    #[serde(default)]
    pub title: Option<String>,

    /// Discount configuration
    pub discount: DiscountFixtureConfig,

    /// Lifecycle status
    #[serde(default)]
    pub status: StatusFixture,

    /// Whether the coupon combines with other stackable coupons
    #[serde(default)]
    pub stackable: bool,

    /// Lower values are applied first
    #[serde(default)]
    pub priority: i32,

    /// Whether the discount carries onto subscription renewals
    #[serde(default)]
    pub recurring: bool,

    /// Redemptions so far
    #[serde(default)]
    pub use_count: u32,

    /// Start of the validity window (RFC 3339)
    #[serde(default)]
    pub starts_at: Option<Timestamp>,

    /// End of the validity window (RFC 3339)
    #[serde(default)]
    pub ends_at: Option<Timestamp>,

    /// Restrictions
    #[serde(default)]
    pub conditions: ConditionsFixture,
}

/// Discount configuration from YAML
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscountFixtureConfig {
    /// Percentage off (e.g., "15%" or "0.15")
    Percentage {
        /// Percentage string
        value: String,
    },

    /// Fixed amount off (e.g., "10.00 USD")
    Fixed {
        /// Price string
        value: String,
    },
}

impl TryFrom<DiscountFixtureConfig> for CouponKind<'_> {
    type Error = FixtureError;

    fn try_from(config: DiscountFixtureConfig) -> Result<Self, Self::Error> {
        match config {
            DiscountFixtureConfig::Percentage { value } => {
                Ok(CouponKind::Percentage(parse_percentage(&value)?))
            }
            DiscountFixtureConfig::Fixed { value } => Ok(CouponKind::Fixed(parse_money(&value)?)),
        }
    }
}

/// Coupon status from YAML
#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusFixture {
    /// Available for use
    #[default]
    Active,

    /// Disabled
    Inactive,

    /// Not launched yet
    Scheduled,

    /// Campaign over
    Expired,
}

impl From<StatusFixture> for CouponStatus {
    fn from(status: StatusFixture) -> Self {
        match status {
            StatusFixture::Active => CouponStatus::Active,
            StatusFixture::Inactive => CouponStatus::Inactive,
            StatusFixture::Scheduled => CouponStatus::Scheduled,
            StatusFixture::Expired => CouponStatus::Expired,
        }
    }
}

/// Coupon conditions from YAML; product lists hold product fixture keys.
#[derive(Debug, Default, Deserialize)]
pub struct ConditionsFixture {
    /// Only these products may be discounted
    #[serde(default)]
    pub included_products: Vec<String>,

    /// These products are never discounted
    #[serde(default)]
    pub excluded_products: Vec<String>,

    /// Items must be in one of these categories
    #[serde(default)]
    pub included_categories: Vec<String>,

    /// Items in these categories are never discounted
    #[serde(default)]
    pub excluded_categories: Vec<String>,

    /// Comma separated email globs (e.g., "*@example.com, ada@*")
    #[serde(default)]
    pub email_restrictions: Option<String>,

    /// Smallest estimated cart total (e.g., "20.00 USD")
    #[serde(default)]
    pub min_purchase_amount: Option<String>,

    /// Largest estimated cart total
    #[serde(default)]
    pub max_purchase_amount: Option<String>,

    /// Total redemptions allowed
    #[serde(default)]
    pub max_uses: Option<u32>,

    /// Redemptions allowed per customer
    #[serde(default)]
    pub max_per_customer: Option<u32>,
}

impl ConditionsFixture {
    /// Convert to [`CouponConditions`], resolving product keys with `product_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if a product is unknown, an amount cannot be parsed or
    /// an email pattern is invalid.
    pub fn try_into_conditions(
        self,
        product_key: impl Fn(&str) -> Result<ProductKey, FixtureError>,
    ) -> Result<CouponConditions<'static>, FixtureError> {
        let included_products = self
            .included_products
            .iter()
            .map(|key| product_key(key))
            .collect::<Result<_, _>>()?;

        let excluded_products = self
            .excluded_products
            .iter()
            .map(|key| product_key(key))
            .collect::<Result<_, _>>()?;

        let email_restrictions = match self.email_restrictions {
            Some(list) => EmailRestrictions::parse(&list)?,
            None => EmailRestrictions::default(),
        };

        Ok(CouponConditions {
            included_products,
            excluded_products,
            included_categories: Categories::from(self.included_categories),
            excluded_categories: Categories::from(self.excluded_categories),
            email_restrictions,
            min_purchase_amount: self
                .min_purchase_amount
                .as_deref()
                .map(parse_money)
                .transpose()?,
            max_purchase_amount: self
                .max_purchase_amount
                .as_deref()
                .map(parse_money)
                .transpose()?,
            max_uses: self.max_uses,
            max_per_customer: self.max_per_customer,
        })
    }
}

/// Paid redemptions of a coupon by one customer
#[derive(Debug, Deserialize)]
pub struct RedemptionFixture {
    /// Customer id
    pub customer: u64,

    /// Coupon code
    pub code: String,

    /// Number of paid orders that used the code
    #[serde(default = "default_times")]
    pub times: u32,
}

fn default_times() -> u32 {
    1
}

impl CouponFixture {
    /// Convert to a [`Coupon`] stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the discount or conditions are invalid.
    pub fn try_into_coupon(
        self,
        key: CouponKey,
        product_key: impl Fn(&str) -> Result<ProductKey, FixtureError>,
    ) -> Result<Coupon<'static>, FixtureError> {
        let kind = CouponKind::try_from(self.discount)?;
        let conditions = self.conditions.try_into_conditions(product_key)?;
        let title = self.title.unwrap_or_else(|| self.code.clone());

        Ok(Coupon::new(key, self.code, kind)
            .with_title(title)
            .with_status(self.status.into())
            .stackable(self.stackable)
            .with_priority(self.priority)
            .recurring(self.recurring)
            .with_use_count(self.use_count)
            .valid_between(self.starts_at, self.ends_at)
            .with_conditions(conditions))
    }
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use rusty_money::{Money, iso::USD};
    use testresult::TestResult;

    use super::*;

    fn no_products(key: &str) -> Result<ProductKey, FixtureError> {
        Err(FixtureError::ProductNotFound(key.to_string()))
    }

    #[test]
    fn coupon_fixture_parses_full_definition() -> TestResult {
        let fixture: CouponFixture = serde_norway::from_str(
            r#"
code: SPRING
title: Spring sale
discount:
  type: percentage
  value: 15%
status: scheduled
stackable: true
priority: 2
recurring: true
use_count: 3
starts_at: 2025-03-01T00:00:00Z
ends_at: 2025-05-31T23:59:59Z
conditions:
  included_categories: [garden]
  email_restrictions: "*@example.com"
  min_purchase_amount: 20.00 USD
  max_uses: 100
"#,
        )?;

        let coupon = fixture.try_into_coupon(CouponKey::default(), no_products)?;

        assert_eq!(coupon.code(), "SPRING");
        assert_eq!(coupon.title(), "Spring sale");
        assert!(matches!(
            coupon.kind(),
            CouponKind::Percentage(percent) if *percent == Percentage::from(0.15)
        ));
        assert_eq!(coupon.status(), CouponStatus::Scheduled);
        assert!(coupon.is_stackable());
        assert!(coupon.is_recurring());
        assert_eq!(coupon.priority(), 2);
        assert_eq!(coupon.use_count(), 3);
        assert_eq!(coupon.starts_at(), Some("2025-03-01T00:00:00Z".parse()?));

        let conditions = coupon.conditions();

        assert!(conditions.email_restrictions.allows("ada@example.com"));
        assert_eq!(
            conditions.min_purchase_amount,
            Some(Money::from_minor(2_000, USD))
        );
        assert_eq!(conditions.max_uses, Some(100));

        Ok(())
    }

    #[test]
    fn fixed_discount_parses_money() -> TestResult {
        let kind = CouponKind::try_from(DiscountFixtureConfig::Fixed {
            value: "10.00 USD".to_string(),
        })?;

        assert!(matches!(
            kind,
            CouponKind::Fixed(amount) if amount == Money::from_minor(1_000, USD)
        ));

        Ok(())
    }

    #[test]
    fn unknown_product_in_conditions_is_an_error() {
        let fixture = ConditionsFixture {
            included_products: vec!["ghost".to_string()],
            ..ConditionsFixture::default()
        };

        let result = fixture.try_into_conditions(no_products);

        assert!(matches!(result, Err(FixtureError::ProductNotFound(key)) if key == "ghost"));
    }

    #[test]
    fn unknown_discount_type_is_rejected() {
        let result: Result<DiscountFixtureConfig, _> =
            serde_norway::from_str("type: buy_one_get_one\nvalue: 1\n");

        assert!(result.is_err());
    }
}
