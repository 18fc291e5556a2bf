//! Fixtures
//!
//! YAML fixture sets under `<base>/{products,carts,coupons}/<name>.yml`.

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use slotmap::SlotMap;
use thiserror::Error;

use crate::{
    cart::{Cart, CartError, CartItem, CustomerId},
    coupons::{InMemoryCouponRepository, InMemoryUsageLedger},
    fixtures::{carts::CartFixture, coupons::CouponsFixture, products::ProductsFixture},
    products::{Product, ProductKey},
};

pub mod carts;
pub mod coupons;
pub mod products;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Email restriction could not be compiled
    #[error("Invalid email restriction: {0}")]
    InvalidEmailPattern(#[from] regex::Error),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Coupon not found
    #[error("Coupon not found: {0}")]
    CouponNotFound(String),

    /// Currency mismatch between products
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No products loaded yet
    #[error("No products loaded yet; currency unknown")]
    NoCurrency,

    /// No cart loaded
    #[error("No cart loaded")]
    NoCart,

    /// Cart creation error
    #[error("Failed to create cart: {0}")]
    Cart(#[from] CartError),
}

/// A product catalog, a cart and the coupons that may apply to it.
#[derive(Debug)]
pub struct Fixture<'a> {
    /// Base path for fixture files
    base_path: PathBuf,

    product_meta: SlotMap<ProductKey, Product<'a>>,

    /// Fixture key -> `SlotMap` key
    product_keys: FxHashMap<String, ProductKey>,

    cart: Option<Cart<'a>>,

    coupons: InMemoryCouponRepository<'a>,

    usage: InMemoryUsageLedger,

    /// Currency for the fixture set
    currency: Option<&'static Currency>,
}

impl<'a> Fixture<'a> {
    /// Create a new empty fixture with the default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with a custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            product_meta: SlotMap::with_key(),
            product_keys: FxHashMap::default(),
            cart: None,
            coupons: InMemoryCouponRepository::new(),
            usage: InMemoryUsageLedger::new(),
            currency: None,
        }
    }

    fn read<T: serde::de::DeserializeOwned>(&self, kind: &str, name: &str) -> Result<T, FixtureError> {
        let file_path = self.base_path.join(kind).join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;

        Ok(serde_norway::from_str(&contents)?)
    }

    /// Load products from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if products
    /// are priced in different currencies.
    pub fn load_products(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: ProductsFixture = self.read("products", name)?;

        for (key, product_fixture) in fixture.products {
            let product: Product<'static> = product_fixture.try_into()?;
            let currency = product.price.currency();

            match self.currency {
                Some(existing) if existing != currency => {
                    return Err(FixtureError::CurrencyMismatch(
                        existing.iso_alpha_code.to_string(),
                        currency.iso_alpha_code.to_string(),
                    ));
                }
                Some(_) => {}
                None => self.currency = Some(currency),
            }

            let product_key = self.product_meta.insert(product);

            self.product_keys.insert(key, product_key);
        }

        Ok(self)
    }

    /// Load the cart from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if an item
    /// references an unknown product.
    pub fn load_cart(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let currency = self.currency.ok_or(FixtureError::NoCurrency)?;
        let fixture: CartFixture = self.read("carts", name)?;

        let mut items = Vec::with_capacity(fixture.items.len());

        for item_fixture in fixture.items {
            let product_key = self.product_key(&item_fixture.product)?;
            let product = self.product(&item_fixture.product)?;

            let unit_price = match item_fixture.price.as_deref() {
                Some(price) => products::parse_money(price)?,
                None => product.price,
            };

            let mut item = CartItem::new(product_key, &product.name, unit_price, item_fixture.quantity)
                .with_categories(product.categories.clone())
                .locked(item_fixture.locked);

            if let Some(discount) = item_fixture.manual_discount.as_deref() {
                item = item.with_manual_discount(products::parse_money(discount)?);
            }

            if let Some(subscription) = item_fixture.subscription {
                item = item.with_payment(subscription.try_into_payment(currency)?);
            }

            items.push(item);
        }

        let mut cart = Cart::with_items(items, currency)?.with_coupons(fixture.coupons);

        if let Some(email) = fixture.email {
            cart = cart.with_email(email);
        }

        if let Some(customer) = fixture.customer {
            cart = cart.with_customer(CustomerId(customer));
        }

        self.cart = Some(cart);

        Ok(self)
    }

    /// Load coupons and redemptions from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a coupon
    /// is invalid.
    pub fn load_coupons(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: CouponsFixture = self.read("coupons", name)?;

        for coupon_fixture in fixture.coupons {
            let product_keys = &self.product_keys;

            self.coupons.try_insert_with_key(|key| {
                coupon_fixture.try_into_coupon(key, |product| {
                    product_keys
                        .get(product)
                        .copied()
                        .ok_or_else(|| FixtureError::ProductNotFound(product.to_string()))
                })
            })?;
        }

        for redemption in fixture.redemptions {
            let coupon = self
                .coupons
                .by_code(&redemption.code)
                .ok_or_else(|| FixtureError::CouponNotFound(redemption.code.clone()))?
                .key();

            for _ in 0..redemption.times {
                self.usage.record(CustomerId(redemption.customer), coupon);
            }
        }

        Ok(self)
    }

    /// Load a complete fixture set (products, cart and coupons with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::from_set_in("./fixtures", name)
    }

    /// Load a complete fixture set from `base_path`
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set_in(base_path: impl Into<PathBuf>, name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::with_base_path(base_path);

        fixture
            .load_products(name)?
            .load_cart(name)?
            .load_coupons(name)?;

        Ok(fixture)
    }

    /// Get a product by its fixture key
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product(&self, key: &str) -> Result<&Product<'a>, FixtureError> {
        let product_key = self.product_key(key)?;

        self.product_meta
            .get(product_key)
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// Get a product key by its fixture key
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product_key(&self, key: &str) -> Result<ProductKey, FixtureError> {
        self.product_keys
            .get(key)
            .copied()
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// A fresh copy of the loaded cart
    ///
    /// # Errors
    ///
    /// Returns an error if no cart has been loaded.
    pub fn cart(&self) -> Result<Cart<'a>, FixtureError> {
        self.cart.clone().ok_or(FixtureError::NoCart)
    }

    /// The loaded coupons
    pub fn coupons(&self) -> &InMemoryCouponRepository<'a> {
        &self.coupons
    }

    /// Recorded redemptions
    pub fn usage(&self) -> &InMemoryUsageLedger {
        &self.usage
    }

    /// Get the currency
    ///
    /// # Errors
    ///
    /// Returns an error if no products have been loaded yet.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.currency.ok_or(FixtureError::NoCurrency)
    }

    /// Get the product metadata `SlotMap`
    pub fn product_meta_map(&self) -> &SlotMap<ProductKey, Product<'a>> {
        &self.product_meta
    }
}

impl Default for Fixture<'_> {
    fn default() -> Self {
        Self::new()
    }
}
