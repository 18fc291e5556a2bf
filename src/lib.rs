//! Rebate
//!
//! Rebate is a coupon discount engine: it validates coupon codes against a cart, decides which
//! of them may stack, and spreads each discount across the eligible line items to the minor unit.

pub mod cart;
pub mod categories;
pub mod cli;
pub mod coupons;
pub mod discounts;
pub mod fixtures;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod receipt;
