//! Products

use rusty_money::{Money, iso::Currency};
use slotmap::new_key_type;

use crate::categories::Categories;

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

/// Product
#[derive(Debug, Clone)]
pub struct Product<'a> {
    /// Product name
    pub name: String,

    /// Product categories
    pub categories: Categories,

    /// Product unit price
    pub price: Money<'a, Currency>,
}
