//! Coupon Repositories

use std::fmt::Debug;

use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::coupons::{Coupon, CouponKey};

/// Lookup of coupons by the codes customers enter.
pub trait CouponRepository<'a>: Debug {
    /// Return the coupons whose code is in `codes`, in any order.
    ///
    /// Unknown codes are ignored.
    fn find_by_codes(&self, codes: &[String]) -> Vec<&Coupon<'a>>;
}

/// Coupons held in a slot map with a code index.
#[derive(Debug, Default)]
pub struct InMemoryCouponRepository<'a> {
    coupons: SlotMap<CouponKey, Coupon<'a>>,
    codes: FxHashMap<String, CouponKey>,
}

impl<'a> InMemoryCouponRepository<'a> {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            coupons: SlotMap::with_key(),
            codes: FxHashMap::default(),
        }
    }

    /// Insert a coupon built from its newly assigned key.
    ///
    /// A coupon reusing an existing code replaces it in the code index.
    pub fn insert_with_key(&mut self, f: impl FnOnce(CouponKey) -> Coupon<'a>) -> CouponKey {
        let key = self.coupons.insert_with_key(f);

        if let Some(coupon) = self.coupons.get(key) {
            self.codes.insert(coupon.code().to_string(), key);
        }

        key
    }

    /// Insert a coupon built fallibly from its newly assigned key.
    ///
    /// # Errors
    ///
    /// Returns the builder's error; nothing is inserted in that case.
    pub fn try_insert_with_key<E>(
        &mut self,
        f: impl FnOnce(CouponKey) -> Result<Coupon<'a>, E>,
    ) -> Result<CouponKey, E> {
        let key = self.coupons.try_insert_with_key(f)?;

        if let Some(coupon) = self.coupons.get(key) {
            self.codes.insert(coupon.code().to_string(), key);
        }

        Ok(key)
    }

    /// Get a coupon by key.
    pub fn get(&self, key: CouponKey) -> Option<&Coupon<'a>> {
        self.coupons.get(key)
    }

    /// Get a coupon by code.
    pub fn by_code(&self, code: &str) -> Option<&Coupon<'a>> {
        self.codes.get(code).and_then(|key| self.coupons.get(*key))
    }

    /// Number of coupons stored.
    pub fn len(&self) -> usize {
        self.coupons.len()
    }

    /// Check if the repository is empty.
    pub fn is_empty(&self) -> bool {
        self.coupons.is_empty()
    }
}

impl<'a> CouponRepository<'a> for InMemoryCouponRepository<'a> {
    fn find_by_codes(&self, codes: &[String]) -> Vec<&Coupon<'a>> {
        codes
            .iter()
            .filter_map(|code| self.by_code(code))
            .collect()
    }
}
