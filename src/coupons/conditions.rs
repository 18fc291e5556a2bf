//! Coupon Conditions

use regex::{Regex, RegexBuilder};
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;

use crate::{categories::Categories, products::ProductKey};

/// Restrictions a coupon places on which carts and items it applies to.
///
/// Empty lists and `None` limits impose no restriction.
#[derive(Debug, Clone, Default)]
pub struct CouponConditions<'a> {
    /// Only these products may be discounted.
    pub included_products: SmallVec<[ProductKey; 4]>,

    /// These products are never discounted.
    pub excluded_products: SmallVec<[ProductKey; 4]>,

    /// Items must belong to at least one of these categories.
    pub included_categories: Categories,

    /// Items in any of these categories are never discounted.
    pub excluded_categories: Categories,

    /// Customer emails allowed to use the coupon.
    pub email_restrictions: EmailRestrictions,

    /// Smallest estimated cart total the coupon accepts.
    pub min_purchase_amount: Option<Money<'a, Currency>>,

    /// Largest estimated cart total the coupon accepts.
    pub max_purchase_amount: Option<Money<'a, Currency>>,

    /// Total number of redemptions allowed.
    pub max_uses: Option<u32>,

    /// Number of redemptions allowed per customer.
    pub max_per_customer: Option<u32>,
}

/// A single allowed email pattern.
#[derive(Debug, Clone)]
struct EmailPattern {
    source: String,
    regex: Regex,
}

/// Allow-list of customer emails, where `*` matches any run of characters.
///
/// Matching is case-insensitive and anchored to the whole address, so
/// `*@example.com` admits `Ada@EXAMPLE.com` but not `ada@example.com.evil`.
#[derive(Debug, Clone, Default)]
pub struct EmailRestrictions {
    patterns: Vec<EmailPattern>,
}

impl EmailRestrictions {
    /// Parse a comma separated list of email patterns.
    ///
    /// # Errors
    ///
    /// Returns a [`regex::Error`] if a pattern compiles to an oversized regex.
    pub fn parse(list: &str) -> Result<Self, regex::Error> {
        let patterns = list
            .split(',')
            .map(str::trim)
            .filter(|pattern| !pattern.is_empty())
            .map(|pattern| {
                let glob = regex::escape(pattern).replace(r"\*", ".*");
                let regex = RegexBuilder::new(&format!("^{glob}$"))
                    .case_insensitive(true)
                    .build()?;

                Ok(EmailPattern {
                    source: pattern.to_string(),
                    regex,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self { patterns })
    }

    /// Returns true if no restriction applies.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns true if the email matches any pattern.
    pub fn allows(&self, email: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.regex.is_match(email))
    }

    /// The patterns as written.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|pattern| pattern.source.as_str())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_skips_blank_entries() -> TestResult {
        let restrictions = EmailRestrictions::parse(" ada@example.com, ,*@corp.test ,")?;

        assert_eq!(
            restrictions.patterns().collect::<Vec<_>>(),
            ["ada@example.com", "*@corp.test"]
        );

        Ok(())
    }

    #[test]
    fn exact_match_is_case_insensitive() -> TestResult {
        let restrictions = EmailRestrictions::parse("ada@example.com")?;

        assert!(restrictions.allows("ADA@example.com"));
        assert!(!restrictions.allows("bob@example.com"));

        Ok(())
    }

    #[test]
    fn wildcard_matches_whole_address_only() -> TestResult {
        let restrictions = EmailRestrictions::parse("*@example.com")?;

        assert!(restrictions.allows("anyone@example.com"));
        assert!(!restrictions.allows("anyone@example.com.evil"));
        assert!(!restrictions.allows("anyone@example.org"));

        Ok(())
    }

    #[test]
    fn regex_metacharacters_are_literal() -> TestResult {
        let restrictions = EmailRestrictions::parse("a+b@example.com")?;

        assert!(restrictions.allows("a+b@example.com"));
        assert!(!restrictions.allows("aab@example.com"));

        Ok(())
    }

    #[test]
    fn empty_list_has_no_patterns() -> TestResult {
        assert!(EmailRestrictions::parse("")?.is_empty());
        assert!(EmailRestrictions::default().is_empty());

        Ok(())
    }
}
