//! Pricing
//!
//! Percentage arithmetic on minor units. Percentages are carried as
//! [`Percentage`] fractions (`0.25` is 25%) but coupon percentages are
//! rounded to two decimal places of percent points, so `12.345%` becomes
//! `12.35%` before any item is touched.

use decimal_percentage::Percentage;
use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Errors that can occur during percentage arithmetic.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum PricingError {
    /// Percentage calculation overflowed or could not be represented in minor units.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,
}

/// Calculate `percent` of `minor`, rounded half away from zero.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] if the product overflows.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, PricingError> {
    let minor = Decimal::from_i64(minor).ok_or(PricingError::PercentConversion)?;

    // `Percentage` doesn't expose its inner decimal, multiplying by one does.
    ((*percent) * Decimal::ONE)
        .checked_mul(minor)
        .ok_or(PricingError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::PercentConversion)
}

/// Converts a fractional percentage to percent points (`0.25` -> `25`).
///
/// Saturates at the bounds of [`Decimal`].
pub fn percent_points(percent: Percentage) -> Decimal {
    (percent * Decimal::ONE).saturating_mul(Decimal::ONE_HUNDRED)
}

/// Clamp a coupon percentage to `0..=100` points and round it to two places.
pub fn clamp_percentage(percent: Percentage) -> Percentage {
    let points = percent_points(percent)
        .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    Percentage::from(points / Decimal::ONE_HUNDRED)
}

/// Express a fixed `amount` as a percentage of `remaining`, rounded to two
/// places of percent points.
///
/// Amounts that cover the whole remainder are 100%.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] if the ratio cannot be represented.
pub fn fixed_amount_percentage(amount: i64, remaining: i64) -> Result<Percentage, PricingError> {
    if amount >= remaining {
        return Ok(Percentage::from(Decimal::ONE));
    }

    let amount = Decimal::from_i64(amount.max(0)).ok_or(PricingError::PercentConversion)?;
    let remaining = Decimal::from_i64(remaining).ok_or(PricingError::PercentConversion)?;

    let points = amount
        .checked_div(remaining)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(PricingError::PercentConversion)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    Ok(Percentage::from(points / Decimal::ONE_HUNDRED))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn percent_of_minor_rounds_half_away_from_zero() -> TestResult {
        assert_eq!(percent_of_minor(&Percentage::from(0.5), 3)?, 2);
        assert_eq!(percent_of_minor(&Percentage::from(0.25), 200)?, 50);
        assert_eq!(percent_of_minor(&Percentage::from(0.1), 1005)?, 101);

        Ok(())
    }

    #[test]
    fn percent_of_minor_overflow_returns_error() {
        let result = percent_of_minor(&Percentage::from(2.0), i64::MAX);

        assert_eq!(result, Err(PricingError::PercentConversion));
    }

    #[test]
    fn clamp_percentage_caps_at_one_hundred() {
        let capped = clamp_percentage(Percentage::from(1.5));
        let floored = clamp_percentage(Percentage::from(-0.2));

        assert_eq!(percent_points(capped), Decimal::ONE_HUNDRED);
        assert_eq!(percent_points(floored), Decimal::ZERO);
    }

    #[test]
    fn clamp_percentage_rounds_to_two_places() {
        let rounded = clamp_percentage(Percentage::from(Decimal::new(12_345, 5)));

        assert_eq!(percent_points(rounded), Decimal::new(1_235, 2));
    }

    #[test]
    fn clamp_percentage_handles_decimal_extremes() {
        let capped = clamp_percentage(Percentage::from(Decimal::MAX));
        let floored = clamp_percentage(Percentage::from(Decimal::MIN));

        assert_eq!(percent_points(capped), Decimal::ONE_HUNDRED);
        assert_eq!(percent_points(floored), Decimal::ZERO);
        assert_eq!(percent_points(Percentage::from(Decimal::MAX)), Decimal::MAX);
    }

    #[test]
    fn fixed_amount_covering_remainder_is_full_discount() -> TestResult {
        let percent = fixed_amount_percentage(5_000, 3_000)?;

        assert_eq!(percent_points(percent), Decimal::ONE_HUNDRED);

        Ok(())
    }

    #[test]
    fn fixed_amount_is_rounded_ratio_of_remainder() -> TestResult {
        // 1000 / 3000 = 33.333...% -> 33.33%
        let percent = fixed_amount_percentage(1_000, 3_000)?;

        assert_eq!(percent_points(percent), Decimal::new(3_333, 2));

        Ok(())
    }
}
