//! Discounts
//!
//! Percentage discounts over minor-unit amounts, shared by pickup pricing and the cart.

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

/// Errors specific to discount calculations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,
}

/// Returns the amount left after taking `percent` off `minor`, truncated toward zero.
///
/// Truncating the retained amount means any fractional minor unit is removed in
/// the customer's favour: 20% off 999 retains 799.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the calculation overflows.
pub fn discounted_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let retained = Decimal::ONE
        .checked_sub((*percent) * Decimal::ONE)
        .ok_or(DiscountError::PercentConversion)?;

    retained
        .checked_mul(Decimal::from(minor))
        .ok_or(DiscountError::PercentConversion)?
        .trunc()
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}

/// Splits `amount` into the discounted amount and the amount removed.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the calculation overflows.
pub fn split_discount<'a>(
    percent: &Percentage,
    amount: Money<'a, Currency>,
) -> Result<(Money<'a, Currency>, Money<'a, Currency>), DiscountError> {
    let minor = amount.to_minor_units();
    let kept = discounted_minor(percent, minor)?;
    let removed = minor
        .checked_sub(kept)
        .ok_or(DiscountError::PercentConversion)?;

    Ok((
        Money::from_minor(kept, amount.currency()),
        Money::from_minor(removed, amount.currency()),
    ))
}

/// Build a percentage from a whole-number percent (`20` is 20%).
pub fn whole_percent(percent: u8) -> Percentage {
    Percentage::from(Decimal::from(percent) / Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::IDR;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn discounted_minor_truncates_toward_zero() -> TestResult {
        let percent = whole_percent(20);

        assert_eq!(discounted_minor(&percent, 1_000)?, 800);
        assert_eq!(discounted_minor(&percent, 999)?, 799);
        assert_eq!(discounted_minor(&percent, 1)?, 0);

        Ok(())
    }

    #[test]
    fn zero_and_full_discounts() -> TestResult {
        assert_eq!(discounted_minor(&whole_percent(0), 1_234)?, 1_234);
        assert_eq!(discounted_minor(&whole_percent(100), 1_234)?, 0);

        Ok(())
    }

    #[test]
    fn split_discount_accounts_for_every_unit() -> TestResult {
        let (kept, removed) = split_discount(&whole_percent(15), Money::from_minor(999, IDR))?;

        assert_eq!(kept, Money::from_minor(849, IDR));
        assert_eq!(removed, Money::from_minor(150, IDR));

        Ok(())
    }

    #[test]
    fn discounted_minor_overflow_returns_error() {
        let percent = Percentage::from(Decimal::from(-100_000));
        let result = discounted_minor(&percent, i64::MAX);

        assert_eq!(result, Err(DiscountError::PercentConversion));
    }
}
