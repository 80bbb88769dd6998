//! Pricing
//!
//! Pickup and delivery totals with the membership discount applied.

use decimal_percentage::Percentage;
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::{
    config::Tariffs,
    discounts::{DiscountError, split_discount},
    waste::RecyclingRequest,
};

/// Errors that can occur while pricing a pickup.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// Multiplying a rate by its quantity overflowed.
    #[error("amount overflowed while pricing")]
    Overflow,

    /// Prices and rates cannot be negative.
    #[error("amount must not be negative, got {0} minor units")]
    NegativeAmount(i64),

    /// Wrapped discount calculation error.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Breakdown of a priced pickup or delivery.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PriceBreakdown<'a> {
    /// Base price multiplied by quantity, before discount
    pub subtotal: Money<'a, Currency>,

    /// Distance multiplied by the per-km rate, before discount
    pub delivery_fee: Money<'a, Currency>,

    /// Total amount removed by the membership discount
    pub discount: Money<'a, Currency>,

    /// Amount payable
    pub total: Money<'a, Currency>,
}

/// Computes pickup totals.
#[derive(Debug, Copy, Clone)]
pub struct PricingCalculator {
    member_discount: Percentage,
}

impl Default for PricingCalculator {
    fn default() -> Self {
        Self::from_tariffs(&Tariffs::default())
    }
}

impl PricingCalculator {
    /// Create a calculator with the given member discount.
    pub fn new(member_discount: Percentage) -> Self {
        Self { member_discount }
    }

    /// Create a calculator using the member discount from `tariffs`.
    pub fn from_tariffs(tariffs: &Tariffs) -> Self {
        Self::new(tariffs.member_discount())
    }

    /// Compute subtotal, delivery fee, discount and total.
    ///
    /// Members get the discount on the subtotal and the delivery fee separately,
    /// each truncated to a whole minor unit.
    ///
    /// # Errors
    ///
    /// - [`PricingError::NegativeAmount`]: the base price or distance rate is below zero.
    /// - [`PricingError::Overflow`]: a multiplication overflowed.
    /// - [`PricingError::Money`]: the base price and distance rate use different currencies.
    /// - [`PricingError::Discount`]: the discount could not be represented in minor units.
    pub fn compute_total<'a>(
        &self,
        base_price_per_unit: Money<'a, Currency>,
        quantity: u32,
        distance_km: u32,
        distance_rate_per_km: Money<'a, Currency>,
        is_member: bool,
    ) -> Result<PriceBreakdown<'a>, PricingError> {
        for amount in [base_price_per_unit, distance_rate_per_km] {
            if amount.to_minor_units() < 0 {
                return Err(PricingError::NegativeAmount(amount.to_minor_units()));
            }
        }

        let subtotal = multiply(base_price_per_unit, quantity)?;
        let delivery_fee = multiply(distance_rate_per_km, distance_km)?;

        if !is_member {
            return Ok(PriceBreakdown {
                subtotal,
                delivery_fee,
                discount: Money::from_minor(0, subtotal.currency()),
                total: subtotal.add(delivery_fee)?,
            });
        }

        let (discounted_subtotal, subtotal_discount) =
            split_discount(&self.member_discount, subtotal)?;
        let (discounted_delivery, delivery_discount) =
            split_discount(&self.member_discount, delivery_fee)?;

        Ok(PriceBreakdown {
            subtotal,
            delivery_fee,
            discount: subtotal_discount.add(delivery_discount)?,
            total: discounted_subtotal.add(discounted_delivery)?,
        })
    }
}

/// Price a pickup request with the waste type's per-kg rate and the delivery tariff.
///
/// # Errors
///
/// Returns a [`PricingError`] if the calculation overflows.
pub fn quote_pickup(
    request: &RecyclingRequest,
    tariffs: &Tariffs,
) -> Result<PriceBreakdown<'static>, PricingError> {
    PricingCalculator::from_tariffs(tariffs).compute_total(
        tariffs.base_price_per_kg(request.waste_type()),
        request.weight_kg(),
        request.distance_km(),
        tariffs.delivery_rate_per_km(),
        request.is_member(),
    )
}

fn multiply(amount: Money<'_, Currency>, quantity: u32) -> Result<Money<'_, Currency>, PricingError> {
    let minor = amount
        .to_minor_units()
        .checked_mul(i64::from(quantity))
        .ok_or(PricingError::Overflow)?;

    Ok(Money::from_minor(minor, amount.currency()))
}
