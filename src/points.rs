//! Points
//!
//! Loyalty points for recycling pickups and marketplace purchases.

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{config::Tariffs, waste::RecyclingRequest};

/// Errors raised while calculating points.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PointsError {
    /// Rates and amounts must not be negative.
    #[error("cannot award points for a negative amount")]
    Negative,

    /// The points total does not fit in a `u64`.
    #[error("points calculation overflowed")]
    Overflow,
}

/// Computes loyalty points.
#[derive(Debug, Copy, Clone)]
pub struct PointsCalculator {
    member_multiplier: Decimal,
    purchase_points_unit: u32,
}

impl Default for PointsCalculator {
    fn default() -> Self {
        Self::from_tariffs(&Tariffs::default())
    }
}

impl PointsCalculator {
    /// Create a calculator with the given member multiplier and the minor units spent per point.
    pub fn new(member_multiplier: Decimal, purchase_points_unit: u32) -> Self {
        Self {
            member_multiplier,
            purchase_points_unit,
        }
    }

    /// Create a calculator from `tariffs`.
    pub fn from_tariffs(tariffs: &Tariffs) -> Self {
        Self::new(
            tariffs.member_points_multiplier(),
            tariffs.purchase_points_unit(),
        )
    }

    /// Points for recycling `weight_kg` of a waste type earning `points_per_kg`.
    ///
    /// # Errors
    ///
    /// - [`PointsError::Negative`]: `points_per_kg` is negative.
    /// - [`PointsError::Overflow`]: the result does not fit in a `u64`.
    pub fn compute_points(
        &self,
        weight_kg: u32,
        points_per_kg: Decimal,
        is_member: bool,
    ) -> Result<u64, PointsError> {
        if points_per_kg.is_sign_negative() {
            return Err(PointsError::Negative);
        }

        let base = Decimal::from(weight_kg)
            .checked_mul(points_per_kg)
            .ok_or(PointsError::Overflow)?
            .floor();

        self.with_member_bonus(base, is_member)
    }

    /// Points for a marketplace purchase: one point per purchase unit spent.
    ///
    /// # Errors
    ///
    /// - [`PointsError::Negative`]: `total` is negative.
    /// - [`PointsError::Overflow`]: the result does not fit in a `u64`.
    pub fn purchase_points(
        &self,
        total: &Money<'_, Currency>,
        is_member: bool,
    ) -> Result<u64, PointsError> {
        let minor = total.to_minor_units();

        if minor < 0 {
            return Err(PointsError::Negative);
        }

        let base = minor
            .checked_div(i64::from(self.purchase_points_unit))
            .ok_or(PointsError::Overflow)?;

        self.with_member_bonus(Decimal::from(base), is_member)
    }

    /// Points a pickup request would earn once collected.
    ///
    /// # Errors
    ///
    /// Returns a [`PointsError`] if the calculation overflows.
    pub fn pickup_points(
        &self,
        request: &RecyclingRequest,
        tariffs: &Tariffs,
    ) -> Result<u64, PointsError> {
        self.compute_points(
            request.weight_kg(),
            tariffs.waste_rate(request.waste_type()).points_per_kg,
            request.is_member(),
        )
    }

    fn with_member_bonus(&self, base: Decimal, is_member: bool) -> Result<u64, PointsError> {
        let points = if is_member {
            base.checked_mul(self.member_multiplier)
                .ok_or(PointsError::Overflow)?
                .floor()
        } else {
            base
        };

        points.to_u64().ok_or(PointsError::Overflow)
    }
}
