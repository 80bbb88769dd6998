//! Tariffs
//!
//! Every rate and constant the calculators use, loadable from YAML.

use std::{fs, path::Path};

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, IDR, USD},
};
use serde::Deserialize;
use thiserror::Error;

use crate::waste::WasteType;

/// Discount applied to member pickups and deliveries, in percent.
pub const MEMBER_DISCOUNT_PERCENT: i64 = 20;

/// Points multiplier for members, in tenths (15 = 1.5x).
pub const MEMBER_POINTS_MULTIPLIER_TENTHS: i64 = 15;

/// Minor currency units spent per purchase point.
pub const PURCHASE_POINTS_UNIT: u32 = 10_000;

/// Delivery charge per kilometre, in minor units.
pub const DELIVERY_RATE_PER_KM: u32 = 2_000;

/// Sample tariffs file matching [`Tariffs::default`].
pub const DEFAULT_TARIFFS_YAML: &str = include_str!("../assets/tariffs.yml");

/// Tariff loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading a tariffs file
    #[error("Failed to read tariffs file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Invalid decimal format
    #[error("Invalid decimal format: {0}")]
    InvalidDecimal(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// A waste type has no rate
    #[error("No rate configured for waste type: {0}")]
    MissingWasteRate(WasteType),

    /// Purchase points unit must be positive
    #[error("Purchase points unit must be greater than zero")]
    ZeroPurchaseUnit,
}

/// Price and points rates for one waste type.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WasteRate {
    /// Collection base price per kilogram, in minor units
    pub base_price_per_kg: u32,

    /// Loyalty points earned per kilogram
    pub points_per_kg: Decimal,
}

/// Centralized rates for pricing and points.
#[derive(Debug, Clone)]
pub struct Tariffs {
    currency: &'static Currency,
    member_discount: Percentage,
    member_points_multiplier: Decimal,
    purchase_points_unit: u32,
    delivery_rate_per_km: u32,
    waste_rates: FxHashMap<WasteType, WasteRate>,
}

impl Default for Tariffs {
    fn default() -> Self {
        let waste_rates = [
            (WasteType::Mixed, 1_500, 5),
            (WasteType::Paper, 2_000, 8),
            (WasteType::Plastic, 3_000, 10),
            (WasteType::Glass, 1_000, 6),
            (WasteType::Metal, 5_000, 12),
            (WasteType::EWaste, 8_000, 15),
        ]
        .into_iter()
        .map(|(waste_type, base_price_per_kg, points_per_kg)| {
            (
                waste_type,
                WasteRate {
                    base_price_per_kg,
                    points_per_kg: Decimal::from(points_per_kg),
                },
            )
        })
        .collect();

        Self {
            currency: IDR,
            member_discount: Percentage::from(Decimal::new(MEMBER_DISCOUNT_PERCENT, 2)),
            member_points_multiplier: Decimal::new(MEMBER_POINTS_MULTIPLIER_TENTHS, 1),
            purchase_points_unit: PURCHASE_POINTS_UNIT,
            delivery_rate_per_km: DELIVERY_RATE_PER_KM,
            waste_rates,
        }
    }
}

impl Tariffs {
    /// Parse tariffs from a YAML document.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the YAML is malformed, a value cannot be parsed,
    /// or a waste type is missing its rate.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let file: TariffsFile = serde_norway::from_str(yaml)?;

        file.try_into()
    }

    /// Load tariffs from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or its contents are invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// Currency every tariff amount is expressed in
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Member discount on pickup subtotals and delivery fees
    pub fn member_discount(&self) -> Percentage {
        self.member_discount
    }

    /// Points multiplier applied for members
    pub fn member_points_multiplier(&self) -> Decimal {
        self.member_points_multiplier
    }

    /// Minor units spent per purchase point
    pub fn purchase_points_unit(&self) -> u32 {
        self.purchase_points_unit
    }

    /// Delivery rate per kilometre
    pub fn delivery_rate_per_km(&self) -> Money<'static, Currency> {
        Money::from_minor(i64::from(self.delivery_rate_per_km), self.currency)
    }

    /// Rates for a waste type.
    ///
    /// Every waste type is guaranteed to have a rate once tariffs are constructed.
    pub fn waste_rate(&self, waste_type: WasteType) -> WasteRate {
        self.waste_rates
            .get(&waste_type)
            .copied()
            .unwrap_or(WasteRate {
                base_price_per_kg: 0,
                points_per_kg: Decimal::ZERO,
            })
    }

    /// Collection base price per kilogram for a waste type
    pub fn base_price_per_kg(&self, waste_type: WasteType) -> Money<'static, Currency> {
        Money::from_minor(
            i64::from(self.waste_rate(waste_type).base_price_per_kg),
            self.currency,
        )
    }
}

/// Raw tariffs file layout.
#[derive(Debug, Deserialize)]
struct TariffsFile {
    currency: String,
    member_discount: String,
    member_points_multiplier: String,
    purchase_points_unit: u32,
    delivery_rate_per_km: u32,
    waste: FxHashMap<WasteType, WasteRateFile>,
}

#[derive(Debug, Deserialize)]
struct WasteRateFile {
    base_price_per_kg: u32,
    points_per_kg: String,
}

impl TryFrom<TariffsFile> for Tariffs {
    type Error = ConfigError;

    fn try_from(file: TariffsFile) -> Result<Self, Self::Error> {
        if file.purchase_points_unit == 0 {
            return Err(ConfigError::ZeroPurchaseUnit);
        }

        let mut waste_rates = FxHashMap::default();

        for waste_type in WasteType::ALL {
            let rate = file
                .waste
                .get(&waste_type)
                .ok_or(ConfigError::MissingWasteRate(waste_type))?;

            waste_rates.insert(
                waste_type,
                WasteRate {
                    base_price_per_kg: rate.base_price_per_kg,
                    points_per_kg: parse_non_negative_decimal(&rate.points_per_kg)?,
                },
            );
        }

        Ok(Self {
            currency: parse_currency(&file.currency)?,
            member_discount: parse_percentage(&file.member_discount)?,
            member_points_multiplier: parse_non_negative_decimal(&file.member_points_multiplier)?,
            purchase_points_unit: file.purchase_points_unit,
            delivery_rate_per_km: file.delivery_rate_per_km,
            waste_rates,
        })
    }
}

/// Parse an ISO currency code supported by the marketplace.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownCurrency`] for unsupported codes.
pub fn parse_currency(code: &str) -> Result<&'static Currency, ConfigError> {
    match code.trim() {
        "IDR" => Ok(IDR),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        "GBP" => Ok(GBP),
        other => Err(ConfigError::UnknownCurrency(other.to_string())),
    }
}

/// Parse percentage string (e.g., "20%" or "0.2") into a `Percentage`
///
/// Values must lie between 0% and 100%.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidPercentage`] if the string cannot be parsed
/// or is out of range.
pub fn parse_percentage(s: &str) -> Result<Percentage, ConfigError> {
    let trimmed = s.trim();

    let fraction = if let Some(percent_str) = trimmed.strip_suffix('%') {
        percent_str
            .trim()
            .parse::<Decimal>()
            .map(|value| value / Decimal::ONE_HUNDRED)
    } else {
        trimmed.parse::<Decimal>()
    }
    .map_err(|_err| ConfigError::InvalidPercentage(s.to_string()))?;

    if fraction < Decimal::ZERO || fraction > Decimal::ONE {
        return Err(ConfigError::InvalidPercentage(s.to_string()));
    }

    Ok(Percentage::from(fraction))
}

fn parse_non_negative_decimal(s: &str) -> Result<Decimal, ConfigError> {
    let value = s
        .trim()
        .parse::<Decimal>()
        .map_err(|_err| ConfigError::InvalidDecimal(s.to_string()))?;

    if value.is_sign_negative() {
        return Err(ConfigError::InvalidDecimal(s.to_string()));
    }

    Ok(value)
}
