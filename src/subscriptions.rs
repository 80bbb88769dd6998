//! Subscriptions
//!
//! The plan catalog behind the paywall and the billing options it offers.

use std::{fmt, fs, path::Path};

use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use thiserror::Error;

use crate::config::{ConfigError, parse_currency};

/// Plan catalog shipped with the application.
pub const BUILTIN_CATALOG_YAML: &str = include_str!("../assets/plans.yml");

/// Catalog loading and lookup errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading a catalog file
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid catalog currency
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No plan with this id
    #[error("Plan not found: {0}")]
    PlanNotFound(String),

    /// Billing durations are 1, 6 or 12 months
    #[error("Unsupported billing duration: {0} months")]
    UnsupportedDuration(u8),

    /// The plan does not offer this duration
    #[error("Plan {plan} has no {months}-month option")]
    DurationNotOffered {
        /// Plan id
        plan: String,
        /// Requested duration
        months: u8,
    },

    /// Two plans share an id
    #[error("Duplicate plan: {0}")]
    DuplicatePlan(String),

    /// Invalid option data
    #[error("Invalid billing option for plan {plan}: {reason}")]
    InvalidOption {
        /// Plan id
        plan: String,
        /// What is wrong with the option
        reason: &'static str,
    },
}

/// Selectable billing duration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BillingDuration {
    /// Billed every month
    Monthly,

    /// Billed every six months
    HalfYearly,

    /// Billed every year
    Yearly,
}

impl BillingDuration {
    /// Length of the billing period in months.
    pub const fn months(self) -> u8 {
        match self {
            BillingDuration::Monthly => 1,
            BillingDuration::HalfYearly => 6,
            BillingDuration::Yearly => 12,
        }
    }
}

impl TryFrom<u8> for BillingDuration {
    type Error = CatalogError;

    fn try_from(months: u8) -> Result<Self, Self::Error> {
        match months {
            1 => Ok(BillingDuration::Monthly),
            6 => Ok(BillingDuration::HalfYearly),
            12 => Ok(BillingDuration::Yearly),
            other => Err(CatalogError::UnsupportedDuration(other)),
        }
    }
}

impl fmt::Display for BillingDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillingDuration::Monthly => f.write_str("1 month"),
            other => write!(f, "{} months", other.months()),
        }
    }
}

/// A priced billing duration of a plan.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BillingOption {
    /// Billing period
    pub duration: BillingDuration,

    /// Amount charged for the whole period
    pub price: Money<'static, Currency>,

    /// Undiscounted amount for the whole period
    pub original_price: Money<'static, Currency>,

    /// Advertised discount, in whole percent
    pub discount_pct: u8,

    /// Price per month over the period
    pub monthly_equivalent: Money<'static, Currency>,

    /// Whether the paywall highlights this option
    pub best_deal: bool,
}

impl BillingOption {
    /// Months covered by this option
    pub fn duration_months(&self) -> u8 {
        self.duration.months()
    }
}

/// A subscription plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Plan id (e.g. `pro`)
    pub id: String,

    /// Display name
    pub name: String,

    /// Benefits listed on the paywall
    pub benefits: Vec<String>,

    /// Billing options, shortest first
    pub options: Vec<BillingOption>,
}

impl Plan {
    /// Billing option for a duration, if offered.
    pub fn option(&self, duration: BillingDuration) -> Option<&BillingOption> {
        self.options
            .iter()
            .find(|option| option.duration == duration)
    }

    /// The highlighted option, if any.
    pub fn best_deal(&self) -> Option<&BillingOption> {
        self.options.iter().find(|option| option.best_deal)
    }
}

/// Catalog of subscription plans.
#[derive(Debug, Clone)]
pub struct Catalog {
    currency: &'static Currency,
    plans: Vec<Plan>,
}

impl Catalog {
    /// Load the built-in catalog.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the embedded catalog is invalid.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUILTIN_CATALOG_YAML)
    }

    /// Parse a catalog from YAML.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the YAML is malformed or an option is inconsistent.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_norway::from_str(yaml)?;

        file.try_into()
    }

    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the file cannot be read or is invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// Catalog currency
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Plans in display order
    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    /// Look up a plan by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::PlanNotFound`] if no plan has this id.
    pub fn plan(&self, plan_id: &str) -> Result<&Plan, CatalogError> {
        self.plans
            .iter()
            .find(|plan| plan.id == plan_id)
            .ok_or_else(|| CatalogError::PlanNotFound(plan_id.to_string()))
    }

    /// Resolve the billing option for a plan and duration in months.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::PlanNotFound`]: no plan has this id.
    /// - [`CatalogError::UnsupportedDuration`]: `duration_months` is not 1, 6 or 12.
    /// - [`CatalogError::DurationNotOffered`]: the plan does not offer this duration.
    pub fn resolve(&self, plan_id: &str, duration_months: u8) -> Result<BillingOption, CatalogError> {
        let plan = self.plan(plan_id)?;
        let duration = BillingDuration::try_from(duration_months)?;

        plan.option(duration)
            .copied()
            .ok_or_else(|| CatalogError::DurationNotOffered {
                plan: plan_id.to_string(),
                months: duration_months,
            })
    }
}

/// Raw catalog file layout.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    currency: String,
    plans: Vec<PlanFile>,
}

#[derive(Debug, Deserialize)]
struct PlanFile {
    id: String,
    name: String,
    #[serde(default)]
    benefits: Vec<String>,
    options: Vec<OptionFile>,
}

#[derive(Debug, Deserialize)]
struct OptionFile {
    months: u8,
    price: u32,
    original_price: u32,
    discount_pct: u8,
    monthly_equivalent: u32,
    #[serde(default)]
    best_deal: bool,
}

impl TryFrom<CatalogFile> for Catalog {
    type Error = CatalogError;

    fn try_from(file: CatalogFile) -> Result<Self, Self::Error> {
        let currency = parse_currency(&file.currency)?;
        let mut plans: Vec<Plan> = Vec::with_capacity(file.plans.len());

        for plan in file.plans {
            if plans.iter().any(|existing| existing.id == plan.id) {
                return Err(CatalogError::DuplicatePlan(plan.id));
            }

            let mut options: Vec<BillingOption> = Vec::with_capacity(plan.options.len());

            for option in plan.options {
                let invalid = |reason| CatalogError::InvalidOption {
                    plan: plan.id.clone(),
                    reason,
                };

                let duration = BillingDuration::try_from(option.months)?;

                if options.iter().any(|existing| existing.duration == duration) {
                    return Err(invalid("duration listed twice"));
                }

                if option.price > option.original_price {
                    return Err(invalid("price exceeds original price"));
                }

                if option.discount_pct > 100 {
                    return Err(invalid("discount above 100%"));
                }

                if option.best_deal && options.iter().any(|existing| existing.best_deal) {
                    return Err(invalid("more than one best deal"));
                }

                options.push(BillingOption {
                    duration,
                    price: Money::from_minor(i64::from(option.price), currency),
                    original_price: Money::from_minor(i64::from(option.original_price), currency),
                    discount_pct: option.discount_pct,
                    monthly_equivalent: Money::from_minor(
                        i64::from(option.monthly_equivalent),
                        currency,
                    ),
                    best_deal: option.best_deal,
                });
            }

            options.sort_by_key(|option| option.duration);

            plans.push(Plan {
                id: plan.id,
                name: plan.name,
                benefits: plan.benefits,
                options,
            });
        }

        Ok(Self { currency, plans })
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::IDR;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn builtin_catalog_loads() -> TestResult {
        let catalog = Catalog::builtin()?;

        assert_eq!(catalog.currency(), IDR);
        assert_eq!(
            catalog.plans().iter().map(|plan| plan.id.as_str()).collect::<Vec<_>>(),
            ["basic", "pro"]
        );

        Ok(())
    }

    #[test]
    fn yearly_pro_is_discounted() -> TestResult {
        let catalog = Catalog::builtin()?;

        let yearly = catalog.resolve("pro", 12)?;
        let monthly = catalog.resolve("pro", 1)?;

        assert_eq!(yearly.discount_pct, 20);
        assert!(yearly.price.to_minor_units() < monthly.price.to_minor_units() * 12);
        assert!(yearly.best_deal);

        Ok(())
    }

    #[test]
    fn discounts_follow_duration() -> TestResult {
        let catalog = Catalog::builtin()?;

        for plan in ["basic", "pro"] {
            assert_eq!(catalog.resolve(plan, 1)?.discount_pct, 0);
            assert_eq!(catalog.resolve(plan, 6)?.discount_pct, 15);
            assert_eq!(catalog.resolve(plan, 12)?.discount_pct, 20);
        }

        Ok(())
    }

    #[test]
    fn unknown_plan_and_duration_are_errors() -> TestResult {
        let catalog = Catalog::builtin()?;

        assert!(matches!(
            catalog.resolve("enterprise", 1),
            Err(CatalogError::PlanNotFound(plan)) if plan == "enterprise"
        ));
        assert!(matches!(
            catalog.resolve("pro", 3),
            Err(CatalogError::UnsupportedDuration(3))
        ));

        Ok(())
    }

    #[test]
    fn missing_duration_is_not_offered() -> TestResult {
        let yaml = r"
currency: IDR
plans:
  - id: trial
    name: Trial
    options:
      - { months: 1, price: 0, original_price: 0, discount_pct: 0, monthly_equivalent: 0 }
";
        let catalog = Catalog::from_yaml_str(yaml)?;

        assert!(matches!(
            catalog.resolve("trial", 12),
            Err(CatalogError::DurationNotOffered { months: 12, .. })
        ));

        Ok(())
    }

    #[test]
    fn price_above_original_is_rejected() {
        let yaml = r"
currency: IDR
plans:
  - id: odd
    name: Odd
    options:
      - { months: 1, price: 200, original_price: 100, discount_pct: 0, monthly_equivalent: 200 }
";

        assert!(matches!(
            Catalog::from_yaml_str(yaml),
            Err(CatalogError::InvalidOption { reason: "price exceeds original price", .. })
        ));
    }

    #[test]
    fn two_best_deals_are_rejected() {
        let yaml = r"
currency: IDR
plans:
  - id: odd
    name: Odd
    options:
      - { months: 1, price: 100, original_price: 100, discount_pct: 0, monthly_equivalent: 100, best_deal: true }
      - { months: 6, price: 500, original_price: 600, discount_pct: 15, monthly_equivalent: 83, best_deal: true }
";

        assert!(matches!(
            Catalog::from_yaml_str(yaml),
            Err(CatalogError::InvalidOption { reason: "more than one best deal", .. })
        ));
    }

    #[test]
    fn duplicate_plans_are_rejected() {
        let yaml = r"
currency: IDR
plans:
  - { id: pro, name: Pro, options: [] }
  - { id: pro, name: Pro again, options: [] }
";

        assert!(matches!(
            Catalog::from_yaml_str(yaml),
            Err(CatalogError::DuplicatePlan(plan)) if plan == "pro"
        ));
    }

    #[test]
    fn options_are_sorted_by_duration() -> TestResult {
        let yaml = r"
currency: IDR
plans:
  - id: flip
    name: Flip
    options:
      - { months: 12, price: 900, original_price: 1200, discount_pct: 20, monthly_equivalent: 75 }
      - { months: 1, price: 100, original_price: 100, discount_pct: 0, monthly_equivalent: 100 }
";
        let catalog = Catalog::from_yaml_str(yaml)?;
        let plan = catalog.plan("flip")?;

        assert_eq!(
            plan.options.iter().map(BillingOption::duration_months).collect::<Vec<_>>(),
            [1, 12]
        );
        assert!(plan.best_deal().is_none());

        Ok(())
    }
}
