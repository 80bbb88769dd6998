//! Reports
//!
//! Terminal tables for quotes, points, eco scores and the plan catalog.

use std::io;

use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    listings::{Category, Condition},
    pricing::PriceBreakdown,
    subscriptions::{Catalog, CatalogError, Plan},
    tags::TagSet,
    waste::RecyclingRequest,
};

/// Errors raised while writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Writing to the output failed.
    #[error("failed to write report")]
    IO,

    /// Wrapped catalog error.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Write a pickup quote with its breakdown and prospective points.
///
/// # Errors
///
/// Returns [`ReportError::IO`] if the output cannot be written.
pub fn write_quote(
    mut out: impl io::Write,
    request: &RecyclingRequest,
    breakdown: &PriceBreakdown<'_>,
    points: u64,
) -> Result<(), ReportError> {
    let mut builder = Builder::default();

    builder.push_record(["", "Amount"]);
    builder.push_record([
        format!("{} x {} kg", request.waste_type(), request.weight_kg()),
        breakdown.subtotal.to_string(),
    ]);
    builder.push_record([
        format!("Delivery ({} km)", request.distance_km()),
        breakdown.delivery_fee.to_string(),
    ]);
    builder.push_record(["Member discount".to_string(), negated(&breakdown.discount)]);
    builder.push_record(["Total".to_string(), breakdown.total.to_string()]);
    builder.push_record(["Points on collection".to_string(), points.to_string()]);

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Rows::new(4..5), Color::BOLD);
    table.modify(Columns::new(1..2), Alignment::right());

    writeln!(out, "{table}").map_err(|_err| ReportError::IO)
}

/// Write a points result.
///
/// # Errors
///
/// Returns [`ReportError::IO`] if the output cannot be written.
pub fn write_points(
    mut out: impl io::Write,
    basis: &str,
    is_member: bool,
    points: u64,
) -> Result<(), ReportError> {
    let mut builder = Builder::default();

    builder.push_record(["Basis", "Member", "Points"]);
    builder.push_record([
        basis.to_string(),
        yes_no(is_member).to_string(),
        points.to_string(),
    ]);

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..3), Alignment::right());

    writeln!(out, "{table}").map_err(|_err| ReportError::IO)
}

/// Write an eco score estimate.
///
/// # Errors
///
/// Returns [`ReportError::IO`] if the output cannot be written.
pub fn write_eco_score(
    mut out: impl io::Write,
    condition: Condition,
    category: &Category,
    tags: &TagSet,
    score: u8,
) -> Result<(), ReportError> {
    let mut builder = Builder::default();

    builder.push_record(["Condition", "Category", "Tags", "Eco score"]);
    builder.push_record([
        condition.to_string(),
        category.to_string(),
        tags.iter().collect::<Vec<_>>().join(", "),
        score.to_string(),
    ]);

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(3..4), Alignment::right());

    writeln!(out, "{table}").map_err(|_err| ReportError::IO)
}

/// Write the billing options of every plan, or of one plan.
///
/// # Errors
///
/// - [`ReportError::Catalog`]: `plan_id` is not in the catalog.
/// - [`ReportError::IO`]: the output cannot be written.
pub fn write_plans(
    mut out: impl io::Write,
    catalog: &Catalog,
    plan_id: Option<&str>,
) -> Result<(), ReportError> {
    let plans: Vec<&Plan> = match plan_id {
        Some(plan_id) => vec![catalog.plan(plan_id)?],
        None => catalog.plans().iter().collect(),
    };

    let mut builder = Builder::default();

    builder.push_record([
        "Plan",
        "Duration",
        "Price",
        "Original",
        "Discount",
        "Per month",
        "",
    ]);

    for plan in &plans {
        for option in &plan.options {
            builder.push_record([
                plan.name.clone(),
                option.duration.to_string(),
                option.price.to_string(),
                option.original_price.to_string(),
                format!("{}%", option.discount_pct),
                option.monthly_equivalent.to_string(),
                if option.best_deal {
                    "best deal".to_string()
                } else {
                    String::new()
                },
            ]);
        }
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..6), Alignment::right());

    writeln!(out, "{table}").map_err(|_err| ReportError::IO)?;

    for plan in plans {
        writeln!(out, "{}: {}", plan.name, plan.benefits.join("; "))
            .map_err(|_err| ReportError::IO)?;
    }

    Ok(())
}

fn negated(amount: &Money<'_, Currency>) -> String {
    if amount.is_zero() {
        amount.to_string()
    } else {
        format!("-{amount}")
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
