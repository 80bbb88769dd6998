//! Pricing, points, eco score and billing properties across the built-in tariffs
//! and catalog.
//!
//! Amounts are IDR minor units:
//!
//! - plastic, 5 kg, 3 km: subtotal 15,000, delivery 6,000, total 21,000
//! - the same pickup for a member: 20% off each part, total 16,800
//! - points: 5 kg at 10 points/kg = 50, or 75 for a member

use rust_decimal::Decimal;
use rusty_money::{Money, iso::IDR};
use testresult::TestResult;

use ecomanage::prelude::*;

#[test]
fn non_member_total_is_subtotal_plus_delivery() -> TestResult {
    let tariffs = Tariffs::default();

    for waste_type in WasteType::ALL {
        for (weight, distance) in [(1, 0), (5, 3), (40, 12)] {
            let request = RecyclingRequest::new(waste_type, weight, distance, false)?;
            let breakdown = quote_pickup(&request, &tariffs)?;

            assert!(breakdown.discount.is_zero());
            assert_eq!(
                breakdown.total.to_minor_units(),
                breakdown.subtotal.to_minor_units() + breakdown.delivery_fee.to_minor_units(),
                "{waste_type} {weight} kg {distance} km"
            );
        }
    }

    Ok(())
}

#[test]
fn members_never_pay_more() -> TestResult {
    let tariffs = Tariffs::default();

    for waste_type in WasteType::ALL {
        let guest = quote_pickup(&RecyclingRequest::new(waste_type, 7, 9, false)?, &tariffs)?;
        let member = quote_pickup(&RecyclingRequest::new(waste_type, 7, 9, true)?, &tariffs)?;

        assert!(member.total.to_minor_units() <= guest.total.to_minor_units());
        assert_eq!(
            member.total.to_minor_units() + member.discount.to_minor_units(),
            guest.total.to_minor_units()
        );
    }

    Ok(())
}

#[test]
fn plastic_quote_matches_tariff() -> TestResult {
    let tariffs = Tariffs::default();

    let guest = quote_pickup(&RecyclingRequest::new(WasteType::Plastic, 5, 3, false)?, &tariffs)?;
    assert_eq!(guest.subtotal, Money::from_minor(15_000, IDR));
    assert_eq!(guest.delivery_fee, Money::from_minor(6_000, IDR));
    assert_eq!(guest.total, Money::from_minor(21_000, IDR));

    let request = RecyclingRequest::new(WasteType::Plastic, 5, 3, true)?;
    let member = quote_pickup(&request, &tariffs)?;
    assert_eq!(member.discount, Money::from_minor(4_200, IDR));
    assert_eq!(member.total, Money::from_minor(16_800, IDR));

    let points = PointsCalculator::from_tariffs(&tariffs).pickup_points(&request, &tariffs)?;
    assert_eq!(points, 75);

    Ok(())
}

#[test]
fn points_member_multiplier_floors() -> TestResult {
    let calculator = PointsCalculator::default();

    assert_eq!(calculator.compute_points(5, Decimal::from(5), false)?, 25);
    assert_eq!(calculator.compute_points(5, Decimal::from(5), true)?, 37);
    assert_eq!(
        calculator.purchase_points(&Money::from_minor(99_999, IDR), false)?,
        9
    );

    Ok(())
}

#[test]
fn eco_scores_clamp_to_max() {
    assert_eq!(
        estimate(
            Condition::Good,
            &Category::Furniture,
            &TagSet::from_strs(&["vintage"])
        ),
        100
    );
    assert_eq!(
        estimate(Condition::New, &Category::Electronics, &TagSet::empty()),
        100
    );
}

#[test]
fn yearly_plans_beat_twelve_monthly_payments() -> TestResult {
    let catalog = Catalog::builtin()?;

    for plan in catalog.plans() {
        let monthly = catalog.resolve(&plan.id, 1)?;
        let yearly = catalog.resolve(&plan.id, 12)?;

        assert_eq!(yearly.discount_pct, 20, "{}", plan.id);
        assert!(yearly.price.to_minor_units() < monthly.price.to_minor_units() * 12);
        assert_eq!(plan.best_deal(), Some(&yearly));
    }

    Ok(())
}

#[test]
fn calculators_are_idempotent() -> TestResult {
    let tariffs = Tariffs::default();
    let request = RecyclingRequest::new(WasteType::EWaste, 3, 4, true)?;

    assert_eq!(quote_pickup(&request, &tariffs)?, quote_pickup(&request, &tariffs)?);

    let catalog = Catalog::builtin()?;
    assert_eq!(catalog.resolve("pro", 6)?, catalog.resolve("pro", 6)?);

    Ok(())
}
