//! Lot split tests
//!
//! Tests for the remainder split engine including:
//! - Property 4: Split Completeness (nothing created or lost)
//! - Property 5: Bounded Plan Size
//! - Property 6: No Non-Positive Rows

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::conversion::ConversionTable;
use shared::models::{LotLineItem, Unit, UnitConversionEntry};
use shared::split::compute_remainder;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn bag_item(product_id: Uuid, quantity: Decimal) -> LotLineItem {
    LotLineItem {
        id: Uuid::new_v4(),
        lot_id: Uuid::new_v4(),
        product_id,
        quantity,
        unit: "bao".to_string(),
    }
}

// 1 bao = rate kg, base unit kg
fn table_with_rate(product_id: Uuid, rate: Decimal) -> ConversionTable {
    let bag_id = Uuid::new_v4();
    let units = vec![
        Unit {
            id: bag_id,
            name: "bao".to_string(),
        },
        Unit {
            id: Uuid::new_v4(),
            name: "kg".to_string(),
        },
    ];
    let entries = vec![UnitConversionEntry {
        product_id,
        unit_id: bag_id,
        rate_to_base: rate,
    }];
    ConversionTable::from_catalog(&units, &entries)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Consuming the full quantity leaves no plan: the row is deleted
    #[test]
    fn test_full_consumption_yields_no_plan() {
        let product_id = Uuid::new_v4();
        let table = table_with_rate(product_id, dec("25"));
        let item = bag_item(product_id, dec("4"));

        assert_eq!(compute_remainder(&item, dec("4"), "kg", None, &table), None);
    }

    /// A fractional remainder is re-expressed in the base unit
    #[test]
    fn test_fractional_remainder_in_base_unit() {
        let product_id = Uuid::new_v4();
        let table = table_with_rate(product_id, dec("25"));
        let item = bag_item(product_id, dec("3"));

        let plan = compute_remainder(&item, dec("2.5"), "kg", None, &table).unwrap();
        let row = plan.fractional_row.unwrap();
        assert_eq!(row.quantity, dec("12.5"));
        assert_eq!(row.unit, "kg");
    }

    /// An unknown preferred unit falls back to the base unit
    #[test]
    fn test_unknown_preferred_unit_falls_back() {
        let product_id = Uuid::new_v4();
        let table = table_with_rate(product_id, dec("25"));
        let item = bag_item(product_id, dec("1.5"));

        let plan = compute_remainder(&item, Decimal::ZERO, "kg", Some("thùng"), &table).unwrap();
        let row = plan.fractional_row.unwrap();
        assert_eq!(row.unit, "kg");
        assert_eq!(row.quantity, dec("12.5"));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

fn quantity_and_consumed() -> impl Strategy<Value = (i64, i64)> {
    (1i64..=1_000_000).prop_flat_map(|qty| (Just(qty), 0i64..=qty))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property 4: expressed in base units, consumed + remainder equals the
    /// original quantity. Nothing is created or lost by the split.
    #[test]
    fn prop_split_conserves_quantity(
        (qty_cents, consumed_cents) in quantity_and_consumed(),
        rate_int in 1i64..=500,
    ) {
        let product_id = Uuid::new_v4();
        let rate = Decimal::from(rate_int);
        let quantity = Decimal::new(qty_cents, 2);
        let consumed = Decimal::new(consumed_cents, 2);
        let table = table_with_rate(product_id, rate);
        let item = bag_item(product_id, quantity);

        let mut total_base = consumed * rate;
        if let Some(plan) = compute_remainder(&item, consumed, "kg", None, &table) {
            for row in plan.rows() {
                // Integer rows stay in the original unit, fractional rows in base
                total_base += if row.unit == "bao" {
                    row.quantity * rate
                } else {
                    row.quantity
                };
            }
        }

        let tolerance = (rate + Decimal::ONE) * Decimal::new(2, 6);
        prop_assert!((total_base - quantity * rate).abs() <= tolerance);
    }

    /// Property 5 and 6: a plan never holds more than two rows and never
    /// holds a zero or negative quantity.
    #[test]
    fn prop_plan_bounded_and_positive(
        (qty_cents, consumed_cents) in quantity_and_consumed(),
        rate_int in 1i64..=500,
    ) {
        let product_id = Uuid::new_v4();
        let quantity = Decimal::new(qty_cents, 2);
        let consumed = Decimal::new(consumed_cents, 2);
        let table = table_with_rate(product_id, Decimal::from(rate_int));
        let item = bag_item(product_id, quantity);

        if let Some(plan) = compute_remainder(&item, consumed, "kg", None, &table) {
            let rows: Vec<_> = plan.rows().collect();
            prop_assert!(!rows.is_empty());
            prop_assert!(rows.len() <= 2);
            for row in rows {
                prop_assert!(row.quantity > Decimal::ZERO);
            }
        }
    }
}
