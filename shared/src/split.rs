//! Lot splitting engine
//!
//! When a partial consumption leaves a non-integral remainder, the remainder
//! is split into an integer part kept in the original unit and a fractional
//! part re-expressed in the product's base unit (or a preferred unit). A
//! fractional quantity in most packaging units (a quarter of a "bao") is not
//! a meaningful physical state to persist, while whole remainders stay as a
//! single row to avoid row proliferation.

use rust_decimal::Decimal;

use crate::conversion::{ConversionTable, QUANTITY_SCALE};
use crate::models::LotLineItem;

/// Tolerance below which a remainder is treated as zero.
pub fn split_epsilon() -> Decimal {
    Decimal::new(1, 6)
}

/// One row of a remainder plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemainderRow {
    pub quantity: Decimal,
    pub unit: String,
}

/// How a line item's remaining quantity should be persisted after a
/// consumption event.
///
/// Persistence contract: with both rows present, the existing line item is
/// updated to the integer row and a new line item is inserted for the
/// fractional row; with only a fractional row, the existing line item is
/// updated in place to that row and unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemainderPlan {
    /// Whole-number remainder in the line item's original unit; omitted when
    /// zero, never emitted as a zero row.
    pub integer_row: Option<RemainderRow>,
    /// Sub-unit remainder re-expressed in the base or preferred unit
    pub fractional_row: Option<RemainderRow>,
}

impl RemainderPlan {
    /// The rows of the plan in persistence order.
    pub fn rows(&self) -> impl Iterator<Item = &RemainderRow> {
        self.integer_row.iter().chain(self.fractional_row.iter())
    }
}

/// Compute the remainder breakdown after consuming `consumed_quantity`
/// (expressed in the line item's unit) from `item`.
///
/// Returns `None` when nothing remains: the caller deletes the line item
/// entirely. A zero consumption still runs the split decision, since
/// pre-existing data may already hold a fractional quantity.
pub fn compute_remainder(
    item: &LotLineItem,
    consumed_quantity: Decimal,
    base_unit: &str,
    preferred_unit: Option<&str>,
    table: &ConversionTable,
) -> Option<RemainderPlan> {
    let eps = split_epsilon();
    let remaining = item.quantity - consumed_quantity;
    if remaining <= eps {
        return None;
    }

    let integer_part = (remaining + eps).floor();
    let fractional_part = remaining - integer_part;

    if fractional_part <= eps {
        // Whole remainder stays in the original unit.
        return Some(RemainderPlan {
            integer_row: Some(RemainderRow {
                quantity: integer_part,
                unit: item.unit.clone(),
            }),
            fractional_row: None,
        });
    }

    // Conversion failure must not discard the quantity: it is recorded
    // against the base unit 1:1 as a safe fallback.
    let fractional_base = table
        .to_base_amount(item.product_id, &item.unit, fractional_part, base_unit)
        .unwrap_or(fractional_part);

    let fractional_row = fractional_row_for(
        item,
        fractional_base,
        base_unit,
        preferred_unit,
        table,
    );

    let integer_row = if integer_part > Decimal::ZERO {
        Some(RemainderRow {
            quantity: integer_part,
            unit: item.unit.clone(),
        })
    } else {
        None
    };

    Some(RemainderPlan {
        integer_row,
        fractional_row: Some(fractional_row),
    })
}

/// Express the base-unit fractional amount in the preferred unit when a valid
/// rate exists, otherwise keep it in the base unit.
fn fractional_row_for(
    item: &LotLineItem,
    fractional_base: Decimal,
    base_unit: &str,
    preferred_unit: Option<&str>,
    table: &ConversionTable,
) -> RemainderRow {
    if let Some(preferred) = preferred_unit {
        if !preferred.eq_ignore_ascii_case(base_unit) {
            let rate = table
                .unit_id(preferred)
                .and_then(|uid| table.rate_to_base(item.product_id, uid));
            if let Some(rate) = rate {
                if rate > Decimal::ZERO {
                    let quantity = (fractional_base / rate).round_dp(QUANTITY_SCALE);
                    if quantity > Decimal::ZERO {
                        return RemainderRow {
                            quantity,
                            unit: preferred.to_string(),
                        };
                    }
                }
            }
        }
    }

    RemainderRow {
        quantity: fractional_base.round_dp(QUANTITY_SCALE),
        unit: base_unit.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Unit, UnitConversionEntry};
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn bag_item(product_id: Uuid, quantity: &str) -> LotLineItem {
        LotLineItem {
            id: Uuid::new_v4(),
            lot_id: Uuid::new_v4(),
            product_id,
            quantity: dec(quantity),
            unit: "bao".to_string(),
        }
    }

    // 1 bao = 25 kg, base unit kg
    fn bag_table(product_id: Uuid) -> ConversionTable {
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
            rate_to_base: dec("25"),
        }];
        ConversionTable::from_catalog(&units, &entries)
    }

    #[test]
    fn test_fractional_consumption_splits_into_base_unit() {
        let product_id = Uuid::new_v4();
        let table = bag_table(product_id);
        let item = bag_item(product_id, "3");

        // Consume 2.5 bao: 0 bao integer part (omitted) + 0.5 bao = 12.5 kg
        let plan = compute_remainder(&item, dec("2.5"), "kg", None, &table).unwrap();
        assert_eq!(plan.integer_row, None);
        assert_eq!(
            plan.fractional_row,
            Some(RemainderRow {
                quantity: dec("12.5"),
                unit: "kg".to_string(),
            })
        );
    }

    #[test]
    fn test_whole_remainder_stays_in_original_unit() {
        let product_id = Uuid::new_v4();
        let table = bag_table(product_id);
        let item = bag_item(product_id, "3");

        let plan = compute_remainder(&item, dec("1"), "kg", None, &table).unwrap();
        assert_eq!(
            plan.integer_row,
            Some(RemainderRow {
                quantity: dec("2"),
                unit: "bao".to_string(),
            })
        );
        assert_eq!(plan.fractional_row, None);
    }

    #[test]
    fn test_full_consumption_deletes_line_item() {
        let product_id = Uuid::new_v4();
        let table = bag_table(product_id);
        let item = bag_item(product_id, "3");

        assert_eq!(compute_remainder(&item, dec("3"), "kg", None, &table), None);
    }

    #[test]
    fn test_over_consumption_also_deletes() {
        let product_id = Uuid::new_v4();
        let table = bag_table(product_id);
        let item = bag_item(product_id, "3");

        assert_eq!(compute_remainder(&item, dec("5"), "kg", None, &table), None);
    }

    #[test]
    fn test_zero_consumption_still_splits_fractional_data() {
        let product_id = Uuid::new_v4();
        let table = bag_table(product_id);
        let item = bag_item(product_id, "2.4");

        let plan = compute_remainder(&item, Decimal::ZERO, "kg", None, &table).unwrap();
        assert_eq!(
            plan.integer_row,
            Some(RemainderRow {
                quantity: dec("2"),
                unit: "bao".to_string(),
            })
        );
        // 0.4 bao = 10 kg
        assert_eq!(
            plan.fractional_row,
            Some(RemainderRow {
                quantity: dec("10"),
                unit: "kg".to_string(),
            })
        );
    }

    #[test]
    fn test_preferred_unit_used_when_rate_exists() {
        let product_id = Uuid::new_v4();
        let bag_id = Uuid::new_v4();
        let box_id = Uuid::new_v4();
        let units = vec![
            Unit {
                id: bag_id,
                name: "bao".to_string(),
            },
            Unit {
                id: box_id,
                name: "hộp".to_string(),
            },
            Unit {
                id: Uuid::new_v4(),
                name: "kg".to_string(),
            },
        ];
        let entries = vec![
            UnitConversionEntry {
                product_id,
                unit_id: bag_id,
                rate_to_base: dec("25"),
            },
            // 1 hộp = 5 kg
            UnitConversionEntry {
                product_id,
                unit_id: box_id,
                rate_to_base: dec("5"),
            },
        ];
        let table = ConversionTable::from_catalog(&units, &entries);
        let item = bag_item(product_id, "3");

        // 0.5 bao remainder = 12.5 kg = 2.5 hộp
        let plan = compute_remainder(&item, dec("2.5"), "kg", Some("hộp"), &table).unwrap();
        assert_eq!(
            plan.fractional_row,
            Some(RemainderRow {
                quantity: dec("2.5"),
                unit: "hộp".to_string(),
            })
        );
    }

    #[test]
    fn test_conversion_failure_falls_back_to_base_unit() {
        let product_id = Uuid::new_v4();
        // Empty table: no rate for "bao" at all
        let table = ConversionTable::from_catalog(&[], &[]);
        let item = bag_item(product_id, "1.5");

        let plan = compute_remainder(&item, Decimal::ZERO, "kg", None, &table).unwrap();
        // Quantity is preserved 1:1 against the base unit rather than dropped
        assert_eq!(
            plan.fractional_row,
            Some(RemainderRow {
                quantity: dec("0.5"),
                unit: "kg".to_string(),
            })
        );
    }

    #[test]
    fn test_no_non_positive_rows() {
        let product_id = Uuid::new_v4();
        let table = bag_table(product_id);
        let item = bag_item(product_id, "0.5");

        let plan = compute_remainder(&item, dec("0.25"), "kg", None, &table).unwrap();
        assert_eq!(plan.integer_row, None);
        for row in plan.rows() {
            assert!(row.quantity > Decimal::ZERO);
        }
    }
}
