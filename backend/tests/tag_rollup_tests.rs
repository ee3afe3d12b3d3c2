//! Tag inventory roll-up tests
//!
//! Tests for the tag grouping engine including:
//! - Property 10: Composite Key Order Independence
//! - Property 11: Untagged Items Never Appear
//! - Property 12: Unconvertible Quantities Never Pollute Totals

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use shared::conversion::ConversionTable;
use shared::models::{LotLineItem, LotTag, LotWithItems, Product, Unit};
use shared::tags::roll_up;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn product(id: Uuid, name: &str, base_unit: &str) -> Product {
    Product {
        id,
        company_id: Uuid::new_v4(),
        sku: format!("SKU-{}", name),
        name: name.to_string(),
        base_unit: base_unit.to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// One-item lot carrying the given general tags
fn lot(code: &str, product_id: Uuid, quantity: Decimal, unit: &str, tags: &[&str]) -> LotWithItems {
    let lot_id = Uuid::new_v4();
    LotWithItems {
        id: lot_id,
        code: code.to_string(),
        warehouse: "Kho A".to_string(),
        items: vec![LotLineItem {
            id: Uuid::new_v4(),
            lot_id,
            product_id,
            quantity,
            unit: unit.to_string(),
        }],
        tags: tags
            .iter()
            .map(|t| LotTag {
                tag: t.to_string(),
                lot_item_id: None,
            })
            .collect(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Lots carrying the same tags in a different order merge into one row
    #[test]
    fn test_tag_order_does_not_split_groups() {
        let pid = Uuid::new_v4();
        let mut products = HashMap::new();
        products.insert(pid, product(pid, "Cá basa", "kg"));
        let table = ConversionTable::from_catalog(&[], &[]);

        let lots = vec![
            lot("LOT-001", pid, dec("10"), "kg", &["KHU_A", "HANG_DONG"]),
            lot("LOT-002", pid, dec("5"), "kg", &["HANG_DONG", "KHU_A"]),
        ];

        let rollup = roll_up(&lots, None, None, None, &products, &table);
        assert_eq!(rollup.rows.len(), 1);
        assert_eq!(rollup.rows[0].tag, "HANG_DONG; KHU_A");
        assert_eq!(rollup.rows[0].total_quantity, dec("15"));
        assert_eq!(rollup.rows[0].products[0].lot_count, 2);
    }

    /// A tag filter keeps the full composite key on matching rows
    #[test]
    fn test_filter_preserves_composite_key() {
        let pid = Uuid::new_v4();
        let mut products = HashMap::new();
        products.insert(pid, product(pid, "Tôm sú", "kg"));
        let table = ConversionTable::from_catalog(&[], &[]);

        let lots = vec![
            lot("LOT-001", pid, dec("10"), "kg", &["KHU_A", "HANG_DONG"]),
            lot("LOT-002", pid, dec("99"), "kg", &["KHU_B"]),
        ];

        let rollup = roll_up(&lots, Some("KHU_A"), None, None, &products, &table);
        assert_eq!(rollup.rows.len(), 1);
        assert_eq!(rollup.rows[0].tag, "HANG_DONG; KHU_A");
    }

    /// Items with no effective tags are excluded from the report
    #[test]
    fn test_untagged_items_excluded() {
        let pid = Uuid::new_v4();
        let mut products = HashMap::new();
        products.insert(pid, product(pid, "Mực ống", "kg"));
        let table = ConversionTable::from_catalog(&[], &[]);

        let lots = vec![lot("LOT-001", pid, dec("10"), "kg", &[])];

        let rollup = roll_up(&lots, None, None, None, &products, &table);
        assert!(rollup.rows.is_empty());
        assert!(rollup.unique_tags.is_empty());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

fn shuffled_tags() -> impl Strategy<Value = Vec<String>> {
    Just(vec![
        "giao_ngay".to_string(),
        "hang_dong".to_string(),
        "khu_a".to_string(),
    ])
    .prop_shuffle()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 10: the composite key and unique tag vocabulary are
    /// independent of the order tags were attached in.
    #[test]
    fn prop_composite_key_order_independent(tags in shuffled_tags()) {
        let pid = Uuid::new_v4();
        let mut products = HashMap::new();
        products.insert(pid, product(pid, "Cá basa", "kg"));
        let table = ConversionTable::from_catalog(&[], &[]);

        let tag_refs: Vec<&str> = tags.iter().map(String::as_str).collect();
        let lots = vec![lot("LOT-001", pid, dec("10"), "kg", &tag_refs)];

        let rollup = roll_up(&lots, None, None, None, &products, &table);
        prop_assert_eq!(rollup.rows.len(), 1);
        prop_assert_eq!(&rollup.rows[0].tag, "giao_ngay; hang_dong; khu_a");
        prop_assert_eq!(
            rollup.unique_tags.clone(),
            vec!["giao_ngay".to_string(), "hang_dong".to_string(), "khu_a".to_string()]
        );
    }

    /// Property 12: quantities that cannot be normalized into the target
    /// unit are flagged and never summed into the group total.
    #[test]
    fn prop_unconvertible_excluded_from_total(
        fish_cents in 1i64..=1_000_000,
        box_count in 1i64..=1000,
    ) {
        let fish = Uuid::new_v4();
        let boxes = Uuid::new_v4();
        let mut products = HashMap::new();
        products.insert(fish, product(fish, "Cá basa", "kg"));
        products.insert(boxes, product(boxes, "Thùng xốp", "cái"));
        let kg = Unit {
            id: Uuid::new_v4(),
            name: "Kg".to_string(),
        };
        let table = ConversionTable::from_catalog(std::slice::from_ref(&kg), &[]);

        let fish_qty = Decimal::new(fish_cents, 2);
        let lots = vec![
            lot("LOT-001", fish, fish_qty, "kg", &["KHU_A"]),
            lot("LOT-002", boxes, Decimal::from(box_count), "cái", &["KHU_A"]),
        ];

        let rollup = roll_up(&lots, None, None, Some(&kg), &products, &table);
        prop_assert_eq!(rollup.rows.len(), 1);
        let row = &rollup.rows[0];
        prop_assert_eq!(row.total_quantity, fish_qty);

        let flagged = row.products.iter().find(|p| p.is_unconvertible);
        prop_assert!(flagged.is_some());
        prop_assert_eq!(flagged.map(|p| p.unit.as_str()), Some("cái"));
    }
}
