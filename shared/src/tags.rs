//! Tag inventory roll-up engine
//!
//! Computes on-hand quantity grouped by the composite set of classification
//! tags applied to each lot line item, merged across lots. Lot-level tags
//! apply to every line item in the lot; item-level tags add to them.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conversion::ConversionTable;
use crate::models::{LotWithItems, Product, Unit};

/// Separator between tags in a composite key
const TAG_SEPARATOR: &str = "; ";

/// One product aggregate inside a tag group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagProductEntry {
    pub product_code: String,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit: String,
    /// Number of distinct lots contributing to this product/unit aggregate
    pub lot_count: usize,
    pub is_unconvertible: bool,
}

/// One row of the tag inventory report, keyed by the composite tag set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagInventoryRow {
    /// Sorted, joined representation of the full effective tag set
    pub tag: String,
    /// Sum of the convertible product quantities in this group
    pub total_quantity: Decimal,
    pub unit: String,
    pub products: Vec<TagProductEntry>,
}

/// Full roll-up result, including the deduplicated tag vocabulary seen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRollup {
    pub rows: Vec<TagInventoryRow>,
    pub unique_tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ProductKey {
    // The id, not the display code: degraded entries all share the "N/A"
    // code, and distinct deleted products must not merge.
    product_id: Uuid,
    unit: String,
    unconvertible: bool,
}

struct ProductAccumulator {
    code: String,
    name: String,
    quantity: Decimal,
    unit: String,
    lot_codes: Vec<String>,
    unconvertible: bool,
}

/// Roll up on-hand inventory of active lots by composite tag key.
///
/// A line item whose effective tag set is empty belongs to no classification
/// and is excluded entirely. When `tag_filter` is given, a line item is
/// included only if the filter is a member of its effective tag set; the
/// composite key still reflects the full set.
pub fn roll_up(
    lots: &[LotWithItems],
    tag_filter: Option<&str>,
    warehouse: Option<&str>,
    target_unit: Option<&Unit>,
    products: &HashMap<Uuid, Product>,
    table: &ConversionTable,
) -> TagRollup {
    // BTreeMap keeps composite keys in ascending order for the output.
    let mut groups: BTreeMap<String, HashMap<ProductKey, ProductAccumulator>> = BTreeMap::new();
    let mut all_tags: BTreeSet<String> = BTreeSet::new();

    for lot in lots {
        if let Some(w) = warehouse {
            if lot.warehouse != w {
                continue;
            }
        }

        let general_tags: Vec<&str> = lot
            .tags
            .iter()
            .filter(|t| t.lot_item_id.is_none())
            .map(|t| t.tag.as_str())
            .collect();

        let mut item_tags: HashMap<Uuid, Vec<&str>> = HashMap::new();
        for tag in &lot.tags {
            if let Some(item_id) = tag.lot_item_id {
                item_tags.entry(item_id).or_default().push(&tag.tag);
            }
        }

        for item in &lot.items {
            let mut effective: BTreeSet<&str> = general_tags.iter().copied().collect();
            if let Some(specific) = item_tags.get(&item.id) {
                effective.extend(specific.iter().copied());
            }
            if effective.is_empty() {
                continue;
            }
            if let Some(filter) = tag_filter {
                if !effective.contains(filter) {
                    continue;
                }
            }
            for tag in &effective {
                all_tags.insert((*tag).to_string());
            }

            // Two items with the same tag set in different insertion order
            // collapse into the same group.
            let composite = effective.into_iter().collect::<Vec<_>>().join(TAG_SEPARATOR);

            let product = products.get(&item.product_id);
            let (code, name) = match product {
                Some(p) => (p.sku.clone(), p.name.clone()),
                // Missing reference data degrades to the raw identifier.
                None => ("N/A".to_string(), item.product_id.to_string()),
            };

            let native_unit = item.unit.trim().to_string();
            let mut quantity = item.quantity;
            let mut unit = native_unit.clone();
            let mut unconvertible = false;

            if let Some(target) = target_unit {
                let converted = product.and_then(|p| {
                    if table.is_convertible_to(item.product_id, &p.base_unit, target) {
                        table.convert(
                            item.product_id,
                            &native_unit,
                            &target.name,
                            item.quantity,
                            &p.base_unit,
                        )
                    } else {
                        None
                    }
                });
                match converted {
                    Some(q) => {
                        quantity = q;
                        unit = target.name.clone();
                    }
                    None => unconvertible = true,
                }
            }

            let key = ProductKey {
                product_id: item.product_id,
                unit: unit.clone(),
                unconvertible,
            };
            let entry = groups
                .entry(composite)
                .or_default()
                .entry(key)
                .or_insert_with(|| ProductAccumulator {
                    code,
                    name,
                    quantity: Decimal::ZERO,
                    unit,
                    lot_codes: Vec::new(),
                    unconvertible,
                });

            entry.quantity += quantity;
            if !entry.lot_codes.contains(&lot.code) {
                entry.lot_codes.push(lot.code.clone());
            }
        }
    }

    let rows = groups
        .into_iter()
        .map(|(tag, product_groups)| {
            let mut total_quantity = Decimal::ZERO;
            let mut entries: Vec<TagProductEntry> = product_groups
                .into_values()
                .map(|acc| {
                    if !acc.unconvertible {
                        total_quantity += acc.quantity;
                    }
                    TagProductEntry {
                        product_code: acc.code,
                        product_name: acc.name,
                        quantity: acc.quantity,
                        unit: acc.unit,
                        lot_count: acc.lot_codes.len(),
                        is_unconvertible: acc.unconvertible,
                    }
                })
                .collect();

            entries.sort_by(|a, b| b.quantity.cmp(&a.quantity));
            let unit = entries
                .first()
                .map(|e| e.unit.clone())
                .unwrap_or_default();

            TagInventoryRow {
                tag,
                total_quantity,
                unit,
                products: entries,
            }
        })
        .collect();

    TagRollup {
        rows,
        unique_tags: all_tags.into_iter().collect(),
    }
}
