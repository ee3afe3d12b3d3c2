//! Period stock ledger engine
//!
//! Aggregates raw inbound/outbound transaction lines into per
//! (product, warehouse, unit) rows of opening balance, period movement and
//! all-time balance, optionally normalizing quantities into one target unit.
//!
//! `balance` is deliberately the all-time running total while
//! `opening`/`qty_in`/`qty_out` are window-scoped: they answer different
//! questions (total on-hand vs. this period's movement) and are accumulated
//! independently, never collapsed into `opening + qty_in - qty_out`.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conversion::ConversionTable;
use crate::models::{Direction, OrderStatus, Product, TransactionLine, Unit};
use crate::types::ReportWindow;

/// One row of the stock ledger report; derived per query, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRow {
    pub product_id: Option<Uuid>,
    pub product_code: String,
    pub product_name: String,
    pub warehouse: String,
    pub unit: String,
    /// Stock accumulated strictly before the window start
    pub opening: Decimal,
    pub qty_in: Decimal,
    pub qty_out: Decimal,
    /// All-time running total, independent of the reporting window
    pub balance: Decimal,
    /// Set when the quantity could not be normalized into the requested
    /// target unit; such rows are kept in their native unit, never summed
    /// into another group.
    pub is_unconvertible: bool,
}

/// How one line's quantity lands in the report: normalized into the target
/// unit, or kept in its native unit because no conversion is defined.
enum Normalized {
    Convertible { unit: String, quantity: Decimal },
    Unconvertible { native_unit: String, quantity: Decimal },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    product_id: Option<Uuid>,
    warehouse: String,
    unit: String,
    unconvertible: bool,
}

/// Build the stock ledger from completed transaction lines.
///
/// Lines after the window end are excluded outright; lines strictly before
/// the window start count toward the opening balance. A missing product
/// reference degrades the row to the recorded product name and still counts.
pub fn build_ledger(
    lines: &[TransactionLine],
    window: ReportWindow,
    warehouse: Option<&str>,
    search: Option<&str>,
    target_unit: Option<&Unit>,
    products: &HashMap<Uuid, Product>,
    table: &ConversionTable,
) -> Vec<LedgerRow> {
    let mut groups: HashMap<GroupKey, LedgerRow> = HashMap::new();

    for line in lines {
        if line.status != OrderStatus::Completed {
            continue;
        }
        if let Some(w) = warehouse {
            if line.warehouse != w {
                continue;
            }
        }

        let date = line.completed_at.date_naive();
        if let Some(to) = window.to {
            if date > to {
                continue;
            }
        }
        let is_opening = window.from.map(|from| date < from).unwrap_or(false);

        let product = line.product_id.and_then(|id| products.get(&id));
        let normalized = normalize(line, product, target_unit, table);

        let (unit, quantity, unconvertible) = match normalized {
            Normalized::Convertible { unit, quantity } => (unit, quantity, false),
            Normalized::Unconvertible {
                native_unit,
                quantity,
            } => (native_unit, quantity, true),
        };

        let key = GroupKey {
            product_id: line.product_id,
            warehouse: line.warehouse.clone(),
            unit: unit.clone(),
            unconvertible,
        };

        let row = groups.entry(key).or_insert_with(|| LedgerRow {
            product_id: line.product_id,
            product_code: product
                .map(|p| p.sku.clone())
                .unwrap_or_else(|| "N/A".to_string()),
            product_name: product
                .map(|p| p.name.clone())
                .or_else(|| line.product_name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            warehouse: line.warehouse.clone(),
            unit,
            opening: Decimal::ZERO,
            qty_in: Decimal::ZERO,
            qty_out: Decimal::ZERO,
            balance: Decimal::ZERO,
            is_unconvertible: unconvertible,
        });

        if is_opening {
            // Opening balance = Σ(in before window) − Σ(out before window)
            match line.direction {
                Direction::In => row.opening += quantity,
                Direction::Out => row.opening -= quantity,
            }
        } else {
            match line.direction {
                Direction::In => row.qty_in += quantity,
                Direction::Out => row.qty_out += quantity,
            }
        }

        // Balance accumulates every line regardless of window classification.
        match line.direction {
            Direction::In => row.balance += quantity,
            Direction::Out => row.balance -= quantity,
        }
    }

    let mut rows: Vec<LedgerRow> = groups.into_values().collect();

    if let Some(q) = search {
        let q = q.to_lowercase();
        rows.retain(|row| {
            row.product_code.to_lowercase().contains(&q)
                || row.product_name.to_lowercase().contains(&q)
                || row
                    .product_id
                    .map(|id| id.to_string() == q)
                    .unwrap_or(false)
        });
    }

    // Degraded data is segregated at the bottom rather than interleaved.
    rows.sort_by(|a, b| {
        a.is_unconvertible
            .cmp(&b.is_unconvertible)
            .then_with(|| a.product_name.to_lowercase().cmp(&b.product_name.to_lowercase()))
    });

    rows
}

fn normalize(
    line: &TransactionLine,
    product: Option<&Product>,
    target_unit: Option<&Unit>,
    table: &ConversionTable,
) -> Normalized {
    let Some(target) = target_unit else {
        return Normalized::Convertible {
            unit: line.unit.clone(),
            quantity: line.quantity,
        };
    };

    if let (Some(pid), Some(p)) = (line.product_id, product) {
        if table.is_convertible_to(pid, &p.base_unit, target) {
            // The product converts into the target, but this line's recorded
            // unit may itself lack a rate; such a line stays native.
            if let Some(quantity) =
                table.convert(pid, &line.unit, &target.name, line.quantity, &p.base_unit)
            {
                return Normalized::Convertible {
                    unit: target.name.clone(),
                    quantity,
                };
            }
        }
    }

    Normalized::Unconvertible {
        native_unit: line.unit.clone(),
        quantity: line.quantity,
    }
}
