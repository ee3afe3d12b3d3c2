//! Product and unit-of-measure reference data
//!
//! These records are created and edited by the catalog CRUD screens; the
//! inventory engines treat them as read-only reference data.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stocked product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub company_id: Uuid,
    /// Display code shown on reports (e.g., "SP-0042")
    pub sku: String,
    pub name: String,
    /// Canonical unit of measure; all conversion rates target this unit
    pub base_unit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named unit of measure (e.g., "kg", "bao", "thùng")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: Uuid,
    pub name: String,
}

/// Conversion rate from an alternative unit to a product's base unit.
///
/// Stores `1 unit = rate_to_base × base_unit`. The base unit itself has an
/// implicit rate of 1 and is never stored; each (product, unit) pair has at
/// most one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitConversionEntry {
    pub product_id: Uuid,
    pub unit_id: Uuid,
    pub rate_to_base: Decimal,
}
