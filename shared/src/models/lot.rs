//! Warehouse lot models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A traceable batch of stocked goods
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lot {
    pub id: Uuid,
    pub company_id: Uuid,
    /// Unique lot code (e.g., "LOT-2024-0001")
    pub code: String,
    pub warehouse: String,
    pub status: LotStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle status of a lot.
///
/// Lots are retired by status change on full consumption, never hard-deleted
/// while referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotStatus {
    Active,
    Consumed,
    Archived,
}

impl LotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LotStatus::Active => "active",
            LotStatus::Consumed => "consumed",
            LotStatus::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(LotStatus::Active),
            "consumed" => Some(LotStatus::Consumed),
            "archived" => Some(LotStatus::Archived),
            _ => None,
        }
    }
}

/// One product/quantity/unit entry within a lot.
///
/// Quantity is always ≥ 0; a line item reduced to zero is deleted rather
/// than retained as a zero row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotLineItem {
    pub id: Uuid,
    pub lot_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit: String,
}

/// A free-form classification tag attached to a lot.
///
/// A tag with `lot_item_id = None` is a general tag applying to every line
/// item in the lot; otherwise it belongs to that one line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotTag {
    pub tag: String,
    pub lot_item_id: Option<Uuid>,
}

/// A lot together with its line items and tag associations, as fetched for
/// the tag roll-up report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotWithItems {
    pub id: Uuid,
    pub code: String,
    pub warehouse: String,
    pub items: Vec<LotLineItem>,
    pub tags: Vec<LotTag>,
}
