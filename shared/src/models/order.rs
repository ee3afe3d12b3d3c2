//! Inbound/outbound order models and the flattened transaction line shape

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of an inbound or outbound order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Draft,
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "Draft",
            OrderStatus::Pending => "Pending",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Draft" => Some(OrderStatus::Draft),
            "Pending" => Some(OrderStatus::Pending),
            "Completed" => Some(OrderStatus::Completed),
            "Cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

/// One product line of an inbound or outbound order, flattened with the
/// fields of its owning order that the ledger needs.
///
/// `unit` and `product_name` are the values recorded at transaction time and
/// may no longer match the current catalog; the ledger degrades to them when
/// the product reference is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionLine {
    pub product_id: Option<Uuid>,
    pub product_name: Option<String>,
    pub warehouse: String,
    pub unit: String,
    pub quantity: Decimal,
    pub direction: Direction,
    pub status: OrderStatus,
    /// Completion timestamp of the owning order
    pub completed_at: DateTime<Utc>,
}
