//! Common types used across the platform

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sentinel warehouse value meaning "no filter" (Vietnamese for "All")
pub const ALL_WAREHOUSES: &str = "Tất cả";

/// Returns the effective warehouse filter, treating empty and the
/// "Tất cả" sentinel as no filter.
pub fn warehouse_filter(raw: Option<&str>) -> Option<&str> {
    match raw {
        Some(w) if !w.trim().is_empty() && w != ALL_WAREHOUSES => Some(w),
        _ => None,
    }
}

/// Reporting window for ledger queries.
///
/// `to` is inclusive through end-of-day; either bound may be absent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReportWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ReportWindow {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warehouse_filter_sentinel() {
        assert_eq!(warehouse_filter(Some("Tất cả")), None);
        assert_eq!(warehouse_filter(Some("")), None);
        assert_eq!(warehouse_filter(Some("   ")), None);
        assert_eq!(warehouse_filter(None), None);
        assert_eq!(warehouse_filter(Some("Kho A")), Some("Kho A"));
    }
}
