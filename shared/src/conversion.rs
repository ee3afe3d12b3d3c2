//! Unit conversion engine
//!
//! Converts physical quantities between heterogeneous units of measure using
//! per-product conversion tables. The table is built by the caller from the
//! catalog records and passed in explicitly; there is no ambient cache.
//!
//! A missing unit name or missing rate makes a conversion *undefined*: the
//! functions return `None` and the caller must branch into a degraded,
//! unit-preserving path instead of silently passing the quantity through.

use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{Unit, UnitConversionEntry};

/// Fixed rounding precision for converted quantities.
///
/// Repeated conversions (base → unit → base) must be idempotent within this
/// tolerance; it is a contract, not a tunable.
pub const QUANTITY_SCALE: u32 = 6;

/// Caller-owned lookup table mapping (product, unit) to the rate into that
/// product's base unit.
#[derive(Debug, Clone, Default)]
pub struct ConversionTable {
    /// Lowercased unit name -> unit id
    unit_ids: HashMap<String, Uuid>,
    /// product id -> unit id -> rate to base (1 unit = rate × base)
    rates: HashMap<Uuid, HashMap<Uuid, Decimal>>,
}

impl ConversionTable {
    /// Build the table from catalog units and per-product conversion entries.
    pub fn from_catalog(units: &[Unit], entries: &[UnitConversionEntry]) -> Self {
        let mut unit_ids = HashMap::new();
        for unit in units {
            unit_ids.insert(unit.name.to_lowercase(), unit.id);
        }

        let mut rates: HashMap<Uuid, HashMap<Uuid, Decimal>> = HashMap::new();
        for entry in entries {
            rates
                .entry(entry.product_id)
                .or_default()
                .insert(entry.unit_id, entry.rate_to_base);
        }

        Self { unit_ids, rates }
    }

    /// Resolve a unit name (case-insensitively) to its identifier.
    pub fn unit_id(&self, name: &str) -> Option<Uuid> {
        self.unit_ids.get(&name.to_lowercase()).copied()
    }

    /// Rate from the given unit into the product's base unit, if one is stored.
    pub fn rate_to_base(&self, product_id: Uuid, unit_id: Uuid) -> Option<Decimal> {
        self.rates.get(&product_id)?.get(&unit_id).copied()
    }

    /// Rate multiplying a base-unit quantity into the target unit.
    ///
    /// The table stores `1 target = rate × base`, so one base unit is
    /// `1 / rate` target units. A missing or zero rate yields `None`.
    pub fn base_to_unit_rate(&self, product_id: Uuid, target_unit_id: Uuid) -> Option<Decimal> {
        let rate = self.rate_to_base(product_id, target_unit_id)?;
        if rate <= Decimal::ZERO {
            return None;
        }
        Some(Decimal::ONE / rate)
    }

    /// Whether quantities of this product can be expressed in `target`:
    /// either `target` is the product's base unit or an explicit rate exists.
    pub fn is_convertible_to(&self, product_id: Uuid, base_unit: &str, target: &Unit) -> bool {
        if base_unit.eq_ignore_ascii_case(&target.name) {
            return true;
        }
        self.rate_to_base(product_id, target.id)
            .map(|r| r > Decimal::ZERO)
            .unwrap_or(false)
    }

    /// Convert a quantity from `from_unit` into the product's base unit.
    ///
    /// Returns `None` when the unit cannot be resolved or no rate is stored;
    /// the quantity is then non-convertible and must be kept in its native
    /// unit by the caller.
    pub fn to_base_amount(
        &self,
        product_id: Uuid,
        from_unit: &str,
        quantity: Decimal,
        base_unit: &str,
    ) -> Option<Decimal> {
        if from_unit.eq_ignore_ascii_case(base_unit) {
            return Some(quantity);
        }

        let unit_id = self.unit_id(from_unit)?;
        let rate = self.rate_to_base(product_id, unit_id)?;
        Some((quantity * rate).round_dp(QUANTITY_SCALE))
    }

    /// Convert a quantity between two named units of the same product.
    ///
    /// Non-base-to-non-base conversions route through the base unit; direct
    /// rates between two alternative units are never stored.
    pub fn convert(
        &self,
        product_id: Uuid,
        from_unit: &str,
        to_unit: &str,
        quantity: Decimal,
        base_unit: &str,
    ) -> Option<Decimal> {
        if from_unit.eq_ignore_ascii_case(to_unit) {
            return Some(quantity);
        }

        let base_amount = self.to_base_amount(product_id, from_unit, quantity, base_unit)?;
        if to_unit.eq_ignore_ascii_case(base_unit) {
            return Some(base_amount);
        }

        let target_id = self.unit_id(to_unit)?;
        let rate = self.rate_to_base(product_id, target_id)?;
        if rate <= Decimal::ZERO {
            return None;
        }
        Some((base_amount / rate).round_dp(QUANTITY_SCALE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn sample_table(product_id: Uuid) -> (ConversionTable, Uuid) {
        let bag_id = Uuid::new_v4();
        let units = vec![
            Unit {
                id: bag_id,
                name: "Bao".to_string(),
            },
            Unit {
                id: Uuid::new_v4(),
                name: "Kg".to_string(),
            },
        ];
        // 1 bao = 25 kg, base unit is kg
        let entries = vec![UnitConversionEntry {
            product_id,
            unit_id: bag_id,
            rate_to_base: dec("25"),
        }];
        (ConversionTable::from_catalog(&units, &entries), bag_id)
    }

    #[test]
    fn test_base_unit_is_identity() {
        let product_id = Uuid::new_v4();
        let (table, _) = sample_table(product_id);

        assert_eq!(
            table.to_base_amount(product_id, "KG", dec("7.5"), "kg"),
            Some(dec("7.5"))
        );
    }

    #[test]
    fn test_to_base_amount_applies_rate() {
        let product_id = Uuid::new_v4();
        let (table, _) = sample_table(product_id);

        assert_eq!(
            table.to_base_amount(product_id, "bao", dec("2"), "kg"),
            Some(dec("50"))
        );
    }

    #[test]
    fn test_unknown_unit_is_unconvertible() {
        let product_id = Uuid::new_v4();
        let (table, _) = sample_table(product_id);

        assert_eq!(table.to_base_amount(product_id, "thùng", dec("2"), "kg"), None);
    }

    #[test]
    fn test_missing_rate_is_unconvertible() {
        let product_id = Uuid::new_v4();
        let other_product = Uuid::new_v4();
        let (table, _) = sample_table(product_id);

        assert_eq!(table.to_base_amount(other_product, "bao", dec("2"), "kg"), None);
    }

    #[test]
    fn test_convert_base_to_alternative() {
        let product_id = Uuid::new_v4();
        let (table, _) = sample_table(product_id);

        // 50 kg = 2 bao
        assert_eq!(
            table.convert(product_id, "kg", "bao", dec("50"), "kg"),
            Some(dec("2"))
        );
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        let product_id = Uuid::new_v4();
        let (table, _) = sample_table(product_id);

        let original = dec("3.7");
        let base = table
            .to_base_amount(product_id, "bao", original, "kg")
            .unwrap();
        let back = table.convert(product_id, "kg", "bao", base, "kg").unwrap();
        assert!((back - original).abs() <= Decimal::new(1, QUANTITY_SCALE));
    }

    #[test]
    fn test_zero_rate_rejected() {
        let product_id = Uuid::new_v4();
        let unit_id = Uuid::new_v4();
        let units = vec![Unit {
            id: unit_id,
            name: "hộp".to_string(),
        }];
        let entries = vec![UnitConversionEntry {
            product_id,
            unit_id,
            rate_to_base: Decimal::ZERO,
        }];
        let table = ConversionTable::from_catalog(&units, &entries);

        assert_eq!(table.base_to_unit_rate(product_id, unit_id), None);
        assert_eq!(table.convert(product_id, "kg", "hộp", dec("10"), "kg"), None);
    }
}
