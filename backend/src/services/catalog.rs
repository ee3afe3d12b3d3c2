//! Product catalog service
//!
//! Loads products, units and per-product conversion rates for a company and
//! assembles the in-memory lookup context the reporting and lot services
//! compute against. The context is rebuilt per request; catalogs are small
//! and this keeps reports consistent with the catalog at read time.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Product, Unit, UnitConversionEntry};
use shared::conversion::ConversionTable;

/// Catalog service for products, units and conversion rates
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// Everything the pure engines need to interpret quantities for one company
pub struct CatalogContext {
    pub products: HashMap<Uuid, Product>,
    pub units: Vec<Unit>,
    pub table: ConversionTable,
}

impl CatalogContext {
    /// Find a catalog unit by id.
    pub fn find_unit(&self, unit_id: Uuid) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == unit_id)
    }
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List all products for a company, sorted by name
    pub async fn list_products(&self, company_id: Uuid) -> AppResult<Vec<Product>> {
        let rows: Vec<(Uuid, Uuid, String, String, String, DateTime<Utc>, DateTime<Utc>)> =
            sqlx::query_as(
                r#"
                SELECT id, company_id, sku, name, base_unit, created_at, updated_at
                FROM products
                WHERE company_id = $1
                ORDER BY name
                "#,
            )
            .bind(company_id)
            .fetch_all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, company_id, sku, name, base_unit, created_at, updated_at)| Product {
                    id,
                    company_id,
                    sku,
                    name,
                    base_unit,
                    created_at,
                    updated_at,
                },
            )
            .collect())
    }

    /// List all units of measure for a company
    pub async fn list_units(&self, company_id: Uuid) -> AppResult<Vec<Unit>> {
        let rows: Vec<(Uuid, String)> = sqlx::query_as(
            "SELECT id, name FROM units WHERE company_id = $1 ORDER BY name",
        )
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| Unit { id, name })
            .collect())
    }

    /// List all per-product conversion rates for a company
    async fn list_conversions(&self, company_id: Uuid) -> AppResult<Vec<UnitConversionEntry>> {
        let rows: Vec<(Uuid, Uuid, Decimal)> = sqlx::query_as(
            r#"
            SELECT uc.product_id, uc.unit_id, uc.rate_to_base
            FROM unit_conversions uc
            JOIN products p ON p.id = uc.product_id
            WHERE p.company_id = $1
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(product_id, unit_id, rate_to_base)| UnitConversionEntry {
                product_id,
                unit_id,
                rate_to_base,
            })
            .collect())
    }

    /// Load the full catalog context for a company in one round of
    /// concurrent queries.
    pub async fn load_context(&self, company_id: Uuid) -> AppResult<CatalogContext> {
        let (products, units, conversions) = tokio::try_join!(
            self.list_products(company_id),
            self.list_units(company_id),
            self.list_conversions(company_id),
        )?;

        let table = ConversionTable::from_catalog(&units, &conversions);
        let products = products.into_iter().map(|p| (p.id, p)).collect();

        Ok(CatalogContext {
            products,
            units,
            table,
        })
    }
}
