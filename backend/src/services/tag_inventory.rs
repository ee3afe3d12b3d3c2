//! Tag-based inventory roll-up service
//!
//! Fetches active lots with their line items and tags and hands them to the
//! pure tag roll-up engine. Lots sharing the same sorted tag combination are
//! merged into one report row regardless of tag order on the lot.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{LotLineItem, LotTag, LotWithItems};
use crate::services::catalog::CatalogService;
use shared::tags::{roll_up, TagRollup};
use shared::types::warehouse_filter;

/// Tag inventory service grouping lot stock by tag combination
#[derive(Clone)]
pub struct TagInventoryService {
    db: PgPool,
}

/// Query parameters for the tag inventory report
#[derive(Debug, Deserialize)]
pub struct TagInventoryQuery {
    /// Keep only rows whose tag combination contains this tag
    pub tag: Option<String>,
    /// Warehouse name; empty or "Tất cả" means all warehouses
    pub warehouse: Option<String>,
    /// Normalize convertible quantities into this unit
    pub target_unit_id: Option<Uuid>,
}

impl TagInventoryService {
    /// Create a new TagInventoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Build the tag-grouped inventory report for a company
    pub async fn build_report(
        &self,
        company_id: Uuid,
        query: TagInventoryQuery,
    ) -> AppResult<TagRollup> {
        let catalog = CatalogService::new(self.db.clone())
            .load_context(company_id)
            .await?;

        let target_unit = match query.target_unit_id {
            Some(unit_id) => Some(
                catalog
                    .find_unit(unit_id)
                    .ok_or_else(|| AppError::NotFound("Unit".to_string()))?
                    .clone(),
            ),
            None => None,
        };

        let warehouse = warehouse_filter(query.warehouse.as_deref()).map(str::to_string);
        let lots = self.fetch_active_lots(company_id, warehouse.as_deref()).await?;

        Ok(roll_up(
            &lots,
            query.tag.as_deref(),
            warehouse.as_deref(),
            target_unit.as_ref(),
            &catalog.products,
            &catalog.table,
        ))
    }

    /// Fetch active lots with their line items and tags
    async fn fetch_active_lots(
        &self,
        company_id: Uuid,
        warehouse: Option<&str>,
    ) -> AppResult<Vec<LotWithItems>> {
        let (lot_rows, item_rows, tag_rows) = tokio::try_join!(
            self.fetch_lot_rows(company_id, warehouse),
            self.fetch_item_rows(company_id, warehouse),
            self.fetch_tag_rows(company_id, warehouse),
        )?;

        let mut lots: Vec<LotWithItems> = Vec::with_capacity(lot_rows.len());
        let mut index: HashMap<Uuid, usize> = HashMap::with_capacity(lot_rows.len());
        for (id, code, lot_warehouse) in lot_rows {
            index.insert(id, lots.len());
            lots.push(LotWithItems {
                id,
                code,
                warehouse: lot_warehouse,
                items: Vec::new(),
                tags: Vec::new(),
            });
        }

        for (id, lot_id, product_id, quantity, unit) in item_rows {
            if let Some(&i) = index.get(&lot_id) {
                lots[i].items.push(LotLineItem {
                    id,
                    lot_id,
                    product_id,
                    quantity,
                    unit,
                });
            }
        }

        for (lot_id, tag, lot_item_id) in tag_rows {
            if let Some(&i) = index.get(&lot_id) {
                lots[i].tags.push(LotTag { tag, lot_item_id });
            }
        }

        Ok(lots)
    }

    async fn fetch_lot_rows(
        &self,
        company_id: Uuid,
        warehouse: Option<&str>,
    ) -> AppResult<Vec<(Uuid, String, String)>> {
        let rows = sqlx::query_as(
            r#"
            SELECT id, code, warehouse
            FROM lots
            WHERE company_id = $1
              AND status = 'active'
              AND ($2::text IS NULL OR warehouse = $2)
            ORDER BY created_at
            "#,
        )
        .bind(company_id)
        .bind(warehouse)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn fetch_item_rows(
        &self,
        company_id: Uuid,
        warehouse: Option<&str>,
    ) -> AppResult<Vec<(Uuid, Uuid, Uuid, Decimal, String)>> {
        let rows = sqlx::query_as(
            r#"
            SELECT li.id, li.lot_id, li.product_id, li.quantity, li.unit
            FROM lot_line_items li
            JOIN lots l ON l.id = li.lot_id
            WHERE l.company_id = $1
              AND l.status = 'active'
              AND ($2::text IS NULL OR l.warehouse = $2)
            "#,
        )
        .bind(company_id)
        .bind(warehouse)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn fetch_tag_rows(
        &self,
        company_id: Uuid,
        warehouse: Option<&str>,
    ) -> AppResult<Vec<(Uuid, String, Option<Uuid>)>> {
        let rows = sqlx::query_as(
            r#"
            SELECT lt.lot_id, lt.tag, lt.lot_item_id
            FROM lot_tags lt
            JOIN lots l ON l.id = lt.lot_id
            WHERE l.company_id = $1
              AND l.status = 'active'
              AND ($2::text IS NULL OR l.warehouse = $2)
            "#,
        )
        .bind(company_id)
        .bind(warehouse)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}
