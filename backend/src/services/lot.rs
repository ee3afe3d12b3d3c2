//! Lot management service
//!
//! Consuming part of a line item leaves a remainder that the pure split
//! engine breaks into an integer row in the original unit and a fractional
//! row in the base (or preferred) unit. This service applies that plan to
//! the database inside a single transaction, guarded by an optimistic
//! quantity check so concurrent consumptions of the same line item cannot
//! both succeed against a stale read.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Lot, LotLineItem, LotStatus, LotTag};
use crate::services::catalog::CatalogService;
use shared::split::{compute_remainder, split_epsilon, RemainderRow};

/// Lot service for listing lots and consuming their line items
#[derive(Clone)]
pub struct LotService {
    db: PgPool,
}

/// Input for consuming quantity from a lot line item
#[derive(Debug, Deserialize)]
pub struct ConsumeLineItemInput {
    /// Quantity to consume, expressed in the line item's unit
    pub quantity: Decimal,
    /// Unit to express a fractional remainder in, when a rate exists
    pub preferred_unit: Option<String>,
}

/// A lot with its line items and tags
#[derive(Debug, Serialize)]
pub struct LotDetail {
    pub lot: Lot,
    pub items: Vec<LotLineItem>,
    pub tags: Vec<LotTag>,
}

/// Result of a consumption: the refreshed lot and whether it was retired
#[derive(Debug, Serialize)]
pub struct ConsumeOutcome {
    pub lot: LotDetail,
    pub lot_consumed: bool,
}

impl LotService {
    /// Create a new LotService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List all lots for a company, newest first
    pub async fn list_lots(&self, company_id: Uuid) -> AppResult<Vec<Lot>> {
        let rows: Vec<(Uuid, Uuid, String, String, String, DateTime<Utc>, DateTime<Utc>)> =
            sqlx::query_as(
                r#"
                SELECT id, company_id, code, warehouse, status, created_at, updated_at
                FROM lots
                WHERE company_id = $1
                ORDER BY created_at DESC
                "#,
            )
            .bind(company_id)
            .fetch_all(&self.db)
            .await?;

        rows.into_iter().map(lot_from_row).collect()
    }

    /// Get a lot with its line items and tags
    pub async fn get_lot(&self, company_id: Uuid, lot_id: Uuid) -> AppResult<LotDetail> {
        let lot = self.fetch_lot(company_id, lot_id).await?;

        let (items, tags) = tokio::try_join!(
            self.fetch_items(lot_id),
            self.fetch_tags(lot_id),
        )?;

        Ok(LotDetail { lot, items, tags })
    }

    /// Consume quantity from a lot line item, splitting the remainder.
    ///
    /// The remainder plan is computed from the quantity read here; every
    /// write re-checks that quantity so a concurrent consumption surfaces
    /// as a Conflict instead of silently double-spending stock.
    pub async fn consume_line_item(
        &self,
        company_id: Uuid,
        lot_id: Uuid,
        item_id: Uuid,
        input: ConsumeLineItemInput,
    ) -> AppResult<ConsumeOutcome> {
        if input.quantity < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Consumed quantity cannot be negative".to_string(),
                message_vi: "Số lượng tiêu thụ không được âm".to_string(),
            });
        }

        let lot = self.fetch_lot(company_id, lot_id).await?;
        if lot.status != LotStatus::Active {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot consume from a {} lot",
                lot.status.as_str()
            )));
        }

        let item = self.fetch_item(lot_id, item_id).await?;
        if input.quantity > item.quantity + split_epsilon() {
            return Err(AppError::InsufficientInventory(format!(
                "Requested {} {} but only {} available",
                input.quantity, item.unit, item.quantity
            )));
        }

        let base_unit: Option<(String,)> = sqlx::query_as(
            "SELECT base_unit FROM products WHERE id = $1 AND company_id = $2",
        )
        .bind(item.product_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?;
        let base_unit = base_unit
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?
            .0;

        let catalog = CatalogService::new(self.db.clone())
            .load_context(company_id)
            .await?;

        let plan = compute_remainder(
            &item,
            input.quantity,
            &base_unit,
            input.preferred_unit.as_deref(),
            &catalog.table,
        );
        let rows: Vec<RemainderRow> = match plan {
            Some(p) => p.integer_row.into_iter().chain(p.fractional_row).collect(),
            None => Vec::new(),
        };

        let mut tx = self.db.begin().await?;
        let mut lot_consumed = false;

        match rows.split_first() {
            // Nothing remains: drop the row, retire the lot if it was the last
            None => {
                let result = sqlx::query(
                    "DELETE FROM lot_line_items WHERE id = $1 AND quantity = $2",
                )
                .bind(item.id)
                .bind(item.quantity)
                .execute(&mut *tx)
                .await?;
                if result.rows_affected() == 0 {
                    return Err(stale_line_item());
                }

                let (remaining,): (i64,) = sqlx::query_as(
                    "SELECT COUNT(*) FROM lot_line_items WHERE lot_id = $1",
                )
                .bind(lot_id)
                .fetch_one(&mut *tx)
                .await?;

                if remaining == 0 {
                    sqlx::query(
                        "UPDATE lots SET status = 'consumed', updated_at = NOW() WHERE id = $1",
                    )
                    .bind(lot_id)
                    .execute(&mut *tx)
                    .await?;
                    lot_consumed = true;
                }
            }
            // The existing row becomes the first plan row; extra rows are inserted
            Some((first, rest)) => {
                let result = sqlx::query(
                    r#"
                    UPDATE lot_line_items
                    SET quantity = $1, unit = $2
                    WHERE id = $3 AND quantity = $4
                    "#,
                )
                .bind(first.quantity)
                .bind(&first.unit)
                .bind(item.id)
                .bind(item.quantity)
                .execute(&mut *tx)
                .await?;
                if result.rows_affected() == 0 {
                    return Err(stale_line_item());
                }

                for row in rest {
                    sqlx::query(
                        r#"
                        INSERT INTO lot_line_items (id, lot_id, product_id, quantity, unit)
                        VALUES ($1, $2, $3, $4, $5)
                        "#,
                    )
                    .bind(Uuid::new_v4())
                    .bind(lot_id)
                    .bind(item.product_id)
                    .bind(row.quantity)
                    .bind(&row.unit)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        tx.commit().await?;

        tracing::info!(
            lot_id = %lot_id,
            item_id = %item_id,
            consumed = %input.quantity,
            lot_consumed,
            "Consumed lot line item"
        );

        let lot = self.get_lot(company_id, lot_id).await?;
        Ok(ConsumeOutcome {
            lot,
            lot_consumed,
        })
    }

    async fn fetch_lot(&self, company_id: Uuid, lot_id: Uuid) -> AppResult<Lot> {
        let row: Option<(Uuid, Uuid, String, String, String, DateTime<Utc>, DateTime<Utc>)> =
            sqlx::query_as(
                r#"
                SELECT id, company_id, code, warehouse, status, created_at, updated_at
                FROM lots
                WHERE id = $1 AND company_id = $2
                "#,
            )
            .bind(lot_id)
            .bind(company_id)
            .fetch_optional(&self.db)
            .await?;

        match row {
            Some(row) => lot_from_row(row),
            None => Err(AppError::NotFound("Lot".to_string())),
        }
    }

    async fn fetch_item(&self, lot_id: Uuid, item_id: Uuid) -> AppResult<LotLineItem> {
        let row: Option<(Uuid, Uuid, Uuid, Decimal, String)> = sqlx::query_as(
            r#"
            SELECT id, lot_id, product_id, quantity, unit
            FROM lot_line_items
            WHERE id = $1 AND lot_id = $2
            "#,
        )
        .bind(item_id)
        .bind(lot_id)
        .fetch_optional(&self.db)
        .await?;

        row.map(|(id, lot_id, product_id, quantity, unit)| LotLineItem {
            id,
            lot_id,
            product_id,
            quantity,
            unit,
        })
        .ok_or_else(|| AppError::NotFound("Lot line item".to_string()))
    }

    async fn fetch_items(&self, lot_id: Uuid) -> AppResult<Vec<LotLineItem>> {
        let rows: Vec<(Uuid, Uuid, Uuid, Decimal, String)> = sqlx::query_as(
            r#"
            SELECT id, lot_id, product_id, quantity, unit
            FROM lot_line_items
            WHERE lot_id = $1
            ORDER BY unit, id
            "#,
        )
        .bind(lot_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, lot_id, product_id, quantity, unit)| LotLineItem {
                id,
                lot_id,
                product_id,
                quantity,
                unit,
            })
            .collect())
    }

    async fn fetch_tags(&self, lot_id: Uuid) -> AppResult<Vec<LotTag>> {
        let rows: Vec<(String, Option<Uuid>)> = sqlx::query_as(
            "SELECT tag, lot_item_id FROM lot_tags WHERE lot_id = $1 ORDER BY tag",
        )
        .bind(lot_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(tag, lot_item_id)| LotTag { tag, lot_item_id })
            .collect())
    }
}

fn lot_from_row(
    (id, company_id, code, warehouse, status, created_at, updated_at): (
        Uuid,
        Uuid,
        String,
        String,
        String,
        DateTime<Utc>,
        DateTime<Utc>,
    ),
) -> AppResult<Lot> {
    let status = LotStatus::from_str(&status)
        .ok_or_else(|| AppError::Internal(format!("Unknown lot status: {}", status)))?;
    Ok(Lot {
        id,
        company_id,
        code,
        warehouse,
        status,
        created_at,
        updated_at,
    })
}

fn stale_line_item() -> AppError {
    AppError::Conflict {
        resource: "lot_line_item".to_string(),
        message: "Line item was modified by another request, please retry".to_string(),
        message_vi: "Dòng hàng đã bị thay đổi bởi yêu cầu khác, vui lòng thử lại".to_string(),
    }
}
