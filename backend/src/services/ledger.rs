//! Stock ledger reporting service
//!
//! Fetches completed inbound and outbound order lines and hands them to the
//! pure ledger engine. Opening/in/out columns are scoped to the requested
//! window while the balance column is computed over the full history up to
//! the window's end, so a report for June still shows the true stock on hand.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Direction, OrderStatus, TransactionLine};
use crate::services::catalog::CatalogService;
use shared::ledger::{build_ledger, LedgerRow};
use shared::types::{warehouse_filter, ReportWindow};

/// Ledger service building the per-product stock movement report
#[derive(Clone)]
pub struct LedgerService {
    db: PgPool,
}

/// Query parameters for the ledger report
#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    /// Substring search over product SKU/name, or an exact product id
    pub q: Option<String>,
    /// Warehouse name; empty or "Tất cả" means all warehouses
    pub warehouse: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Normalize convertible rows into this unit
    pub target_unit_id: Option<Uuid>,
}

impl LedgerService {
    /// Create a new LedgerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Build the stock ledger report for a company
    pub async fn build_report(
        &self,
        company_id: Uuid,
        query: LedgerQuery,
    ) -> AppResult<Vec<LedgerRow>> {
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
        let until = query.date_to.and_then(end_of_day);

        let (mut lines, outbound) = tokio::try_join!(
            self.fetch_lines(company_id, Direction::In, warehouse.as_deref(), until),
            self.fetch_lines(company_id, Direction::Out, warehouse.as_deref(), until),
        )?;
        lines.extend(outbound);

        let window = ReportWindow::new(query.date_from, query.date_to);

        Ok(build_ledger(
            &lines,
            window,
            warehouse.as_deref(),
            query.q.as_deref(),
            target_unit.as_ref(),
            &catalog.products,
            &catalog.table,
        ))
    }

    /// Fetch completed order lines for one direction, bounded above by the
    /// report window's end. The lower bound stays in the engine: pre-window
    /// lines feed the opening and balance columns.
    async fn fetch_lines(
        &self,
        company_id: Uuid,
        direction: Direction,
        warehouse: Option<&str>,
        until: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<TransactionLine>> {
        let (orders, items) = match direction {
            Direction::In => ("inbound_orders", "inbound_order_items"),
            Direction::Out => ("outbound_orders", "outbound_order_items"),
        };

        let sql = format!(
            r#"
            SELECT i.product_id, i.product_name, o.warehouse, i.unit, i.quantity, o.completed_at
            FROM {items} i
            JOIN {orders} o ON o.id = i.order_id
            WHERE o.company_id = $1
              AND o.status = 'Completed'
              AND o.completed_at IS NOT NULL
              AND ($2::text IS NULL OR o.warehouse = $2)
              AND ($3::timestamptz IS NULL OR o.completed_at <= $3)
            "#
        );

        let rows: Vec<(Option<Uuid>, Option<String>, String, String, Decimal, DateTime<Utc>)> =
            sqlx::query_as(&sql)
                .bind(company_id)
                .bind(warehouse)
                .bind(until)
                .fetch_all(&self.db)
                .await?;

        Ok(rows
            .into_iter()
            .map(
                |(product_id, product_name, warehouse, unit, quantity, completed_at)| {
                    TransactionLine {
                        product_id,
                        product_name,
                        warehouse,
                        unit,
                        quantity,
                        direction,
                        // Constrained by the query above
                        status: OrderStatus::Completed,
                        completed_at,
                    }
                },
            )
            .collect())
    }
}

/// Inclusive end-of-day timestamp for a report date bound
fn end_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(23, 59, 59).map(|dt| dt.and_utc())
}
