//! HTTP handlers for inventory reporting endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::ledger::{LedgerQuery, LedgerService};
use crate::services::tag_inventory::{TagInventoryQuery, TagInventoryService};
use crate::AppState;
use shared::ledger::LedgerRow;
use shared::tags::TagRollup;

/// Get the stock ledger report
pub async fn get_ledger(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<LedgerQuery>,
) -> AppResult<Json<Vec<LedgerRow>>> {
    let service = LedgerService::new(state.db);
    let rows = service
        .build_report(current_user.0.company_id, query)
        .await?;
    Ok(Json(rows))
}

/// Get inventory grouped by tag combination
pub async fn get_tag_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<TagInventoryQuery>,
) -> AppResult<Json<TagRollup>> {
    let service = TagInventoryService::new(state.db);
    let rollup = service
        .build_report(current_user.0.company_id, query)
        .await?;
    Ok(Json(rollup))
}
