//! HTTP handlers for lot management endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::Lot;
use crate::services::lot::{ConsumeLineItemInput, ConsumeOutcome, LotDetail, LotService};
use crate::AppState;

/// List all lots for the company
pub async fn list_lots(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Lot>>> {
    let service = LotService::new(state.db);
    let lots = service.list_lots(current_user.0.company_id).await?;
    Ok(Json(lots))
}

/// Get a lot with its line items and tags
pub async fn get_lot(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(lot_id): Path<Uuid>,
) -> AppResult<Json<LotDetail>> {
    let service = LotService::new(state.db);
    let lot = service.get_lot(current_user.0.company_id, lot_id).await?;
    Ok(Json(lot))
}

/// Consume quantity from a lot line item, splitting the remainder
pub async fn consume_lot_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((lot_id, item_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<ConsumeLineItemInput>,
) -> AppResult<Json<ConsumeOutcome>> {
    let service = LotService::new(state.db);
    let outcome = service
        .consume_line_item(current_user.0.company_id, lot_id, item_id, input)
        .await?;
    Ok(Json(outcome))
}
