//! HTTP handlers for catalog endpoints

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{Product, Unit};
use crate::services::catalog::CatalogService;
use crate::AppState;

/// List all products for the company
pub async fn list_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Product>>> {
    let service = CatalogService::new(state.db);
    let products = service.list_products(current_user.0.company_id).await?;
    Ok(Json(products))
}

/// List all units of measure for the company
pub async fn list_units(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Unit>>> {
    let service = CatalogService::new(state.db);
    let units = service.list_units(current_user.0.company_id).await?;
    Ok(Json(units))
}
