//! Route definitions for the Warehouse Inventory Management Platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - catalog
        .nest("/catalog", catalog_routes())
        // Protected routes - inventory reporting
        .nest("/inventory", inventory_routes())
        // Protected routes - lot management
        .nest("/lots", lot_routes())
}

/// Catalog routes (protected)
fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(handlers::list_products))
        .route("/units", get(handlers::list_units))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Inventory reporting routes (protected)
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/ledger", get(handlers::get_ledger))
        .route("/by-tag", get(handlers::get_tag_inventory))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Lot management routes (protected)
fn lot_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_lots))
        .route("/:lot_id", get(handlers::get_lot))
        .route(
            "/:lot_id/items/:item_id/consume",
            post(handlers::consume_lot_item),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}
