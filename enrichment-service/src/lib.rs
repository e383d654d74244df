//! Enrichment Service - batch ingestion, asynchronous categorization, and
//! account reporting.

pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod services;
pub mod startup;
pub mod utils;
pub mod workers;

use axum::{
    middleware::from_fn,
    routing::{delete, get, post},
    Router,
};
use startup::AppState;
use tower_http::trace::TraceLayer;

/// Assemble the HTTP router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route(
            "/api/integrations/transactions",
            post(handlers::ingestion::ingest_batch),
        )
        .route("/api/batches/:batch_id", get(handlers::batches::get_batch))
        .route(
            "/api/batches/:batch_id/process",
            post(handlers::batches::process_batch),
        )
        .route(
            "/api/reports/accounts/:account_id/summary",
            get(handlers::reports::account_summary),
        )
        .route(
            "/api/categories",
            get(handlers::categories::list_categories).post(handlers::categories::create_category),
        )
        .route(
            "/api/categories/:category_id/patterns",
            post(handlers::categories::add_pattern),
        )
        .route(
            "/api/patterns/:pattern_id",
            delete(handlers::categories::delete_pattern),
        )
        .layer(from_fn(middleware::metrics_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
