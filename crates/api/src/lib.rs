//! HTTP API server for order placement.
//!
//! Provides REST endpoints for placing and listing orders behind bearer
//! token authentication, with structured logging (tracing) and Prometheus
//! metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::InMemoryOrderStore;
use saga::InMemoryCatalogGateway;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::JwtService;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: AppState, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/api/orders",
            post(routes::orders::place).get(routes::orders::list_mine),
        )
        .route("/api/orders/page", get(routes::orders::list_page))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Registers help text for the order placement metrics.
pub fn describe_metrics() {
    metrics::describe_counter!("order_placements_total", "Order placements started");
    metrics::describe_counter!(
        "order_placements_committed_total",
        "Order placements that were saved"
    );
    metrics::describe_counter!(
        "order_placements_failed_total",
        "Order placements that failed, by stage and kind"
    );
    metrics::describe_counter!(
        "order_compensations_total",
        "Stock restorations after a failed save, by outcome"
    );
    metrics::describe_counter!(
        "order_compensation_failures_total",
        "Placements left with deducted stock that needs reconciliation"
    );
    metrics::describe_histogram!(
        "order_placement_duration_seconds",
        metrics::Unit::Seconds,
        "End-to-end order placement latency"
    );
}

/// Creates application state backed by in-memory store and catalog.
///
/// The store and catalog handles are returned so callers can seed products
/// and inspect saved orders.
pub fn create_default_state(
    jwt_secret: &str,
) -> (AppState, InMemoryOrderStore, InMemoryCatalogGateway) {
    let store = InMemoryOrderStore::new();
    let catalog = InMemoryCatalogGateway::new();
    let state = AppState::new(
        Arc::new(store.clone()),
        Arc::new(catalog.clone()),
        JwtService::new(jwt_secret),
    );
    (state, store, catalog)
}
