//! Order placement and listing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{Page, ProductId};
use domain::{Order, OrderLineRequest, PricedLine};
use order_store::OrderStore;
use rust_decimal::Decimal;
use saga::{CatalogGateway, OrderOrchestrator, OrderQueryService};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthenticatedUser, JwtService};
use crate::error::ApiError;

/// Store handle shared by the orchestrator and the query side.
pub type SharedStore = Arc<dyn OrderStore>;

/// Catalog handle used by the orchestrator.
pub type SharedCatalog = Arc<dyn CatalogGateway>;

/// Shared application state accessible from all handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<OrderOrchestrator<SharedStore, SharedCatalog>>,
    pub queries: Arc<OrderQueryService<SharedStore>>,
    pub jwt: Arc<JwtService>,
}

impl AppState {
    pub fn new(store: SharedStore, catalog: SharedCatalog, jwt: JwtService) -> Self {
        Self {
            orchestrator: Arc::new(OrderOrchestrator::new(store.clone(), catalog)),
            queries: Arc::new(OrderQueryService::new(store)),
            jwt: Arc::new(jwt),
        }
    }
}

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl From<&OrderItemRequest> for OrderLineRequest {
    fn from(item: &OrderItemRequest) -> Self {
        // Validated by the orchestrator, so zero quantities still reach it
        OrderLineRequest {
            product_id: item.product_id,
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_sort_dir")]
    pub sort_dir: String,
    /// Admin listing only.
    pub username: Option<String>,
}

fn default_size() -> u32 {
    common::page::DEFAULT_PAGE_SIZE
}

fn default_sort_by() -> String {
    "createdAt".to_string()
}

fn default_sort_dir() -> String {
    "asc".to_string()
}

// -- Response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: String,
    pub username: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub order_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    pub applied_discounts: Vec<&'static str>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
}

impl From<&PricedLine> for OrderItemResponse {
    fn from(line: &PricedLine) -> Self {
        Self {
            product_id: line.product_id.to_string(),
            quantity: line.quantity,
            unit_price: line.unit_price.to_decimal(),
            total_price: line.line_total.to_decimal(),
        }
    }
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id().to_string(),
            username: order.username().to_string(),
            order_total: order.order_total().to_decimal(),
            subtotal: order.subtotal().to_decimal(),
            applied_discounts: order.applied_discounts().iter().map(|s| s.name()).collect(),
            created_at: order.created_at(),
            items: order.lines().iter().map(OrderItemResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
    pub last: bool,
}

impl From<Page<Order>> for PagedResponse<OrderResponse> {
    fn from(page: Page<Order>) -> Self {
        let total_pages = page.total_pages();
        let last = page.is_last();
        Self {
            content: page.content.iter().map(OrderResponse::from).collect(),
            page: page.page,
            size: page.size,
            total_elements: page.total_elements,
            total_pages,
            last,
        }
    }
}

// -- Handlers --

/// POST /api/orders — place an order for the caller.
#[tracing::instrument(skip(state, user, req), fields(username = %user.username))]
pub async fn place(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    user.require_customer()?;

    let lines: Vec<OrderLineRequest> = req.items.iter().map(OrderLineRequest::from).collect();
    let order = state
        .orchestrator
        .place_order(&user.username, &user.role, &user.token, &lines)
        .await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /api/orders — list the caller's own orders.
#[tracing::instrument(skip(state, user), fields(username = %user.username))]
pub async fn list_mine(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<PageParams>,
) -> Result<Json<PagedResponse<OrderResponse>>, ApiError> {
    let page = state
        .queries
        .list_orders_with(
            Some(&user.username),
            params.page,
            params.size,
            &params.sort_by,
            &params.sort_dir,
        )
        .await?;

    Ok(Json(page.into()))
}

/// GET /api/orders/page — list all orders, or one user's. Admin only.
#[tracing::instrument(skip(state, user), fields(username = %user.username))]
pub async fn list_page(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<PageParams>,
) -> Result<Json<PagedResponse<OrderResponse>>, ApiError> {
    user.require_admin()?;

    let page = state
        .queries
        .list_orders_with(
            params.username.as_deref(),
            params.page,
            params.size,
            &params.sort_by,
            &params.sort_dir,
        )
        .await?;

    Ok(Json(page.into()))
}
