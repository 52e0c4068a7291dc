//! HTTP catalog gateway tests against a local stub catalog.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use domain::{Money, ProductId, StockOperation};
use saga::{AuthToken, CatalogError, CatalogGateway, HttpCatalogGateway};
use serde_json::json;
use tokio::sync::Mutex;

const TOKEN: &str = "token-xyz";

#[derive(Clone, Default)]
struct StubCatalog {
    stock: Arc<Mutex<HashMap<ProductId, u32>>>,
    prices: Arc<Mutex<HashMap<ProductId, f64>>>,
    restores: Arc<Mutex<Vec<Vec<StockOperation>>>>,
    fail_restore: Arc<Mutex<bool>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" }))).into_response()
}

async fn validate(
    State(stub): State<StubCatalog>,
    headers: HeaderMap,
    Json(items): Json<Vec<StockOperation>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let stock = stub.stock.lock().await;
    for item in &items {
        if stock.get(&item.product_id).copied().unwrap_or(0) < item.quantity {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "Insufficient stock" })),
            )
                .into_response();
        }
    }
    StatusCode::OK.into_response()
}

async fn deduct(
    State(stub): State<StubCatalog>,
    headers: HeaderMap,
    Json(items): Json<Vec<StockOperation>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut stock = stub.stock.lock().await;
    for item in &items {
        if let Some(level) = stock.get_mut(&item.product_id) {
            *level = level.saturating_sub(item.quantity);
        }
    }
    StatusCode::OK.into_response()
}

async fn restore(
    State(stub): State<StubCatalog>,
    headers: HeaderMap,
    Json(items): Json<Vec<StockOperation>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if *stub.fail_restore.lock().await {
        return (StatusCode::INTERNAL_SERVER_ERROR, "database offline").into_response();
    }
    stub.restores.lock().await.push(items);
    StatusCode::OK.into_response()
}

async fn product(
    State(stub): State<StubCatalog>,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    match stub.prices.lock().await.get(&id) {
        Some(price) => Json(json!({
            "id": id,
            "name": "Widget",
            "description": "A widget",
            "price": price,
            "quantity": 10,
            "available": true
        }))
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Product not found" })),
        )
            .into_response(),
    }
}

/// Starts the stub catalog on an ephemeral port and returns its base URL.
async fn start_stub(stub: StubCatalog) -> String {
    let app = Router::new()
        .route("/api/products/validate-stock", post(validate))
        .route("/api/products/deduct-stock", post(deduct))
        .route("/api/products/restore-stock", post(restore))
        .route("/api/products/{id}", get(product))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/api/products")
}

async fn setup() -> (HttpCatalogGateway, StubCatalog, ProductId) {
    let stub = StubCatalog::default();
    let id = ProductId::new();
    stub.stock.lock().await.insert(id, 5);
    stub.prices.lock().await.insert(id, 19.99);

    let base = start_stub(stub.clone()).await;
    let gateway = HttpCatalogGateway::new(base, Duration::from_secs(5)).unwrap();
    (gateway, stub, id)
}

#[tokio::test]
async fn validate_and_deduct_forward_the_token() {
    let (gateway, stub, id) = setup().await;
    let token = AuthToken::new(TOKEN);
    let items = [StockOperation::new(id, 2)];

    gateway.validate_stock(&items, &token).await.unwrap();
    gateway.deduct_stock(&items, &token).await.unwrap();

    assert_eq!(stub.stock.lock().await.get(&id), Some(&3));
}

#[tokio::test]
async fn insufficient_stock_is_rejected_with_message() {
    let (gateway, _, id) = setup().await;
    let token = AuthToken::new(TOKEN);

    let err = gateway
        .validate_stock(&[StockOperation::new(id, 6)], &token)
        .await
        .unwrap_err();

    assert_eq!(err, CatalogError::Rejected("Insufficient stock".to_string()));
}

#[tokio::test]
async fn wrong_token_is_rejected() {
    let (gateway, _, id) = setup().await;

    let err = gateway
        .validate_stock(&[StockOperation::new(id, 1)], &AuthToken::new("other"))
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::Rejected(_)));
}

#[tokio::test]
async fn get_product_converts_price_to_money() {
    let (gateway, _, id) = setup().await;

    let product = gateway
        .get_product(id, &AuthToken::new(TOKEN))
        .await
        .unwrap();

    assert_eq!(product.id, id);
    assert_eq!(product.unit_price, Money::from_cents(1999));
    assert_eq!(product.name.as_deref(), Some("Widget"));
    assert!(product.available);
}

#[tokio::test]
async fn missing_product_is_not_found() {
    let (gateway, _, _) = setup().await;
    let missing = ProductId::new();

    let err = gateway
        .get_product(missing, &AuthToken::new(TOKEN))
        .await
        .unwrap_err();

    assert_eq!(err, CatalogError::ProductNotFound(missing));
}

#[tokio::test]
async fn restore_sends_the_items() {
    let (gateway, stub, id) = setup().await;
    let items = vec![StockOperation::new(id, 2)];

    gateway
        .restore_stock(&items, &AuthToken::new(TOKEN))
        .await
        .unwrap();

    assert_eq!(*stub.restores.lock().await, vec![items]);
}

#[tokio::test]
async fn server_error_is_transport_failure() {
    let (gateway, stub, id) = setup().await;
    *stub.fail_restore.lock().await = true;

    let err = gateway
        .restore_stock(&[StockOperation::new(id, 1)], &AuthToken::new(TOKEN))
        .await
        .unwrap_err();

    match err {
        CatalogError::Transport(message) => {
            assert!(message.contains("500"));
            assert!(message.contains("database offline"));
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_catalog_is_transport_failure() {
    // Nothing listens on port 9 locally
    let gateway =
        HttpCatalogGateway::new("http://127.0.0.1:9/api/products", Duration::from_secs(2))
            .unwrap();

    let err = gateway
        .validate_stock(&[StockOperation::new(ProductId::new(), 1)], &AuthToken::new(TOKEN))
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::Transport(_)));
}
