//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use saga::{PlacementError, QueryError};
use serde_json::json;

use crate::auth::AuthError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or invalid credentials.
    Unauthorized(AuthError),
    /// Authenticated, but the role does not allow the operation.
    Forbidden(String),
    /// Order placement failed.
    Placement(PlacementError),
    /// Order listing failed.
    Query(QueryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthorized(err) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": err.to_string() }),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            ApiError::Placement(err) => placement_error_to_response(err),
            ApiError::Query(err) => query_error_to_response(err),
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Status code for each placement failure.
pub fn placement_status(err: &PlacementError) -> StatusCode {
    match err {
        PlacementError::InvalidRequest(_)
        | PlacementError::ProductNotFound(_)
        | PlacementError::ProductLookupFailed { .. } => StatusCode::BAD_REQUEST,
        PlacementError::StockValidationFailed(_) | PlacementError::StockDeductionFailed(_) => {
            StatusCode::CONFLICT
        }
        PlacementError::OrderProcessingFailed(_) | PlacementError::CompensationFailed { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn placement_error_to_response(err: PlacementError) -> (StatusCode, serde_json::Value) {
    let status = placement_status(&err);
    let body = json!({
        "error": err.to_string(),
        "code": err.kind().to_ascii_uppercase(),
        "stage": err.stage().as_str(),
        "critical": err.is_critical(),
    });
    (status, body)
}

fn query_error_to_response(err: QueryError) -> (StatusCode, serde_json::Value) {
    match &err {
        QueryError::InvalidPageRequest(_) => {
            (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() }))
        }
        QueryError::Store(_) => {
            tracing::error!(error = %err, "order query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": err.to_string() }),
            )
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err)
    }
}

impl From<PlacementError> for ApiError {
    fn from(err: PlacementError) -> Self {
        ApiError::Placement(err)
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::Query(err)
    }
}
