//! Placement and query error types.

use common::PageRequestError;
use domain::{DomainError, ProductId, StockOperation};
use order_store::StoreError;
use thiserror::Error;

use crate::services::CatalogError;
use crate::state::PlacementState;

/// Whether a compensating call was made for a failed placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compensation {
    NotAttempted,
    Completed,
    Failed,
}

/// How a failed placement should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// The caller can fix the request or retry later.
    ClientCorrectable,
    /// The service failed; inventory is consistent.
    Server,
    /// Inventory and orders disagree and need manual reconciliation.
    Critical,
}

/// Errors returned by [`crate::OrderOrchestrator::place_order`].
///
/// Each variant identifies the stage that failed and whether compensation
/// ran, so callers can branch on [`PlacementError::severity`] rather than
/// on the message.
#[derive(Debug, Error)]
pub enum PlacementError {
    /// The request itself is malformed. No remote call was made.
    #[error("Invalid order request: {0}")]
    InvalidRequest(#[from] DomainError),

    /// The catalog reported insufficient stock or refused validation.
    #[error("Stock validation failed: {0}")]
    StockValidationFailed(#[source] CatalogError),

    /// A requested product does not exist in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A product lookup failed for any other reason.
    #[error("Product lookup failed for {product_id}: {source}")]
    ProductLookupFailed {
        product_id: ProductId,
        source: CatalogError,
    },

    /// The catalog refused to deduct stock. Nothing was deducted.
    #[error("Stock deduction failed: {0}")]
    StockDeductionFailed(#[source] CatalogError),

    /// The order could not be saved; deducted stock was restored.
    #[error("Order processing failed: {0}")]
    OrderProcessingFailed(#[source] StoreError),

    /// The order could not be saved and the deducted stock could not be
    /// restored either.
    #[error(
        "Order processing failed and stock restoration failed, manual reconciliation required \
         (save: {save_error}; restore: {restore_error})"
    )]
    CompensationFailed {
        save_error: StoreError,
        restore_error: CatalogError,
        unrestored: Vec<StockOperation>,
    },
}

impl PlacementError {
    /// Returns the state the placement was in when the failure happened.
    pub fn stage(&self) -> PlacementState {
        match self {
            PlacementError::InvalidRequest(_) | PlacementError::StockValidationFailed(_) => {
                PlacementState::Validating
            }
            PlacementError::ProductNotFound(_) | PlacementError::ProductLookupFailed { .. } => {
                PlacementState::Pricing
            }
            PlacementError::StockDeductionFailed(_) => PlacementState::Deducting,
            PlacementError::OrderProcessingFailed(_) => PlacementState::Persisting,
            PlacementError::CompensationFailed { .. } => PlacementState::Compensating,
        }
    }

    /// Returns the terminal state the placement ended in.
    pub fn terminal_state(&self) -> PlacementState {
        match self.compensation() {
            Compensation::NotAttempted => PlacementState::Aborted,
            Compensation::Completed => PlacementState::Compensated,
            Compensation::Failed => PlacementState::CompensationFailed,
        }
    }

    pub fn compensation(&self) -> Compensation {
        match self {
            PlacementError::OrderProcessingFailed(_) => Compensation::Completed,
            PlacementError::CompensationFailed { .. } => Compensation::Failed,
            _ => Compensation::NotAttempted,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            PlacementError::InvalidRequest(_)
            | PlacementError::StockValidationFailed(_)
            | PlacementError::ProductNotFound(_)
            | PlacementError::ProductLookupFailed { .. }
            | PlacementError::StockDeductionFailed(_) => Severity::ClientCorrectable,
            PlacementError::OrderProcessingFailed(_) => Severity::Server,
            PlacementError::CompensationFailed { .. } => Severity::Critical,
        }
    }

    /// Stable machine-readable name, used for metric labels and error codes.
    pub fn kind(&self) -> &'static str {
        match self {
            PlacementError::InvalidRequest(_) => "invalid_request",
            PlacementError::StockValidationFailed(_) => "stock_validation_failed",
            PlacementError::ProductNotFound(_) => "product_not_found",
            PlacementError::ProductLookupFailed { .. } => "product_lookup_failed",
            PlacementError::StockDeductionFailed(_) => "stock_deduction_failed",
            PlacementError::OrderProcessingFailed(_) => "order_processing_failed",
            PlacementError::CompensationFailed { .. } => "compensation_failed",
        }
    }

    /// Returns true if this failure requires out-of-band reconciliation.
    pub fn is_critical(&self) -> bool {
        self.severity() == Severity::Critical
    }
}

/// Errors returned by the order query service.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Paging or sorting parameters were rejected.
    #[error("Invalid page request: {0}")]
    InvalidPageRequest(#[from] PageRequestError),

    /// The order store failed.
    #[error("Order store error: {0}")]
    Store(#[from] StoreError),
}
