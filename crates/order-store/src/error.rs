use common::OrderId;
use thiserror::Error;

use crate::store::SaveValidationError;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row could not be mapped back onto an order.
    #[error("Corrupt order {order_id}: {reason}")]
    CorruptRow { order_id: OrderId, reason: String },

    /// The order failed pre-save validation.
    #[error("{0}")]
    InvalidOrder(#[from] SaveValidationError),

    /// The store refused the operation.
    #[error("Order store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
