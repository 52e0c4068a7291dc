//! Domain error types.

use common::ProductId;
use thiserror::Error;

/// Errors raised by domain validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A placement request must carry at least one line.
    #[error("Order has no lines")]
    NoLines,

    /// Line quantity must be at least one.
    #[error("Invalid quantity for product {product_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    /// A catalog price that cannot be represented as a non-negative amount.
    #[error("Invalid price for product {product_id}: {price}")]
    InvalidPrice { product_id: ProductId, price: String },

    /// Unit price times quantity does not fit in a money amount.
    #[error("Line total for product {product_id} is too large")]
    AmountOverflow { product_id: ProductId },

    /// The sum of the line totals does not fit in a money amount.
    #[error("Order subtotal is too large")]
    SubtotalOverflow,
}
