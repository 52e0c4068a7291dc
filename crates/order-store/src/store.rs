use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, Page, PageRequest};
use domain::{NewOrder, Order};

use crate::Result;

/// Core trait for order store implementations.
///
/// A store owns orders once they are saved: it assigns the identifier and
/// creation timestamp, and never hands out mutable access afterwards.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order with all of its lines.
    ///
    /// Either the order and every line are stored, or nothing is.
    async fn save(&self, order: NewOrder) -> Result<Order>;

    /// Retrieves a single order.
    ///
    /// Returns None if no order has the given ID.
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>>;

    /// Retrieves one page of a user's orders.
    async fn find_by_username(&self, username: &str, page: &PageRequest) -> Result<Page<Order>>;

    /// Retrieves one page of all orders.
    async fn find_all(&self, page: &PageRequest) -> Result<Page<Order>>;
}

#[async_trait]
impl<T: OrderStore + ?Sized> OrderStore for Arc<T> {
    async fn save(&self, order: NewOrder) -> Result<Order> {
        (**self).save(order).await
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        (**self).find_by_id(id).await
    }

    async fn find_by_username(&self, username: &str, page: &PageRequest) -> Result<Page<Order>> {
        (**self).find_by_username(username, page).await
    }

    async fn find_all(&self, page: &PageRequest) -> Result<Page<Order>> {
        (**self).find_all(page).await
    }
}

/// Error returned when an order is not fit to be saved.
#[derive(Debug, Clone)]
pub struct SaveValidationError {
    pub message: String,
}

impl std::fmt::Display for SaveValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Save validation error: {}", self.message)
    }
}

impl std::error::Error for SaveValidationError {}

/// Validates an order before saving.
pub fn validate_order_for_save(order: &NewOrder) -> std::result::Result<(), SaveValidationError> {
    if order.username.trim().is_empty() {
        return Err(SaveValidationError {
            message: "Order must belong to a user".to_string(),
        });
    }

    if order.lines.is_empty() {
        return Err(SaveValidationError {
            message: "Cannot save an order without lines".to_string(),
        });
    }

    if let Some(line) = order.lines.iter().find(|l| l.quantity == 0) {
        return Err(SaveValidationError {
            message: format!("Line for product {} has zero quantity", line.product_id),
        });
    }

    if order.order_total > order.subtotal {
        return Err(SaveValidationError {
            message: format!(
                "Order total {} exceeds subtotal {}",
                order.order_total, order.subtotal
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;
    use domain::{DiscountPolicy, Money, PricedLine, Role};

    fn new_order(username: &str, lines: Vec<PricedLine>) -> NewOrder {
        let subtotal = PricedLine::subtotal(&lines).unwrap();
        NewOrder::new(username, &DiscountPolicy::price(&Role::User, subtotal), lines)
    }

    #[test]
    fn accepts_well_formed_order() {
        let order = new_order(
            "alice",
            vec![PricedLine::new(ProductId::new(), 1, Money::from_cents(500)).unwrap()],
        );
        assert!(validate_order_for_save(&order).is_ok());
    }

    #[test]
    fn rejects_order_without_lines() {
        let order = new_order("alice", vec![]);
        let err = validate_order_for_save(&order).unwrap_err();
        assert!(err.message.contains("without lines"));
    }

    #[test]
    fn rejects_blank_username() {
        let order = new_order(
            "  ",
            vec![PricedLine::new(ProductId::new(), 1, Money::from_cents(500)).unwrap()],
        );
        assert!(validate_order_for_save(&order).is_err());
    }

    #[test]
    fn rejects_total_above_subtotal() {
        let mut order = new_order(
            "alice",
            vec![PricedLine::new(ProductId::new(), 1, Money::from_cents(500)).unwrap()],
        );
        order.order_total = Money::from_cents(501);
        assert!(validate_order_for_save(&order).is_err());
    }
}
