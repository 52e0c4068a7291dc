//! Domain layer for the order placement service.
//!
//! This crate provides:
//! - Money arithmetic in integer cents, with decimal factor application
//! - Line, stock-operation and catalog snapshot value objects
//! - The `Order` aggregate as persisted by the order store
//! - The discount policy that turns a subtotal into the final order total

pub mod error;
pub mod order;
pub mod pricing;

pub use common::{OrderId, ProductId};
pub use error::DomainError;
pub use order::{
    CatalogProduct, Money, NewOrder, Order, OrderLineRequest, PricedLine, StockOperation,
};
pub use pricing::{DiscountPolicy, DiscountStep, PricingResult, Role, RoleDiscount};
