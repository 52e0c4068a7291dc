//! Order aggregate and related value objects.

mod aggregate;
mod value_objects;

pub use aggregate::{NewOrder, Order};
pub use value_objects::{CatalogProduct, Money, OrderLineRequest, PricedLine, StockOperation};
