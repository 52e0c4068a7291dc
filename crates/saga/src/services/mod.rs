//! Remote catalog access used by the placement saga.

pub mod catalog;
pub mod http;

pub use catalog::{AuthToken, CatalogCall, CatalogError, CatalogGateway, InMemoryCatalogGateway};
pub use http::HttpCatalogGateway;
