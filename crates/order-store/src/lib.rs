//! Order persistence.
//!
//! [`OrderStore`] is the seam the orchestrator saves through and the query
//! side reads from. Two implementations are provided:
//! - [`InMemoryOrderStore`] for tests and local runs, with failure injection
//! - [`PostgresOrderStore`] backed by `sqlx`

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::{OrderId, Page, PageRequest};
pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use store::OrderStore;
