//! Order placement saga.
//!
//! Placing an order spans the remote catalog service and the local order
//! store, so it cannot be a single transaction. The orchestrator runs:
//! 1. Validate stock
//! 2. Look up prices and apply the discount policy
//! 3. Deduct stock
//! 4. Save the order
//!
//! If the save fails after stock was deducted, the deduction is reversed
//! with a single compensating restore call. A failed restore is reported as
//! a distinct critical error.

pub mod error;
pub mod orchestrator;
pub mod query;
pub mod services;
pub mod state;

pub use error::{Compensation, PlacementError, QueryError, Severity};
pub use orchestrator::OrderOrchestrator;
pub use query::OrderQueryService;
pub use services::{
    AuthToken, CatalogCall, CatalogError, CatalogGateway, HttpCatalogGateway,
    InMemoryCatalogGateway,
};
pub use state::PlacementState;
