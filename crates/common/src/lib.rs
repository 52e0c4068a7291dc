//! Identifiers and paging primitives shared by every crate in the workspace.

pub mod page;
pub mod types;

pub use page::{Page, PageRequest, PageRequestError, Sort, SortDirection, SortField};
pub use types::{OrderId, ProductId};
