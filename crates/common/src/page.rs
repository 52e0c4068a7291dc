//! Paging and sorting parameters for order listings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Errors raised while parsing paging parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// The sort field is not one of the sortable order columns.
    #[error("Unknown sort field: {0}")]
    UnknownSortField(String),

    /// The sort direction is neither `asc` nor `desc`.
    #[error("Unknown sort direction: {0}")]
    UnknownSortDirection(String),

    /// The page size is outside `1..=MAX_PAGE_SIZE`.
    #[error("Invalid page size: {0} (must be between 1 and {max})", max = MAX_PAGE_SIZE)]
    InvalidSize(u32),
}

/// Order attributes a listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortField {
    #[default]
    CreatedAt,
    OrderTotal,
    Username,
    Id,
}

impl SortField {
    /// Returns the external name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "createdAt",
            SortField::OrderTotal => "orderTotal",
            SortField::Username => "username",
            SortField::Id => "id",
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = PageRequestError;

    /// Accepts both camelCase and snake_case spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" | "created_at" => Ok(SortField::CreatedAt),
            "orderTotal" | "order_total" => Ok(SortField::OrderTotal),
            "username" => Ok(SortField::Username),
            "id" | "orderId" | "order_id" => Ok(SortField::Id),
            other => Err(PageRequestError::UnknownSortField(other.to_string())),
        }
    }
}

impl std::fmt::Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = PageRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(PageRequestError::UnknownSortDirection(s.to_string()))
        }
    }
}

/// Sort specification: one field and a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn asc(field: SortField) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: SortField) -> Self {
        Self::new(field, SortDirection::Desc)
    }
}

/// A request for one page of results.
///
/// Pages are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Sort,
}

impl PageRequest {
    /// Creates a page request, rejecting sizes outside `1..=MAX_PAGE_SIZE`.
    pub fn new(page: u32, size: u32, sort: Sort) -> Result<Self, PageRequestError> {
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(PageRequestError::InvalidSize(size));
        }
        Ok(Self { page, size, sort })
    }

    /// Parses raw request parameters.
    pub fn parse(
        page: u32,
        size: u32,
        sort_field: &str,
        sort_direction: &str,
    ) -> Result<Self, PageRequestError> {
        let sort = Sort::new(sort_field.parse()?, sort_direction.parse()?);
        Self::new(page, size, sort)
    }

    /// Returns the first page with the default size and sort.
    pub fn first() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: Sort::default(),
        }
    }

    /// Sets the sort specification.
    pub fn sorted_by(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    /// Number of items to skip before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// One page of results along with totals for the whole result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
}

impl<T> Page<T> {
    /// Builds a page from its content and the total element count.
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
        }
    }

    /// Total number of pages for the result set.
    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total_elements.div_ceil(u64::from(self.size))
    }

    /// Returns true if no page follows this one.
    pub fn is_last(&self) -> bool {
        u64::from(self.page) + 1 >= self.total_pages()
    }

    /// Maps the page content, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_known_fields_and_any_case_direction() {
        let req = PageRequest::parse(2, 20, "orderTotal", "DESC").unwrap();
        assert_eq!(req.page, 2);
        assert_eq!(req.size, 20);
        assert_eq!(req.sort, Sort::desc(SortField::OrderTotal));
        assert_eq!(req.offset(), 40);

        let req = PageRequest::parse(0, 5, "created_at", "asc").unwrap();
        assert_eq!(req.sort, Sort::asc(SortField::CreatedAt));
    }

    #[test]
    fn parse_rejects_unknown_field() {
        let err = PageRequest::parse(0, 10, "name", "asc").unwrap_err();
        assert_eq!(err, PageRequestError::UnknownSortField("name".to_string()));
    }

    #[test]
    fn parse_rejects_unknown_direction() {
        let err = PageRequest::parse(0, 10, "id", "up").unwrap_err();
        assert_eq!(err, PageRequestError::UnknownSortDirection("up".to_string()));
    }

    #[test]
    fn size_bounds_are_enforced() {
        assert_eq!(
            PageRequest::new(0, 0, Sort::default()),
            Err(PageRequestError::InvalidSize(0))
        );
        assert_eq!(
            PageRequest::new(0, MAX_PAGE_SIZE + 1, Sort::default()),
            Err(PageRequestError::InvalidSize(MAX_PAGE_SIZE + 1))
        );
        assert!(PageRequest::new(0, MAX_PAGE_SIZE, Sort::default()).is_ok());
    }

    #[test]
    fn page_totals() {
        let req = PageRequest::new(0, 10, Sort::default()).unwrap();
        let page = Page::new(vec![1, 2, 3], &req, 23);
        assert_eq!(page.total_pages(), 3);
        assert!(!page.is_last());

        let req = PageRequest::new(2, 10, Sort::default()).unwrap();
        let page = Page::new(vec![21, 22, 23], &req, 23);
        assert!(page.is_last());
    }

    #[test]
    fn empty_result_is_last_page() {
        let page: Page<u8> = Page::new(vec![], &PageRequest::first(), 0);
        assert_eq!(page.total_pages(), 0);
        assert!(page.is_last());
    }

    #[test]
    fn map_keeps_metadata() {
        let req = PageRequest::new(1, 2, Sort::default()).unwrap();
        let page = Page::new(vec![1, 2], &req, 4).map(|n| n * 10);
        assert_eq!(page.content, vec![10, 20]);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_elements, 4);
    }
}
