//! Paging parameters and the paginated result envelope.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::links::Link;
use crate::QueryError;

/// Validated page request: page is 1-indexed, page size is in `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    page_size: i64,
}

impl PageRequest {
    pub const DEFAULT_PAGE: i64 = 1;
    pub const DEFAULT_PAGE_SIZE: i64 = 10;
    pub const MAX_PAGE_SIZE: i64 = 100;

    pub fn new(page: i64, page_size: i64) -> Result<Self, QueryError> {
        if page < 1 {
            return Err(QueryError::InvalidPage("page must be >= 1".to_string()));
        }
        if !(1..=Self::MAX_PAGE_SIZE).contains(&page_size) {
            return Err(QueryError::InvalidPage(format!(
                "pageSize must be between 1 and {}",
                Self::MAX_PAGE_SIZE
            )));
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// Rows to skip before this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Rows to take for this page.
    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: Self::DEFAULT_PAGE,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of items with paging metadata and optional collection links.
///
/// Out-of-range pages are not clamped: a page past the end simply holds no
/// items.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationResult<T> {
    pub items: Vec<T>,
    page: i64,
    page_size: i64,
    total_count: i64,
    links: Option<Vec<Link>>,
}

impl<T> PaginationResult<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_count: i64) -> Self {
        Self {
            items,
            page: request.page(),
            page_size: request.page_size(),
            total_count,
            links: None,
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn total_count(&self) -> i64 {
        self.total_count
    }

    pub fn total_pages(&self) -> i64 {
        (self.total_count + self.page_size - 1) / self.page_size
    }

    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }

    pub fn has_next_page(&self) -> bool {
        self.page.saturating_mul(self.page_size) < self.total_count
    }

    pub fn links(&self) -> Option<&[Link]> {
        self.links.as_deref()
    }

    pub fn with_links(mut self, links: Vec<Link>) -> Self {
        self.links = Some(links);
        self
    }
}

impl<T: Serialize> Serialize for PaginationResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.links.is_some() { 8 } else { 7 };
        let mut state = serializer.serialize_struct("PaginationResult", len)?;
        state.serialize_field("items", &self.items)?;
        state.serialize_field("page", &self.page)?;
        state.serialize_field("pageSize", &self.page_size)?;
        state.serialize_field("totalCount", &self.total_count)?;
        state.serialize_field("totalPages", &self.total_pages())?;
        state.serialize_field("hasPreviousPage", &self.has_previous_page())?;
        state.serialize_field("hasNextPage", &self.has_next_page())?;
        if let Some(links) = &self.links {
            state.serialize_field("links", links)?;
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(total: i64, page: i64, page_size: i64) -> PaginationResult<u32> {
        PaginationResult::new(Vec::new(), PageRequest::new(page, page_size).unwrap(), total)
    }

    #[test]
    fn page_request_bounds() {
        assert!(PageRequest::new(0, 10).is_err());
        assert!(PageRequest::new(1, 0).is_err());
        assert!(PageRequest::new(1, 101).is_err());
        assert!(PageRequest::new(1, 100).is_ok());
    }

    #[test]
    fn offset_and_limit() {
        let request = PageRequest::new(3, 10).unwrap();
        assert_eq!(request.offset(), 20);
        assert_eq!(request.limit(), 10);
        assert_eq!(PageRequest::default().offset(), 0);
    }

    #[test]
    fn last_page_has_previous_but_no_next() {
        let page = result(25, 3, 10);
        assert!(!page.has_next_page());
        assert!(page.has_previous_page());
        assert_eq!(page.total_pages(), 3);
    }

    #[test]
    fn first_page_has_no_previous() {
        let page = result(25, 1, 10);
        assert!(page.has_next_page());
        assert!(!page.has_previous_page());
    }

    #[test]
    fn page_past_the_end_is_not_clamped() {
        let page = result(5, 4, 10);
        assert_eq!(page.page(), 4);
        assert!(!page.has_next_page());
        assert!(page.has_previous_page());
    }

    #[test]
    fn exact_multiple_has_no_next() {
        assert!(!result(20, 2, 10).has_next_page());
        assert!(result(21, 2, 10).has_next_page());
    }

    #[test]
    fn serializes_camel_case_with_derived_flags() {
        let page = PaginationResult::new(vec![1u32, 2], PageRequest::new(2, 2).unwrap(), 5);
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "items": [1, 2],
                "page": 2,
                "pageSize": 2,
                "totalCount": 5,
                "totalPages": 3,
                "hasPreviousPage": true,
                "hasNextPage": true
            })
        );
    }
}
