//! Pagination arithmetic and paged results.
//!
//! This module supports both page-number pagination (skip/limit) and
//! identifier-cursor pagination, which stays stable while new documents are
//! inserted.
//!
//! # Page Numbers
//!
//! ```rust
//! use docmodel_core::Paginate;
//!
//! let page = Paginate::new(95, 3, 10);
//! assert_eq!(page.total_pages(), 10);
//! assert_eq!(page.skip(), 20);
//! assert_eq!(page.limit(), 10);
//!
//! // Out of range pages are clamped to the last page.
//! let last = Paginate::new(95, 20, 10);
//! assert_eq!(last.current_page(), 10);
//! assert_eq!(last.skip(), 90);
//! ```
//!
//! # Page Links
//!
//! ```rust
//! use docmodel_core::Paginate;
//!
//! let page = Paginate::new(200, 10, 10);
//! assert!(page.should_show_page_on_ui(8, Some(2)));
//! assert!(!page.should_show_page_on_ui(7, Some(2)));
//! ```

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Page size used when the caller passes one below 1.
pub const DEFAULT_PER_PAGE: u64 = 10;

/// Offsets for one page of a result set.
///
/// Immutable once built. `per_page` is at least 1, `current_page` is at
/// least 1 and never beyond the last page, and `total_pages` is 0 for an
/// empty result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginate {
    total_results: u64,
    current_page: u64,
    per_page: u64,
    total_pages: u64,
}

impl Paginate {
    /// Compute the offsets for `current_page` of `total_results`.
    ///
    /// Signed inputs let callers pass unchecked request parameters; values
    /// below 1 fall back to the defaults.
    pub fn new(total_results: u64, current_page: i64, per_page: i64) -> Self {
        let per_page = if per_page < 1 {
            DEFAULT_PER_PAGE
        } else {
            per_page as u64
        };
        let total_pages = total_results.div_ceil(per_page);

        // An empty result set still reports page 1 so the skip stays at 0.
        let current_page = if current_page < 1 {
            1
        } else {
            (current_page as u64).min(total_pages.max(1))
        };

        Self {
            total_results,
            current_page,
            per_page,
            total_pages,
        }
    }

    /// Total number of matching results.
    pub fn total_results(&self) -> u64 {
        self.total_results
    }

    /// The (clamped) current page, 1-indexed.
    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    /// Results per page.
    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Number of pages, 0 when there are no results.
    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    /// Results to skip to reach the current page.
    pub fn skip(&self) -> u64 {
        self.current_page
            .saturating_sub(1)
            .saturating_mul(self.per_page)
    }

    /// Results to fetch for the current page.
    pub fn limit(&self) -> u64 {
        self.per_page
    }

    /// Whether a page follows the current one.
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Whether a page precedes the current one.
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    /// Whether a link to `page` should be rendered.
    ///
    /// A single page needs no links. Without a window every page is shown.
    /// With a window of `w`, up to `2w + 1` pages around the current page
    /// are shown; near either end the window slides inward instead of being
    /// cut short.
    pub fn should_show_page_on_ui(&self, page: u64, window: Option<u64>) -> bool {
        if self.total_pages <= 1 || page < 1 || page > self.total_pages {
            return false;
        }
        let Some(window) = window else {
            return true;
        };

        let current = self.current_page as i64;
        let total = self.total_pages as i64;
        let window = window.min(self.total_pages) as i64;

        let mut start = current - window;
        let mut end = current + window;
        if start < 1 {
            end += 1 - start;
            start = 1;
        }
        if end > total {
            start -= end - total;
            end = total;
        }
        let start = start.max(1);

        (start..=end).contains(&(page as i64))
    }
}

/// How a paginated lookup should page through results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    /// Page-number pagination with skip/limit.
    Offset {
        /// 1-indexed page; values below 1 mean the first page.
        page: i64,
        /// Page size; values below 1 mean [`DEFAULT_PER_PAGE`].
        per_page: i64,
    },
    /// Identifier-cursor pagination in ascending identifier order.
    After {
        /// Last identifier of the previous page, `None` for the first page.
        after: Option<ObjectId>,
        /// Page size.
        limit: u64,
    },
}

impl PageRequest {
    /// Page-number request.
    pub fn page(page: i64, per_page: i64) -> Self {
        Self::Offset { page, per_page }
    }

    /// Cursor request for the first page.
    pub fn first(limit: u64) -> Self {
        Self::After { after: None, limit }
    }

    /// Cursor request continuing after `id`.
    pub fn after(id: ObjectId, limit: u64) -> Self {
        Self::After {
            after: Some(id),
            limit,
        }
    }
}

/// One page of results with its paging metadata.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// The results.
    pub items: Vec<T>,
    /// Offsets, for page-number requests.
    pub pagination: Option<Paginate>,
    /// Identifier to continue after, for cursor requests that filled the
    /// page.
    pub next_cursor: Option<ObjectId>,
}

impl<T> Page<T> {
    /// A page-number page.
    pub fn offset(items: Vec<T>, pagination: Paginate) -> Self {
        Self {
            items,
            pagination: Some(pagination),
            next_cursor: None,
        }
    }

    /// A cursor page.
    pub fn cursor(items: Vec<T>, next_cursor: Option<ObjectId>) -> Self {
        Self {
            items,
            pagination: None,
            next_cursor,
        }
    }

    /// Number of results in this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the page is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page() {
        let page = Paginate::new(95, 1, 10);
        assert_eq!(page.total_pages(), 10);
        assert_eq!(page.skip(), 0);
        assert_eq!(page.limit(), 10);
        assert!(page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn test_page_clamped_to_last() {
        let page = Paginate::new(95, 20, 10);
        assert_eq!(page.current_page(), 10);
        assert_eq!(page.skip(), 90);
        assert!(!page.has_next());
    }

    #[test]
    fn test_empty_result_set() {
        let page = Paginate::new(0, 1, 10);
        assert_eq!(page.total_pages(), 0);
        assert_eq!(page.current_page(), 1);
        assert_eq!(page.skip(), 0);
    }

    #[test]
    fn test_empty_result_set_ignores_requested_page() {
        let page = Paginate::new(0, 5, 10);
        assert_eq!(page.total_pages(), 0);
        assert_eq!(page.current_page(), 1);
        assert_eq!(page.skip(), 0);
        assert!(!page.has_next());

        let page = Paginate::new(0, i64::MAX, 10);
        assert_eq!(page.current_page(), 1);
        assert_eq!(page.skip(), 0);
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let page = Paginate::new(u64::MAX, i64::MAX, i64::MAX);
        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.current_page(), 3);
        assert_eq!(page.skip(), u64::MAX - 1);
    }

    #[test]
    fn test_invalid_inputs_defaulted() {
        let page = Paginate::new(35, 0, 0);
        assert_eq!(page.per_page(), DEFAULT_PER_PAGE);
        assert_eq!(page.current_page(), 1);
        assert_eq!(page.total_pages(), 4);

        let page = Paginate::new(35, -3, -1);
        assert_eq!(page.current_page(), 1);
        assert_eq!(page.per_page(), DEFAULT_PER_PAGE);
    }

    #[test]
    fn test_single_page_never_shows_links() {
        let page = Paginate::new(5, 1, 10);
        assert_eq!(page.total_pages(), 1);
        assert!(!page.should_show_page_on_ui(1, None));
        assert!(!page.should_show_page_on_ui(1, Some(3)));
    }

    #[test]
    fn test_no_window_shows_all() {
        let page = Paginate::new(200, 10, 10);
        assert!((1..=20).all(|p| page.should_show_page_on_ui(p, None)));
        assert!(!page.should_show_page_on_ui(21, None));
        assert!(!page.should_show_page_on_ui(0, None));
    }

    #[test]
    fn test_window_in_middle() {
        let page = Paginate::new(200, 10, 10);
        for p in 8..=12 {
            assert!(page.should_show_page_on_ui(p, Some(2)), "page {p}");
        }
        assert!(!page.should_show_page_on_ui(7, Some(2)));
        assert!(!page.should_show_page_on_ui(13, Some(2)));
    }

    #[test]
    fn test_window_slides_at_edges() {
        let first = Paginate::new(200, 1, 10);
        let visible: Vec<u64> = (1..=20)
            .filter(|p| first.should_show_page_on_ui(*p, Some(2)))
            .collect();
        assert_eq!(visible, vec![1, 2, 3, 4, 5]);

        let last = Paginate::new(200, 20, 10);
        let visible: Vec<u64> = (1..=20)
            .filter(|p| last.should_show_page_on_ui(*p, Some(2)))
            .collect();
        assert_eq!(visible, vec![16, 17, 18, 19, 20]);
    }

    #[test]
    fn test_window_wider_than_total() {
        let page = Paginate::new(30, 2, 10);
        let visible: Vec<u64> = (1..=3)
            .filter(|p| page.should_show_page_on_ui(*p, Some(5)))
            .collect();
        assert_eq!(visible, vec![1, 2, 3]);
    }

    #[test]
    fn test_page_request_constructors() {
        assert_eq!(
            PageRequest::page(2, 25),
            PageRequest::Offset {
                page: 2,
                per_page: 25
            }
        );
        let id = ObjectId::new();
        assert_eq!(
            PageRequest::after(id, 5),
            PageRequest::After {
                after: Some(id),
                limit: 5
            }
        );
    }

    #[test]
    fn test_page_into_iter() {
        let page = Page::cursor(vec![1, 2, 3], None);
        assert_eq!(page.len(), 3);
        assert_eq!(page.into_iter().sum::<i32>(), 6);
    }
}
