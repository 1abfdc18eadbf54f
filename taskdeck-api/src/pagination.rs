/// Pagination query parameters and page math
///
/// Listing endpoints take `?page=&per_page=` (defaults 1 and 10) and
/// answer with `total`, `pages`, and `current_page` alongside their items.

use serde::Deserialize;

const DEFAULT_PER_PAGE: i64 = 10;
const MAX_PER_PAGE: i64 = 100;

/// Query parameters accepted by every listing endpoint
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    /// 1-based page number
    pub page: Option<i64>,

    /// Items per page (clamped to 1..=100)
    pub per_page: Option<i64>,
}

impl PageParams {
    /// Effective page number, at least 1
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Effective page size, clamped into 1..=100
    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }

    /// Row offset for the effective page
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.per_page()
    }

    /// Total page count for `total` rows at this page size
    pub fn pages(&self, total: i64) -> i64 {
        let per_page = self.per_page();
        (total + per_page - 1) / per_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<i64>, per_page: Option<i64>) -> PageParams {
        PageParams { page, per_page }
    }

    #[test]
    fn test_defaults() {
        let p = params(None, None);
        assert_eq!(p.page(), 1);
        assert_eq!(p.per_page(), 10);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_offset_math() {
        let p = params(Some(3), Some(20));
        assert_eq!(p.offset(), 40);
    }

    #[test]
    fn test_page_floor_is_one() {
        assert_eq!(params(Some(0), None).page(), 1);
        assert_eq!(params(Some(-5), None).page(), 1);
    }

    #[test]
    fn test_per_page_clamped() {
        assert_eq!(params(None, Some(0)).per_page(), 1);
        assert_eq!(params(None, Some(1000)).per_page(), 100);
    }

    #[test]
    fn test_pages_rounds_up() {
        let p = params(None, Some(10));
        assert_eq!(p.pages(0), 0);
        assert_eq!(p.pages(1), 1);
        assert_eq!(p.pages(10), 1);
        assert_eq!(p.pages(11), 2);
        assert_eq!(p.pages(95), 10);
    }
}
