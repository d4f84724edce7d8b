//! Page requests and page results.

use serde::{Deserialize, Serialize};

/// Largest page size a caller may request.
pub const MAX_PER_PAGE: u32 = 250;

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 50,
        }
    }
}

impl Pagination {
    /// Build a request, clamping `page` to ≥ 1 and `per_page` to `1..=MAX_PER_PAGE`.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.per_page as usize
    }

    pub fn limit(&self) -> usize {
        self.per_page as usize
    }
}

/// One page of a filtered result set.
///
/// `total` is always the size of the whole filtered set, never the size of
/// this page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Assemble a page from an already-sliced item list and the full-set count.
    pub fn from_parts(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        let per_page = pagination.per_page.max(1);
        let total_pages = total.div_ceil(per_page as u64) as u32;
        Self {
            items,
            total,
            page: pagination.page.max(1),
            per_page,
            total_pages,
        }
    }

    /// Slice a fully filtered set into the requested page.
    pub fn paginate(all: Vec<T>, pagination: Pagination) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(pagination.offset())
            .take(pagination.limit())
            .collect();
        Self::from_parts(items, total, pagination)
    }

}
