//! Page-number pagination helpers.
//!
//! Feeds use classic 1-based page numbers rather than cursors: the page size
//! is fixed per deployment, out-of-range requests clamp to the last available
//! page, and an empty result set yields an empty first page instead of an
//! error.

use serde::Serialize;

/// A resolved pagination window over a known total row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// The page actually served, after clamping.
    pub number: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub limit: u32,
    pub offset: u64,
}

/// Resolve a requested 1-based page number against `total_items` rows.
///
/// Requests below 1 resolve to the first page; requests beyond the end clamp
/// to the last page. A zero-row result still has one (empty) page.
pub fn resolve_page(total_items: u64, page_size: u32, requested: u32) -> PageWindow {
    let size = page_size.max(1);
    let total_pages = (total_items.div_ceil(size as u64)).max(1) as u32;
    let number = requested.clamp(1, total_pages);

    PageWindow {
        number,
        total_pages,
        total_items,
        limit: size,
        offset: (number as u64 - 1) * size as u64,
    }
}

/// One served page of a feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub total_pages: u32,
    pub total_items: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            items,
            number: window.number,
            total_pages: window.total_pages,
            total_items: window.total_items,
        }
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}
