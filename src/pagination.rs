//! Generic page wrapper for list endpoints.

use serde::Serialize;

/// Default number of items per page.
pub const DEFAULT_LIMIT: u32 = 100;

/// Largest page a caller may request.
pub const MAX_LIMIT: u32 = 1000;

/// Validated limit/offset pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub limit: u32,
    pub offset: u32,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// One page of `T` plus the metadata needed to walk the rest.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    /// Current page number (1-indexed)
    pub page: u64,
    /// Total number of pages, never below 1
    pub pages: u64,
}

/// Wrap a result slice with page metadata.
///
/// `page = offset / limit + 1` and `pages = ceil(total / limit)`, both held
/// at 1 or above. A zero limit yields a single page.
pub fn paginate<T>(items: Vec<T>, total: u64, limit: u32, offset: u32) -> Page<T> {
    let (page, pages) = if limit > 0 {
        let limit = u64::from(limit);
        let page = u64::from(offset) / limit + 1;
        let pages = total.div_ceil(limit).max(1);
        (page, pages)
    } else {
        (1, 1)
    };

    Page {
        items,
        total,
        limit,
        offset,
        page,
        pages,
    }
}
