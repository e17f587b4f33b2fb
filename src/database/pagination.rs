use serde::{Deserialize, Serialize};

use crate::MAX_PAGE_SIZE;

/// 1-based page request
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct PageRequest {
    #[serde(default = "first_page")]
    pub page: i64,
    pub limit: Option<i64>,
}

fn first_page() -> i64 {
    1
}

impl PageRequest {
    pub fn new(page: i64, limit: Option<i64>) -> Self {
        Self { page, limit }
    }

    /// Client `limit` if positive, capped at `MAX_PAGE_SIZE`
    pub fn page_size(&self, default: i64) -> i64 {
        self.limit
            .filter(|limit| *limit > 0)
            .unwrap_or(default)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Saturates instead of overflowing on absurd page numbers; such a page
    /// is simply empty.
    pub fn offset(&self, default: i64) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.page_size(default))
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, page_size: i64, page: i64) -> Self {
        if rows.is_empty() {
            return Self::no_rows(total_rows);
        }
        let page = page.max(1);
        let page_count = if total_rows > 0 {
            (total_rows - 1) / page_size.max(1) + 1
        } else {
            0
        };

        Self {
            count: total_rows,
            next: (page < page_count).then_some(page + 1),
            previous: (page > 1).then_some(page - 1),
            results: rows,
        }
    }

    pub fn no_rows(total_rows: i64) -> Self {
        Self {
            count: total_rows,
            next: None,
            previous: None,
            results: vec![],
        }
    }
}
