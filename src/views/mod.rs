//! Client-side filtering, sorting and pagination of cached listings.
//!
//! Views never fetch; they operate on the records returned by
//! [`AdminApi`](crate::api::AdminApi). A filter value of `"all"` (or an
//! empty string) means "no filter".

mod agents;
mod transactions;
mod wallets;

pub use agents::{AgentQuery, AgentSort, AgentSummary};
pub use transactions::{TransactionQuery, TransactionSort};
pub use wallets::{WalletQuery, WalletView};

use serde::Serialize;

/// Rows per page on every dashboard table.
pub const PAGE_SIZE: usize = 10;

/// One page of a filtered listing
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of rows after filtering
    pub total: usize,
    /// 1-indexed
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// 1-based position of the first and last row shown, for "x-y of n".
    pub fn range(&self) -> Option<(usize, usize)> {
        if self.items.is_empty() {
            return None;
        }
        let start = (self.page - 1) * self.per_page + 1;
        Some((start, start + self.items.len() - 1))
    }
}

/// Slice `items` into page `page` (1-indexed). Pages outside
/// `1..=total_pages` come back empty.
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(per_page);
    let page_items = if page == 0 {
        Vec::new()
    } else {
        items
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect()
    };
    Page {
        items: page_items,
        total,
        page: page.max(1),
        per_page,
        total_pages,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub(crate) fn apply(self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// `None` for an absent, empty or `"all"` filter.
pub(crate) fn active_filter(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

pub(crate) fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}
