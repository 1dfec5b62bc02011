//! # Page Break Decisions
//!
//! Which line items go on which table page, and whether the footer still
//! fits below the totals.
//!
//! The first page shares its height with the header and customer block, so
//! it takes fewer rows (15) than a continuation page (25). Page `k >= 1`
//! therefore starts at `first + (k - 1) * capacity`, which for the defaults
//! is `k * 25 - 10`.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::FolioError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginationOptions {
    /// Rows available on the first page, below the header and customer block.
    /// Setting this equal to `page_capacity` gives plain `k * capacity` slicing.
    pub first_page_capacity: usize,
    /// Rows available on each continuation page.
    pub page_capacity: usize,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            first_page_capacity: 15,
            page_capacity: 25,
        }
    }
}

/// The contiguous run of line items printed on one table page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSlice {
    pub page_index: usize,
    pub items: Range<usize>,
}

impl PageSlice {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Number of table pages needed for `total_items`.
///
/// Matches `ceil(n / capacity)` (plus one when a single page's worth of
/// items overflows the first page) wherever that count covers every item,
/// and grows past it where it would not. Never less than one: the first
/// page always carries the table header.
pub fn table_page_count(total_items: usize, options: &PaginationOptions) -> usize {
    let first = options.first_page_capacity.max(1);
    let capacity = options.page_capacity.max(1);
    if total_items <= first {
        return 1;
    }
    1 + (total_items - first).div_ceil(capacity)
}

/// Split `total_items` line items into per-page slices.
pub fn plan_pages(total_items: usize, options: &PaginationOptions) -> Vec<PageSlice> {
    let first = options.first_page_capacity.max(1);
    let capacity = options.page_capacity.max(1);
    let pages = table_page_count(total_items, options);

    (0..pages)
        .map(|page_index| {
            let (start, end) = if page_index == 0 {
                (0, first)
            } else {
                let start = first + (page_index - 1) * capacity;
                (start, start + capacity)
            };
            PageSlice {
                page_index,
                items: start.min(total_items)..end.min(total_items),
            }
        })
        .collect()
}

/// Check that `plan` covers `0..total_items` exactly once, in order.
pub fn verify_plan(plan: &[PageSlice], total_items: usize) -> Result<(), FolioError> {
    let mut next = 0;
    for slice in plan {
        if slice.items.start != next {
            return Err(FolioError::PaginationOverflow(format!(
                "page {} starts at item {} but item {} is next",
                slice.page_index + 1,
                slice.items.start,
                next
            )));
        }
        next = slice.items.end;
    }
    if next != total_items {
        return Err(FolioError::PaginationOverflow(format!(
            "plan covers {} of {} items",
            next, total_items
        )));
    }
    Ok(())
}

/// Where the payment/terms/contact footer goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FooterPlacement {
    /// Directly below the totals on the last table page.
    SameFlow,
    /// On a freshly appended page.
    NewPageOverflow,
}

/// Inputs to the footer decision for the last table page.
#[derive(Debug, Clone, Copy)]
pub struct FooterFit {
    pub items_on_page: usize,
    pub item_limit: usize,
    /// Where the footer would start on this page.
    pub footer_top: f64,
    pub footer_height: f64,
    /// Lowest y the footer may reach.
    pub floor: f64,
}

pub fn decide_footer(fit: &FooterFit) -> FooterPlacement {
    if fit.items_on_page >= fit.item_limit {
        return FooterPlacement::NewPageOverflow;
    }
    if fit.footer_top + fit.footer_height > fit.floor {
        return FooterPlacement::NewPageOverflow;
    }
    FooterPlacement::SameFlow
}
