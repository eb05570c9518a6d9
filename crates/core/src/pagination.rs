//! Page detection, planning and merging
//!
//! After page 1 arrives the engine reads a [`PageInfo`] from it, turns that
//! into a [`PagePlan`] and, for merged calls, folds every page into one
//! result with [`merge_pages`].

use std::ops::RangeInclusive;

use serde_json::{json, Value};
use tradelink_domain::constants::{
    PAGE_NUMBER_FIELD, PAGINATION_FIELD, PAGINATION_RESULT_FIELD, TOTAL_PAGES_FIELD,
};

use crate::tree::{lookup, merge_page, parse_number, set_path, OptionsTree};

/// Reads the current page and page count from a normalized reply
pub type PageExtractor = fn(&Value) -> PageInfo;

/// Places a page number into the options of a follow-up request
pub type PageInjector = fn(&mut OptionsTree, u32);

/// Pagination position reported by one reply
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageInfo {
    pub page_number: f64,
    pub total_pages: f64,
}

impl PageInfo {
    pub fn new(page_number: f64, total_pages: f64) -> Self {
        Self { page_number, total_pages }
    }

    /// What remains to be fetched after page 1
    pub fn plan(&self) -> PagePlan {
        if self.page_number >= self.total_pages {
            return PagePlan::Single;
        }
        let last = clamp_page(self.total_pages.ceil());
        if last < 2 {
            PagePlan::Single
        } else {
            PagePlan::Remaining(2..=last)
        }
    }
}

fn clamp_page(value: f64) -> u32 {
    if value <= 0.0 {
        0
    } else if value >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let page = value as u32;
        page
    }
}

/// Reply-level pagination reading: top-level `PageNumber` and
/// `PaginationResult.TotalNumberOfPages`, each 0 when absent.
pub fn default_page_info(reply: &Value) -> PageInfo {
    PageInfo {
        page_number: parse_number(lookup(reply, &[PAGE_NUMBER_FIELD])).unwrap_or(0.0),
        total_pages: parse_number(lookup(reply, &[PAGINATION_RESULT_FIELD, TOTAL_PAGES_FIELD]))
            .unwrap_or(0.0),
    }
}

/// Sets `Pagination.PageNumber` at the top level of the options.
pub fn inject_page_number(options: &mut OptionsTree, page: u32) {
    set_path(options, &[PAGINATION_FIELD, PAGE_NUMBER_FIELD], json!(page));
}

/// Requests still to be issued once page 1 is classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagePlan {
    /// Page 1 was the only page
    Single,
    /// Pages 2 through the last page, inclusive
    Remaining(RangeInclusive<u32>),
}

impl PagePlan {
    /// Remaining page numbers in ascending order, yielded lazily
    pub fn pages(&self) -> RangeInclusive<u32> {
        match self {
            Self::Single => RangeInclusive::new(1, 0),
            Self::Remaining(range) => range.clone(),
        }
    }

    /// Remaining pages grouped into consecutive batches of `size`.
    ///
    /// Batches are produced on demand; only the batch being handed out is
    /// materialized.
    pub fn batches(&self, size: usize) -> impl Iterator<Item = Vec<u32>> {
        let size = size.max(1);
        let mut pages = self.pages();
        std::iter::from_fn(move || {
            let batch: Vec<u32> = pages.by_ref().take(size).collect();
            (!batch.is_empty()).then_some(batch)
        })
    }

    /// Total requests for the call, page 1 included
    pub fn request_count(&self) -> u64 {
        match self {
            Self::Single => 1,
            Self::Remaining(range) if range.is_empty() => 1,
            Self::Remaining(range) => u64::from(*range.end()) - u64::from(*range.start()) + 2,
        }
    }
}

/// Fold pages in the given (ascending) order and drop the per-page
/// `PageNumber` from the merged root.
pub fn merge_pages(pages: Vec<Value>) -> Value {
    let mut pages = pages.into_iter();
    let Some(mut merged) = pages.next() else {
        return Value::Object(OptionsTree::new());
    };
    for page in pages {
        merge_page(&mut merged, page);
    }
    if let Value::Object(root) = &mut merged {
        root.shift_remove(PAGE_NUMBER_FIELD);
    }
    merged
}
