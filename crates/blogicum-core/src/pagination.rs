//! Page-number pagination.

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Page size used by every listing unless configured otherwise.
pub const DEFAULT_PER_PAGE: u64 = 10;

/// A 1-based page number and a page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page,
            per_page: per_page.max(1),
        }
    }

    pub fn first(per_page: u64) -> Self {
        Self::new(1, per_page)
    }

    /// Number of items skipped before this page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.per_page
    }

    /// Validate the page number against a listing of `total_items`.
    /// Returns the number of pages. An empty listing still has one page.
    pub fn validate(&self, total_items: u64) -> Result<u64, DomainError> {
        let num_pages = num_pages(total_items, self.per_page);
        if self.page < 1 || self.page > num_pages {
            return Err(DomainError::PageOutOfRange {
                page: self.page,
                last: num_pages,
            });
        }
        Ok(num_pages)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PER_PAGE)
    }
}

fn num_pages(total_items: u64, per_page: u64) -> u64 {
    total_items.div_ceil(per_page).max(1)
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub num_pages: u64,
}

impl<T> Page<T> {
    /// Assemble a page from an already-fetched slice of items.
    pub fn new(
        items: Vec<T>,
        request: PageRequest,
        total_items: u64,
    ) -> Result<Self, DomainError> {
        let num_pages = request.validate(total_items)?;
        Ok(Self {
            items,
            number: request.page,
            per_page: request.per_page,
            total_items,
            num_pages,
        })
    }

    /// Cut the requested page out of a complete, ordered listing.
    pub fn slice(all: Vec<T>, request: PageRequest) -> Result<Self, DomainError> {
        let total_items = all.len() as u64;
        request.validate(total_items)?;

        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.per_page as usize)
            .collect();
        Self::new(items, request, total_items)
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            per_page: self.per_page,
            total_items: self.total_items,
            num_pages: self.num_pages,
        }
    }
}
