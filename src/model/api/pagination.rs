use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query parameters selecting one page of a listing.
///
/// Pages are numbered from 1. Missing or out-of-range values fall back to
/// sensible defaults instead of failing the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromForm)]
pub struct PaginationRequest {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PaginationRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// The requested page number, at least 1.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// The requested page size, between 1 and [`MAX_PAGE_SIZE`].
    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// How many items precede the requested page.
    pub fn skip(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.limit())
    }

    /// Wrap one page of results together with the pagination metadata.
    pub fn to_paginated<T>(&self, total: u64, items: Vec<T>) -> Paginated<T> {
        Paginated {
            items,
            page: self.page(),
            limit: self.limit(),
            total,
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    /// Total number of items across all pages.
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let pagination = PaginationRequest::default();
        assert_eq!(pagination.page(), 1);
        assert_eq!(pagination.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(pagination.skip(), 0);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let pagination = PaginationRequest::new(0, 10_000);
        assert_eq!(pagination.page(), 1);
        assert_eq!(pagination.limit(), MAX_PAGE_SIZE);
    }

    #[test]
    fn skip_counts_whole_pages() {
        assert_eq!(PaginationRequest::new(3, 20).skip(), 40);
    }
}
