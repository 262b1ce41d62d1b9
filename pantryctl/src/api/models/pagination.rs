//! Shared pagination types for API query parameters.
//!
//! All admin list endpoints use offset-based pagination with `skip` and `limit`
//! parameters, plus optional per-resource filters taken from the same query string.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::db::handlers::filters::{FilterField, ListFilter};
use crate::errors::Error;

/// Default number of items to return per page.
pub const DEFAULT_LIMIT: i64 = 10;

/// Maximum number of items that can be requested per page.
pub const MAX_LIMIT: i64 = 100;

/// Standard pagination parameters for admin API list endpoints.
///
/// The `limit` is clamped to ensure it's always between 1 and 100,
/// preventing both zero-result queries and excessive data fetching.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    /// Number of items to skip (default: 0)
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub skip: Option<i64>,

    /// Maximum number of items to return (default: 10, max: 100)
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,
}

impl Pagination {
    /// Get the skip value, defaulting to 0 if not specified.
    #[inline]
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    /// Get the limit value, clamped between 1 and MAX_LIMIT.
    /// Defaults to DEFAULT_LIMIT if not specified.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Get both skip and limit as a tuple, useful for destructuring.
    #[inline]
    pub fn params(&self) -> (i64, i64) {
        (self.skip(), self.limit())
    }
}

/// Query string of a list endpoint: pagination plus any filter parameters.
///
/// Filter parameters are collected loosely here and only become conditions
/// once checked against a repository's allow-list.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    #[serde(flatten)]
    pub filters: HashMap<String, String>,
}

impl ListQuery {
    /// Paginated filter for `/list`.
    pub fn to_filter(&self, allowed: &[FilterField]) -> Result<ListFilter, Error> {
        let (skip, limit) = self.pagination.params();
        self.build(allowed, skip, Some(limit))
    }

    /// Unpaginated filter for `/list-all`.
    pub fn to_unpaginated_filter(&self, allowed: &[FilterField]) -> Result<ListFilter, Error> {
        self.build(allowed, 0, None)
    }

    fn build(&self, allowed: &[FilterField], skip: i64, limit: Option<i64>) -> Result<ListFilter, Error> {
        ListFilter::from_params(allowed, &self.filters, skip, limit).map_err(|invalid| Error::BadRequest {
            message: format!("Invalid value '{}' for filter '{}'", invalid.value, invalid.param),
        })
    }
}

/// Generic paginated response wrapper for list endpoints.
///
/// Wraps a list of items with pagination metadata including total count
/// for client-side pagination calculations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    /// The items for the current page
    pub data: Vec<T>,
    /// Total number of items matching the query (before pagination)
    pub total_count: i64,
    /// Number of items skipped
    pub skip: i64,
    /// Maximum items returned per page
    pub limit: i64,
}

impl<T> PaginatedResponse<T> {
    /// Create a new paginated response
    pub fn new(data: Vec<T>, total_count: i64, skip: i64, limit: i64) -> Self {
        Self {
            data,
            total_count,
            skip,
            limit,
        }
    }

    /// Convert each item, keeping the pagination metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            data: self.data.into_iter().map(f).collect(),
            total_count: self.total_count,
            skip: self.skip,
            limit: self.limit,
        }
    }
}
