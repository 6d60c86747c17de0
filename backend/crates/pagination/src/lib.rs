//! Limit/offset pagination primitives shared by listing endpoints.
//!
//! Listing endpoints accept an optional `limit` and `offset` pair and reply
//! with a [`Page`] envelope carrying the window, the total match count, and a
//! `has_more` flag so clients can paginate without a second counting call.

use serde::{Deserialize, Serialize};

/// Largest window a single request may ask for.
pub const MAX_LIMIT: u32 = 200;

/// Window applied when the client does not send a limit.
pub const DEFAULT_LIMIT: u32 = 50;

/// Validation errors for caller-supplied pagination parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageParamsError {
    /// The limit was zero.
    #[error("limit must be at least 1")]
    ZeroLimit,
    /// The limit exceeded [`MAX_LIMIT`].
    #[error("limit must be at most {MAX_LIMIT}")]
    LimitTooLarge,
}

/// Validated pagination window.
///
/// ## Invariants
/// - `limit` is between 1 and [`MAX_LIMIT`] inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    limit: u32,
    offset: u32,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl PageParams {
    /// Build a window from raw query values, applying defaults.
    pub fn from_raw(limit: Option<u32>, offset: Option<u32>) -> Result<Self, PageParamsError> {
        let limit = match limit {
            None => DEFAULT_LIMIT,
            Some(0) => return Err(PageParamsError::ZeroLimit),
            Some(value) if value > MAX_LIMIT => return Err(PageParamsError::LimitTooLarge),
            Some(value) => value,
        };
        Ok(Self {
            limit,
            offset: offset.unwrap_or(0),
        })
    }

    /// Requested window size.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of matches to skip before the window starts.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Slice a fully materialised result set down to this window.
    ///
    /// Filtering happens before pagination, so `total` reflects every match,
    /// not just the returned page.
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let start = (self.offset as usize).min(total);
        let end = start.saturating_add(self.limit as usize).min(total);
        let window: Vec<T> = items.into_iter().skip(start).take(end - start).collect();
        let has_more = end < total;
        Page {
            items: window,
            total,
            has_more,
        }
    }
}

/// Response envelope for a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items inside the requested window, in result order.
    pub items: Vec<T>,
    /// Total number of matches before the window was applied.
    pub total: usize,
    /// Whether matches exist beyond the end of this window.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Map the item type while keeping the envelope metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            has_more: self.has_more,
        }
    }
}
