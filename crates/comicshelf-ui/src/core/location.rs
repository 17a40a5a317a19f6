//! Address-bar helpers.
//!
//! # Design
//! - Pure string handling so the router glue stays thin and testable natively.
//! - Query strings are kept in the order the filter encoder produced them.

/// Path of the API relative to the page origin.
pub const API_PATH: &str = "/api";

/// API base URL for a page served from `origin` (e.g. `https://shelf.example`).
#[must_use]
pub fn api_base_from_origin(origin: &str) -> String {
    format!("{}{API_PATH}", origin.trim_end_matches('/'))
}

/// Split `/path?query` into its path and query (without `?`).
#[must_use]
pub fn split_location(location: &str) -> (&str, &str) {
    location.split_once('?').unwrap_or((location, ""))
}

/// Decoded pairs of `query`, in order, for router APIs that re-encode them.
#[must_use]
pub fn query_pairs(query: &str) -> Vec<(String, String)> {
    let query = query.strip_prefix('?').unwrap_or(query);
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// One-based page numbers shown around `current`, clamped to `1..=total`.
#[must_use]
pub fn page_window(current: u32, total: u64, radius: u32) -> Vec<u32> {
    let total = u32::try_from(total).unwrap_or(u32::MAX);
    if total == 0 {
        return Vec::new();
    }
    let current = current.clamp(1, total);
    let start = current.saturating_sub(radius).max(1);
    let end = current.saturating_add(radius).min(total);
    (start..=end).collect()
}
