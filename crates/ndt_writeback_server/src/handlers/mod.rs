//! Route handlers, grouped by concern.

pub mod admin;
pub mod buildings;
pub mod classes;
pub mod meta;
pub mod writes;

use axum::http::HeaderMap;

use ndt_writeback_core::ForwardedHeaders;

/// The whitelisted auth headers of an inbound request.
pub(crate) fn forwarded(headers: &HeaderMap) -> ForwardedHeaders {
    ForwardedHeaders::from_pairs(
        headers
            .iter()
            .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?))),
    )
}
