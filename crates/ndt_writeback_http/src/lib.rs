//! `reqwest` implementations of the write-back ports.
//!
//! - [`AccessClient`]: identity via the access service's `/user-info/self`
//! - [`SparqlHttpClient`]: SELECT queries against `{store}/{dataset}/query`
//! - [`DirectUpdateDispatcher`]: SPARQL updates against `{store}/{dataset}/update`
//! - [`BufferedEventSink`] + [`HttpRecordTransport`]: the event-sink path

pub mod access;
pub mod direct;
pub mod query;
pub mod sink;

use std::time::Duration;

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use ndt_writeback_core::ForwardedHeaders;

pub use access::AccessClient;
pub use direct::DirectUpdateDispatcher;
pub use query::{Datasets, SparqlHttpClient};
pub use sink::{BufferedEventSink, HttpRecordTransport, RecordTransport};

/// One client per process, shared by every adapter. The timeout bounds every
/// call to the store, the access service and the sink.
pub fn build_client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}

/// Forwarded headers as a `HeaderMap`. Values that are not valid header values
/// are dropped with a warning.
pub(crate) fn header_map(headers: &ForwardedHeaders) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers.iter() {
        let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) else {
            tracing::warn!(header = name, "dropping unforwardable header");
            continue;
        };
        map.insert(name, value);
    }
    map
}

/// Strip trailing slashes so paths can be appended with `format!`.
pub(crate) fn base_url(url: impl Into<String>) -> String {
    url.into().trim_end_matches('/').to_string()
}

/// First 200 characters of an error body, for log and error messages.
pub(crate) async fn body_excerpt(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(200)
        .collect()
}
