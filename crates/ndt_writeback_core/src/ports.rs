//! Port traits for the external collaborators: identity service, SPARQL query
//! endpoint, update transport and event sink. Implemented by
//! `ndt_writeback_http`. Core logic depends only on these traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::security_label::SecurityLabel;
use crate::sparql::SparqlResults;
use crate::statement::Statement;

/// Inbound headers that may be forwarded to the identity service and store.
pub const FORWARDED_HEADERS: [&str; 4] = [
    "x-amzn-oidc-data",
    "x-amzn-oidc-accesstoken",
    "x-amzn-oidc-identity",
    "Authorization",
];

/// The whitelisted subset of an inbound request's headers. Everything not in
/// [`FORWARDED_HEADERS`] is dropped on construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardedHeaders(Vec<(&'static str, String)>);

impl ForwardedHeaders {
    pub fn none() -> Self {
        Self::default()
    }

    /// Header names match case-insensitively; the whitelist spelling is kept.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut kept: Vec<(&'static str, String)> = Vec::new();
        for (name, value) in pairs {
            if let Some(&allowed) = FORWARDED_HEADERS
                .iter()
                .find(|h| h.eq_ignore_ascii_case(name))
            {
                if !kept.iter().any(|(n, _)| *n == allowed) {
                    kept.push((allowed, value.to_string()));
                }
            }
        }
        Self(kept)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(n, v)| (*n, v.as_str()))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The verified caller, as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub username: String,
    pub user_id: String,
}

/// The two logical datasets in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    /// Class hierarchy.
    Ontology,
    /// Asserted facts.
    Knowledge,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, headers: &ForwardedHeaders) -> Result<Actor>;
}

/// Read side of the store. Implementations prepend the prefix preamble.
#[async_trait]
pub trait SparqlEndpoint: Send + Sync {
    async fn select(
        &self,
        dataset: Dataset,
        query: &str,
        headers: &ForwardedHeaders,
    ) -> Result<SparqlResults>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Synchronous SPARQL update against the store.
    Direct,
    /// Asynchronous, eventually-consistent record hand-off.
    EventSink,
}

/// Write side. Exactly one implementation is wired per process.
///
/// Returning `Ok` is the point of no return for a request.
#[async_trait]
pub trait UpdateDispatcher: Send + Sync {
    fn mode(&self) -> DispatchMode;

    async fn dispatch(
        &self,
        statement: &Statement,
        label: &SecurityLabel,
        headers: &ForwardedHeaders,
    ) -> Result<()>;
}

/// A record handed to the event sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkRecord {
    pub headers: Vec<(String, String)>,
    pub key: Option<String>,
    pub body: String,
}

impl SinkRecord {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Asynchronous sink adapter. `accept` returns once the record is buffered
/// locally; it says nothing about downstream durability.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn accept(&self, record: SinkRecord) -> Result<()>;
}
