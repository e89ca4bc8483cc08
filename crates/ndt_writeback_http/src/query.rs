//! SPARQL query client (`GET {store}/{dataset}/query?query=…`).

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use ndt_writeback_core::sparql::SparqlResults;
use ndt_writeback_core::{
    Dataset, ForwardedHeaders, PrefixRegistry, Result, SparqlEndpoint, WriteBackError,
};

use crate::{base_url, body_excerpt, header_map};

pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Dataset names on the store.
#[derive(Debug, Clone)]
pub struct Datasets {
    pub ontology: String,
    pub knowledge: String,
}

impl Datasets {
    pub fn name(&self, dataset: Dataset) -> &str {
        match dataset {
            Dataset::Ontology => &self.ontology,
            Dataset::Knowledge => &self.knowledge,
        }
    }
}

impl Default for Datasets {
    fn default() -> Self {
        Self {
            ontology: "ontology".into(),
            knowledge: "knowledge".into(),
        }
    }
}

pub struct SparqlHttpClient {
    http: Client,
    base: String,
    datasets: Datasets,
    prefixes: Arc<PrefixRegistry>,
}

impl SparqlHttpClient {
    pub fn new(
        http: Client,
        base: impl Into<String>,
        datasets: Datasets,
        prefixes: Arc<PrefixRegistry>,
    ) -> Self {
        Self {
            http,
            base: base_url(base),
            datasets,
            prefixes,
        }
    }
}

#[async_trait]
impl SparqlEndpoint for SparqlHttpClient {
    async fn select(
        &self,
        dataset: Dataset,
        query: &str,
        headers: &ForwardedHeaders,
    ) -> Result<SparqlResults> {
        let url = format!("{}/{}/query", self.base, self.datasets.name(dataset));
        let full = self.prefixes.prefixed(query);
        let response = self
            .http
            .get(&url)
            .query(&[("query", full.as_str())])
            .header(reqwest::header::ACCEPT, SPARQL_RESULTS_JSON)
            .headers(header_map(headers))
            .send()
            .await
            .map_err(|e| WriteBackError::store(format!("query to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = body_excerpt(response).await;
            tracing::warn!(%url, status = status.as_u16(), body = %body, "SPARQL query rejected");
            return Err(WriteBackError::store_status(
                status.as_u16(),
                format!("query to {url} returned {status}"),
            ));
        }

        response
            .json::<SparqlResults>()
            .await
            .map_err(|e| WriteBackError::store(format!("unreadable results from {url}: {e}")))
    }
}
