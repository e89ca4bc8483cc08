//! Direct dispatch: a synchronous SPARQL update against the knowledge dataset.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;

use ndt_writeback_core::security_label::SECURITY_LABEL_HEADER;
use ndt_writeback_core::{
    DispatchMode, ForwardedHeaders, PrefixRegistry, Result, SecurityLabel, Statement,
    UpdateDispatcher, WriteBackError,
};

use crate::{base_url, body_excerpt, header_map};

pub const SPARQL_UPDATE: &str = "application/sparql-update";

pub struct DirectUpdateDispatcher {
    http: Client,
    update_url: String,
    prefixes: Arc<PrefixRegistry>,
}

impl DirectUpdateDispatcher {
    /// Updates go to `{store}/{dataset}/update`.
    pub fn new(
        http: Client,
        store: impl Into<String>,
        dataset: &str,
        prefixes: Arc<PrefixRegistry>,
    ) -> Self {
        Self {
            http,
            update_url: format!("{}/{dataset}/update", base_url(store)),
            prefixes,
        }
    }
}

#[async_trait]
impl UpdateDispatcher for DirectUpdateDispatcher {
    fn mode(&self) -> DispatchMode {
        DispatchMode::Direct
    }

    async fn dispatch(
        &self,
        statement: &Statement,
        label: &SecurityLabel,
        headers: &ForwardedHeaders,
    ) -> Result<()> {
        let body = self.prefixes.prefixed(&statement.to_insert_data());
        let response = self
            .http
            .post(&self.update_url)
            .headers(header_map(headers))
            .header(ACCEPT, "*/*")
            .header(SECURITY_LABEL_HEADER, label.serialize())
            .header(CONTENT_TYPE, SPARQL_UPDATE)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                WriteBackError::store(format!("update to {} failed: {e}", self.update_url))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = body_excerpt(response).await;
            tracing::error!(
                url = %self.update_url,
                status = status.as_u16(),
                body = %body,
                "SPARQL update rejected"
            );
            return Err(WriteBackError::store_status(
                status.as_u16(),
                format!("update to {} returned {status}", self.update_url),
            ));
        }
        tracing::debug!(triples = statement.len(), "SPARQL update applied");
        Ok(())
    }
}
