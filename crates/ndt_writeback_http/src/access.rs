//! Access service client.

use async_trait::async_trait;
use reqwest::Client;

use ndt_writeback_core::{Actor, ForwardedHeaders, IdentityProvider, Result, WriteBackError};

use crate::{base_url, body_excerpt, header_map};

pub struct AccessClient {
    http: Client,
    base: String,
}

impl AccessClient {
    pub fn new(http: Client, base: impl Into<String>) -> Self {
        Self {
            http,
            base: base_url(base),
        }
    }
}

#[async_trait]
impl IdentityProvider for AccessClient {
    /// `GET {access}/user-info/self`, forwarding only the whitelisted headers.
    async fn resolve(&self, headers: &ForwardedHeaders) -> Result<Actor> {
        let url = format!("{}/user-info/self", self.base);
        let response = self
            .http
            .get(&url)
            .headers(header_map(headers))
            .send()
            .await
            .map_err(|e| {
                WriteBackError::identity(None, format!("access service unreachable: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = body_excerpt(response).await;
            tracing::warn!(
                status = status.as_u16(),
                body = %body,
                "access service rejected caller"
            );
            return Err(WriteBackError::identity(
                Some(status.as_u16()),
                format!("access service returned {status}"),
            ));
        }

        response
            .json::<Actor>()
            .await
            .map_err(|e| WriteBackError::identity(None, format!("unreadable user info: {e}")))
    }
}
