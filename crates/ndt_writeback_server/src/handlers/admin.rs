//! Runtime settings: the URI stub for minted identifiers and the default
//! security label. Changes apply to requests that start after the call.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use ndt_writeback_core::{SecurityLabel, WriteBackError};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UriStubQuery {
    pub uri: Option<String>,
}

/// GET /uri-stub
pub async fn get_uri_stub(Extension(state): Extension<AppState>) -> Json<String> {
    Json(state.service.settings().uri_stub().await.to_string())
}

/// POST /uri-stub?uri=...
pub async fn set_uri_stub(
    Extension(state): Extension<AppState>,
    query: Result<Query<UriStubQuery>, QueryRejection>,
) -> Result<StatusCode, AppError> {
    let Query(query) = query?;
    let uri = query.uri.ok_or_else(|| WriteBackError::missing("uri"))?;
    state.service.settings().set_uri_stub(&uri).await?;
    tracing::info!(stub = %uri, "URI stub replaced");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /default-security-label
pub async fn get_default_label(Extension(state): Extension<AppState>) -> Json<SecurityLabel> {
    Json((*state.service.settings().default_label().await).clone())
}

/// POST /default-security-label
pub async fn set_default_label(
    Extension(state): Extension<AppState>,
    payload: Result<Json<SecurityLabel>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(label) = payload?;
    tracing::info!(label = %label, "default security label replaced");
    state.service.settings().set_default_label(label).await;
    Ok(StatusCode::NO_CONTENT)
}
