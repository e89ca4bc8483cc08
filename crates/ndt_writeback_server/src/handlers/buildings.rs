//! GET /buildings?geohash= and GET /buildings/:uprn.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query};
use axum::http::HeaderMap;
use axum::{Extension, Json};
use serde::Deserialize;

use ndt_writeback_core::buildings::{Building, EntityAndStates};
use ndt_writeback_core::WriteBackError;

use super::forwarded;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GeohashQuery {
    pub geohash: Option<String>,
}

pub async fn buildings_in_geohash(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    query: Result<Query<GeohashQuery>, QueryRejection>,
) -> Result<Json<Vec<Building>>, AppError> {
    let Query(query) = query?;
    let geohash = query
        .geohash
        .ok_or_else(|| WriteBackError::missing("geohash"))?;
    let buildings = state
        .buildings
        .buildings_in_geohash(&geohash, &forwarded(&headers))
        .await?;
    Ok(Json(buildings))
}

pub async fn building_by_uprn(
    Extension(state): Extension<AppState>,
    Path(uprn): Path<String>,
    headers: HeaderMap,
) -> Result<Json<EntityAndStates>, AppError> {
    state
        .buildings
        .building_by_uprn(&uprn, &forwarded(&headers))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no building with UPRN {uprn}")))
}
