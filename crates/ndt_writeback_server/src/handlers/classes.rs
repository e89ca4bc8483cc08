//! GET /assessment-classes and GET /buildings/states/classes.
//!
//! Both refresh the cached hierarchy from the ontology dataset before listing.

use axum::http::HeaderMap;
use axum::{Extension, Json};

use ndt_writeback_core::{Hierarchy, OntologyClass};

use super::forwarded;
use crate::error::AppError;
use crate::state::AppState;

pub async fn assessment_classes(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<OntologyClass>>, AppError> {
    let classes = state
        .service
        .classes(&Hierarchy::assessment(), &forwarded(&headers))
        .await?;
    Ok(Json(classes))
}

pub async fn building_state_classes(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<OntologyClass>>, AppError> {
    let classes = state
        .service
        .classes(&Hierarchy::building_state(), &forwarded(&headers))
        .await?;
    Ok(Json(classes))
}
