//! Write endpoints. Each returns the URI of the entity it created as a JSON
//! string.

use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use axum::{Extension, Json};

use ndt_writeback_core::builders::FlagKind;
use ndt_writeback_core::requests::{
    FlagTarget, InvalidateFlag, NewAssessment, NewBuildingState, NewPerson,
};
use ndt_writeback_core::WriteRequest;

use super::forwarded;
use crate::error::AppError;
use crate::state::AppState;

async fn write(
    state: &AppState,
    headers: &HeaderMap,
    request: WriteRequest,
) -> Result<Json<String>, AppError> {
    let uri = state.service.write(request, &forwarded(headers)).await?;
    Ok(Json(uri.into_string()))
}

/// POST /people
pub async fn create_person(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    payload: Result<Json<NewPerson>, JsonRejection>,
) -> Result<Json<String>, AppError> {
    let Json(req) = payload?;
    write(&state, &headers, WriteRequest::Person(req)).await
}

/// POST /buildings/states
pub async fn create_building_state(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    payload: Result<Json<NewBuildingState>, JsonRejection>,
) -> Result<Json<String>, AppError> {
    let Json(req) = payload?;
    write(&state, &headers, WriteRequest::BuildingState(req)).await
}

/// POST /assessments
pub async fn create_assessment(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    payload: Result<Json<NewAssessment>, JsonRejection>,
) -> Result<Json<String>, AppError> {
    let Json(req) = payload?;
    write(&state, &headers, WriteRequest::Assessment(req)).await
}

/// POST /flag-to-visit
pub async fn flag_to_visit(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    payload: Result<Json<FlagTarget>, JsonRejection>,
) -> Result<Json<String>, AppError> {
    let Json(req) = payload?;
    write(&state, &headers, WriteRequest::Flag(FlagKind::Visit, req)).await
}

/// POST /flag-to-investigate
pub async fn flag_to_investigate(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    payload: Result<Json<FlagTarget>, JsonRejection>,
) -> Result<Json<String>, AppError> {
    let Json(req) = payload?;
    write(
        &state,
        &headers,
        WriteRequest::Flag(FlagKind::Investigate, req),
    )
    .await
}

/// POST /invalidate-flag
pub async fn invalidate_flag(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    payload: Result<Json<InvalidateFlag>, JsonRejection>,
) -> Result<Json<String>, AppError> {
    let Json(req) = payload?;
    write(&state, &headers, WriteRequest::InvalidateFlag(req)).await
}
