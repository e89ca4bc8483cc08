//! Router construction for the write-back server.

use axum::routing::{get, post};
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::meta::root))
        .route("/version-info", get(handlers::meta::version_info))
        // Ontology classes
        .route(
            "/assessment-classes",
            get(handlers::classes::assessment_classes),
        )
        .route(
            "/buildings/states/classes",
            get(handlers::classes::building_state_classes),
        )
        // Writes
        .route("/people", post(handlers::writes::create_person))
        .route(
            "/buildings/states",
            post(handlers::writes::create_building_state),
        )
        .route("/assessments", post(handlers::writes::create_assessment))
        .route("/flag-to-visit", post(handlers::writes::flag_to_visit))
        .route(
            "/flag-to-investigate",
            post(handlers::writes::flag_to_investigate),
        )
        .route("/invalidate-flag", post(handlers::writes::invalidate_flag))
        // Reads
        .route("/buildings", get(handlers::buildings::buildings_in_geohash))
        .route("/buildings/:uprn", get(handlers::buildings::building_by_uprn))
        // Runtime settings
        .route(
            "/uri-stub",
            get(handlers::admin::get_uri_stub).post(handlers::admin::set_uri_stub),
        )
        .route(
            "/default-security-label",
            get(handlers::admin::get_default_label).post(handlers::admin::set_default_label),
        )
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}
