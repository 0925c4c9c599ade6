//! Observation routes.
//!
//! Not used by the admission flows — reports carry their observations — but
//! kept as the reference read surface for individual observations.

use crate::outcome::failure;
use crate::AppState;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use ward_core::Observation;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/all", get(list_observations))
        .route("/:id", get(read_observation))
}

/// `GET /fhir/Observation/all` — every observation, projected.
async fn list_observations(State(state): State<AppState>) -> Response {
    match Observation::list(state.store).await {
        Ok(documents) => Json(documents).into_response(),
        Err(e) => failure("/fhir/Observation/all", &e).into_response(),
    }
}

/// `GET /fhir/Observation/:id`.
async fn read_observation(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let path = format!("/fhir/Observation/{id}");
    let mut observation = Observation::from_id(state.store, id);
    if let Err(e) = observation.populate().await {
        return failure(&path, &e).into_response();
    }
    match observation.document().await {
        Ok(document) => Json(document).into_response(),
        Err(e) => failure(&path, &e).into_response(),
    }
}
