//! Patient-history routes.
//!
//! No interchange resource exists for an intake questionnaire of this
//! shape, so the read surface stays plain JSON: the parent record joined
//! with its practitioner and the three medication-usage lists.

use crate::outcome::{failure, Outcome};
use crate::AppState;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use fhir::{OperationOutcome, Severity};
use serde_json::{json, Value};
use ward_core::{CoreError, HistoryIntake, HistoryWriter};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_history))
        .route("/:patient_id", get(read_history))
}

/// `GET /fhir/History/:patient_id`.
async fn read_history(State(state): State<AppState>, Path(patient_id): Path<i64>) -> Response {
    let path = format!("/fhir/History/{patient_id}");
    let writer = HistoryWriter::new(state.store);
    match writer.read(patient_id).await {
        Ok(document) => Json(document).into_response(),
        Err(e @ CoreError::NotFound { .. }) => {
            tracing::debug!(error = %e, "history lookup failed");
            Outcome(OperationOutcome::new(
                Severity::Error,
                404,
                path,
                "unable to find history",
            ))
            .into_response()
        }
        Err(e) => failure(&path, &e).into_response(),
    }
}

/// `POST /fhir/History` — the composite write: parent row plus the three
/// usage lists. Aborts before any write without a sign-off designation.
async fn create_history(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let path = "/fhir/History";
    let intake = match HistoryIntake::parse(body) {
        Ok(intake) => intake,
        Err(e) => return failure(path, &e).into_response(),
    };

    let writer = HistoryWriter::new(state.store);
    match writer.write(&intake).await {
        Ok(history_id) => Outcome(
            OperationOutcome::new(Severity::Success, 200, path, "Successfully added history")
                .with_diagnostics(json!({"history_id": history_id})),
        )
        .into_response(),
        Err(CoreError::MissingDesignation) => Outcome(OperationOutcome::new(
            Severity::Error,
            400,
            path,
            "Missing practitioner designation!",
        ))
        .into_response(),
        Err(e) => Outcome(OperationOutcome::new(
            Severity::Error,
            500,
            path,
            e.to_string(),
        ))
        .into_response(),
    }
}
