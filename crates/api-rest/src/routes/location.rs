//! Location routes. Primarily used for ward management.

use crate::outcome::{failure, Outcome};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use fhir::{OperationOutcome, Severity};
use serde::Deserialize;
use serde_json::json;
use ward_core::{CoreError, Location, LocationSeed};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_locations).post(create_location))
        .route("/:id", get(read_location).delete(delete_location))
}

#[derive(Clone, Debug, Default, Deserialize)]
struct LocationBody {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "type", default)]
    physical_type: Option<String>,
}

/// `POST /fhir/Location`.
async fn create_location(
    State(state): State<AppState>,
    Json(body): Json<LocationBody>,
) -> Response {
    let path = "/fhir/Location";
    let mut location = Location::new(
        state.store,
        LocationSeed {
            name: body.name.clone(),
            description: body.description.clone(),
            physical_type: body.physical_type.clone(),
        },
    );

    match location.insert().await {
        Ok(stored) => Outcome(
            OperationOutcome::new(Severity::Success, 200, path, "Successfully created location")
                .with_diagnostics(json!({"id": stored.get("location_id")})),
        )
        .into_response(),
        Err(e @ (CoreError::UnknownLocationType(_) | CoreError::MissingFields { .. })) => {
            tracing::debug!(error = %e, "location rejected");
            Outcome(
                OperationOutcome::new(Severity::Error, 400, path, "Error with query!")
                    .with_diagnostics(json!({
                        "name": body.name,
                        "description": body.description,
                        "type": body.physical_type,
                    })),
            )
            .into_response()
        }
        Err(e) => Outcome(
            OperationOutcome::new(Severity::Error, 500, path, "Error creating location")
                .with_diagnostics(json!({"err": e.to_string()})),
        )
        .into_response(),
    }
}

#[derive(Deserialize)]
struct ListParams {
    #[serde(rename = "type")]
    physical_type: Option<String>,
}

/// `GET /fhir/Location?type=Ward` — requests must name a location type.
async fn list_locations(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    let path = "/fhir/Location";
    let Some(physical_type) = params.physical_type else {
        return Outcome(OperationOutcome::new(
            Severity::Warning,
            404,
            path,
            "Incorrect query param",
        ))
        .into_response();
    };
    match Location::list_by_type(state.store, &physical_type).await {
        Ok(documents) => Json(documents).into_response(),
        Err(e) => failure(path, &e).into_response(),
    }
}

/// `GET /fhir/Location/:id`.
async fn read_location(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let path = format!("/fhir/Location/{id}");
    let mut location = Location::from_id(state.store, id);
    if let Err(e) = location.populate().await {
        return failure(&path, &e).into_response();
    }
    match location.document() {
        Ok(document) => Json(document).into_response(),
        Err(e) => failure(&path, &e).into_response(),
    }
}

/// `DELETE /fhir/Location/:id`.
async fn delete_location(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let path = format!("/fhir/Location/{id}");
    let location = Location::from_id(state.store, id);
    match location.delete().await {
        Ok(()) => Outcome(OperationOutcome::new(
            Severity::Information,
            200,
            path,
            "successfully deleted",
        ))
        .into_response(),
        Err(e) => Outcome(
            OperationOutcome::new(Severity::Error, 500, path, "Error deleting location!")
                .with_diagnostics(json!({"err": e.to_string()})),
        )
        .into_response(),
    }
}
