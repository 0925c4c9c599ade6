//! Encounter routes.
//!
//! Admissions tie a patient to a location; the search route accepts an
//! `_include` directive to embed the nested patient/location documents.

use crate::outcome::{failure, Outcome};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use fhir::{EncounterResource, OperationOutcome, Severity};
use serde_json::Value;
use std::collections::HashMap;
use ward_core::{CoreError, Encounter, EncounterSeed, Include};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search_encounters).post(create_encounter))
        .route(
            "/:id",
            get(read_encounter)
                .put(update_encounter)
                .delete(delete_encounter),
        )
}

fn seed_from(resource: &EncounterResource) -> EncounterSeed {
    EncounterSeed {
        class: resource.class_data(),
        status: resource.status.clone(),
        patient_id: resource.resolved_patient_id(),
        location_id: resource.resolved_location_id(),
    }
}

/// `POST /fhir/Encounter`.
async fn create_encounter(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let path = "/fhir/Encounter";
    let resource = match EncounterResource::parse(body) {
        Ok(resource) => resource,
        Err(e) => return failure(path, &CoreError::Document(e)).into_response(),
    };
    let mut encounter = Encounter::new(state.store, state.blobs, seed_from(&resource));
    match encounter.insert().await {
        Ok(_) => Outcome(OperationOutcome::new(
            Severity::Success,
            200,
            path,
            "Successfully added encounter",
        ))
        .into_response(),
        Err(e @ CoreError::MissingFields { .. }) => {
            tracing::debug!(error = %e, "encounter rejected");
            Outcome(OperationOutcome::new(
                Severity::Error,
                406,
                path,
                "Unable to add encounter",
            ))
            .into_response()
        }
        Err(e) => failure(path, &e).into_response(),
    }
}

/// `GET /fhir/Encounter?_include=Encounter:patient;location&<column>=...`
///
/// Every query parameter other than `_include` is an equality filter on the
/// encounter columns; numeric-looking values compare as numbers.
async fn search_encounters(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let path = "/fhir/Encounter";
    let mut params = params;
    let include = params
        .remove("_include")
        .map(|directive| Include::parse(&directive))
        .unwrap_or_default();

    let filters: Vec<(String, Value)> = params
        .into_iter()
        .map(|(column, value)| {
            let value = value
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or(Value::String(value));
            (column, value)
        })
        .collect();

    let encounters = match Encounter::search(state.store, state.blobs, &filters).await {
        Ok(encounters) => encounters,
        Err(e) => return failure(path, &e).into_response(),
    };
    let projections = encounters
        .iter()
        .map(|encounter| encounter.document(include));
    match futures::future::try_join_all(projections).await {
        Ok(documents) => Json(documents).into_response(),
        Err(e) => failure(path, &e).into_response(),
    }
}

/// `GET /fhir/Encounter/:id` — references only; use the search route to
/// embed nested resources.
async fn read_encounter(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let path = format!("/fhir/Encounter/{id}");
    let mut encounter = Encounter::from_id(state.store, state.blobs, id);
    if let Err(e) = encounter.populate().await {
        tracing::debug!(error = %e, "encounter lookup failed");
        return Outcome(OperationOutcome::new(
            Severity::Error,
            404,
            path,
            "Unable to find encounter",
        ))
        .into_response();
    }
    match encounter.document(Include::default()).await {
        Ok(document) => Json(document).into_response(),
        Err(e) => failure(&path, &e).into_response(),
    }
}

/// `PUT /fhir/Encounter/:id`.
async fn update_encounter(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let path = format!("/fhir/Encounter/{id}");
    let resource = match EncounterResource::parse(body) {
        Ok(resource) => resource,
        Err(e) => return failure(&path, &CoreError::Document(e)).into_response(),
    };
    let mut encounter = Encounter::from_id(state.store, state.blobs, id);
    let seed = seed_from(&resource);
    encounter.class = seed.class;
    encounter.status = seed.status;
    encounter.patient_id = seed.patient_id;
    encounter.location_id = seed.location_id;

    match encounter.update().await {
        Ok(()) => Outcome(OperationOutcome::new(
            Severity::Success,
            200,
            path,
            "Successfully updated encounter",
        ))
        .into_response(),
        Err(e) => {
            tracing::debug!(error = %e, "encounter update failed");
            Outcome(OperationOutcome::new(
                Severity::Error,
                406,
                path,
                "Unable to update encounter",
            ))
            .into_response()
        }
    }
}

/// `DELETE /fhir/Encounter/:id`.
async fn delete_encounter(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let path = format!("/fhir/Encounter/{id}");
    let encounter = Encounter::from_id(state.store, state.blobs, id);
    match encounter.delete().await {
        Ok(()) => Outcome(OperationOutcome::new(
            Severity::Success,
            200,
            path,
            "Successfully deleted encounter",
        ))
        .into_response(),
        Err(e) => {
            tracing::debug!(error = %e, "encounter delete failed");
            Outcome(OperationOutcome::new(
                Severity::Error,
                406,
                path,
                "Unable to remove encounter",
            ))
            .into_response()
        }
    }
}
