//! Patient routes.

use crate::outcome::{failure, Outcome};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use fhir::{Bundle, OperationOutcome, PatientResource, Severity};
use serde::Deserialize;
use serde_json::Value;
use ward_core::{Contact, ContactSeed, CoreError, Patient, PatientSeed};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search_patients).post(create_patient))
        .route(
            "/:id",
            get(read_patient).put(update_patient).delete(delete_patient),
        )
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(rename = "_query")]
    query: Option<String>,
}

/// `GET /fhir/Patient` — a searchset bundle, or a bare array of matches when
/// `_query` asks for a case-insensitive name search.
async fn search_patients(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    if let Some(query) = params.query {
        return match Patient::search(state.store, state.blobs, &query).await {
            Ok(documents) => Json(documents).into_response(),
            Err(e) => failure("/fhir/Patient", &e).into_response(),
        };
    }

    match Patient::list(state.store, state.blobs).await {
        Ok(documents) => {
            let entry = documents
                .into_iter()
                .filter_map(|document| {
                    let url = format!("/fhir/Patient/{}", document.id);
                    let mut value = serde_json::to_value(document).ok()?;
                    value
                        .as_object_mut()?
                        .insert("url".to_string(), url.into());
                    Some(value)
                })
                .collect();
            Json(Bundle::searchset(entry)).into_response()
        }
        Err(e) => failure("/fhir/Patient", &e).into_response(),
    }
}

/// `GET /fhir/Patient/:id` — the full document projection.
async fn read_patient(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let path = format!("/fhir/Patient/{id}");
    let mut patient = Patient::from_id(state.store, state.blobs, id);
    match patient.document().await {
        Ok(document) => Json(document).into_response(),
        Err(e @ (CoreError::NotFound { .. } | CoreError::MissingContact)) => {
            tracing::debug!(error = %e, "patient lookup failed");
            Outcome(OperationOutcome::new(
                Severity::Error,
                404,
                path,
                "could not find patient",
            ))
            .into_response()
        }
        Err(e) => failure(&path, &e).into_response(),
    }
}

/// `POST /fhir/Patient` — contact first, then the patient row referencing
/// it. A contact failure aborts before the patient write.
async fn create_patient(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let path = "/fhir/Patient";
    let resource = match PatientResource::parse(body) {
        Ok(resource) => resource,
        Err(e) => return failure(path, &CoreError::Document(e)).into_response(),
    };

    let name = resource.primary_name().cloned().unwrap_or_default();
    let contact_in = resource.primary_contact().cloned().unwrap_or_default();

    let mut contact = Contact::new(
        state.store.clone(),
        ContactSeed {
            prefix: contact_in.name.prefix.clone(),
            fullname: contact_in.name.family.clone(),
            given: contact_in.name.given.clone(),
            family: contact_in.name.family.clone(),
            phone: contact_in.phone(),
        },
    );
    let contact_row = match contact.insert().await {
        Ok(row) => row,
        Err(_) => {
            return Outcome(OperationOutcome::new(
                Severity::Error,
                406,
                path,
                "Unable to insert contact",
            ))
            .into_response()
        }
    };

    let mut patient = Patient::new(
        state.store,
        state.blobs,
        PatientSeed {
            fullname: name.family.clone(),
            given: name.given.clone(),
            family: name.family.clone(),
            prefix: name.prefix.clone(),
            gender: resource.gender.clone(),
            photo: resource.photo.clone(),
        },
    );
    patient.contact_id = contact_row.get("contact_id").and_then(Value::as_i64);

    match patient.insert().await {
        Ok(stored) => Outcome(
            OperationOutcome::new(Severity::Success, 200, path, "success")
                .with_diagnostics(Value::Object(stored)),
        )
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "patient insert failed");
            Outcome(OperationOutcome::new(
                Severity::Error,
                406,
                path,
                "Unable to insert patient",
            ))
            .into_response()
        }
    }
}

/// `PUT /fhir/Patient/:id` — accepts `patient-<field>` form keys and writes
/// the present subset.
async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let path = format!("/fhir/Patient/{id}");
    let mut patient = Patient::from_id(state.store, state.blobs, id);

    if let Some(fields) = body.as_object() {
        for (key, value) in fields {
            let Some(field) = key.strip_prefix("patient-") else {
                continue;
            };
            match field {
                "active" => patient.active = value.as_bool(),
                "fullname" => patient.fullname = value.as_str().map(str::to_string),
                "given" => patient.given = value.as_str().map(str::to_string),
                "family" => patient.family = value.as_str().map(str::to_string),
                "prefix" => patient.prefix = value.as_str().map(str::to_string),
                "gender" => patient.gender = value.as_str().map(str::to_string),
                "photo_url" => patient.photo_url = value.as_str().map(str::to_string),
                _ => {}
            }
        }
    }

    match patient.update().await {
        Ok(()) => Outcome(OperationOutcome::new(
            Severity::Success,
            200,
            path,
            "success updating",
        ))
        .into_response(),
        Err(CoreError::NothingToUpdate) | Err(CoreError::NotFound { .. }) => Outcome(
            OperationOutcome::new(Severity::Warning, 406, path, "Unable to update patient"),
        )
        .into_response(),
        Err(e) => failure(&path, &e).into_response(),
    }
}

/// `DELETE /fhir/Patient/:id` — row, supporting rows, then photo blob.
async fn delete_patient(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let path = format!("/fhir/Patient/{id}");
    let patient = Patient::from_id(state.store, state.blobs, id);
    match patient.delete().await {
        Ok(()) => Outcome(OperationOutcome::new(
            Severity::Success,
            200,
            path,
            "Successfully deleted patient",
        ))
        .into_response(),
        Err(e) => Outcome(OperationOutcome::new(
            Severity::Error,
            406,
            path,
            e.to_string(),
        ))
        .into_response(),
    }
}
