//! Practitioner routes (read-only).

use crate::outcome::failure;
use crate::AppState;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use fhir::Bundle;
use ward_core::Practitioner;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_practitioners))
        .route("/:id", get(read_practitioner))
}

/// `GET /fhir/Practitioner` — a searchset bundle with `fullUrl` entries.
async fn list_practitioners(State(state): State<AppState>) -> Response {
    let path = "/fhir/Practitioner";
    match Practitioner::list(state.store).await {
        Ok(documents) => {
            let entry = documents
                .into_iter()
                .filter_map(|document| {
                    let full_url = format!("{path}/{}", document.id);
                    let mut value = serde_json::to_value(document).ok()?;
                    value
                        .as_object_mut()?
                        .insert("fullUrl".to_string(), full_url.into());
                    Some(value)
                })
                .collect();
            Json(Bundle::searchset(entry)).into_response()
        }
        Err(e) => failure(path, &e).into_response(),
    }
}

/// `GET /fhir/Practitioner/:id`.
async fn read_practitioner(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let path = format!("/fhir/Practitioner/{id}");
    let mut practitioner = Practitioner::from_id(state.store, id);
    if let Err(e) = practitioner.populate().await {
        return failure(&path, &e).into_response();
    }
    match practitioner.document() {
        Ok(document) => Json(document).into_response(),
        Err(e) => failure(&path, &e).into_response(),
    }
}
