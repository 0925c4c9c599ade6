//! DiagnosticReport routes. All patient vital-sign sets come through here.

use crate::outcome::{failure, Outcome};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use fhir::diagnostic_report::DiagnosticReportResource;
use fhir::{OperationOutcome, Severity};
use serde::Deserialize;
use serde_json::{json, Value};
use ward_core::{CoreError, DiagnosticReport};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reports).post(create_report))
        .route("/:id", get(read_report).delete(delete_report))
}

#[derive(Deserialize)]
struct ListParams {
    patient: Option<i64>,
    /// Embed the full observation documents instead of references.
    result: Option<String>,
    #[serde(rename = "_count")]
    count: Option<usize>,
    page: Option<usize>,
}

fn wants_linked(result: &Option<String>) -> bool {
    result
        .as_deref()
        .is_some_and(|value| !value.is_empty() && value != "false")
}

/// `GET /fhir/DiagnosticReport?patient=&result=&_count=&page=` — one page of
/// a patient's reports, newest first.
async fn list_reports(State(state): State<AppState>, Query(params): Query<ListParams>) -> Response {
    let path = "/fhir/DiagnosticReport";
    let Some(patient) = params.patient else {
        return Json(Vec::<Value>::new()).into_response();
    };
    let reports =
        match DiagnosticReport::for_patient(state.store, patient, params.count, params.page).await {
            Ok(reports) => reports,
            Err(e) => return failure(path, &e).into_response(),
        };

    if wants_linked(&params.result) {
        let linked = futures::future::try_join_all(
            reports.iter().map(|report| report.document_linked()),
        )
        .await;
        match linked {
            Ok(documents) => Json(documents).into_response(),
            Err(e) => failure(path, &e).into_response(),
        }
    } else {
        let documents: Vec<_> = reports.iter().map(DiagnosticReport::document).collect();
        Json(documents).into_response()
    }
}

/// `GET /fhir/DiagnosticReport/:id?result=`.
async fn read_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<ListParams>,
) -> Response {
    let path = format!("/fhir/DiagnosticReport/{id}");
    let mut report = DiagnosticReport::from_id(state.store, id);
    if let Err(e) = report.populate().await {
        return failure(&path, &e).into_response();
    }
    if wants_linked(&params.result) {
        match report.document_linked().await {
            Ok(document) => Json(document).into_response(),
            Err(e) => failure(&path, &e).into_response(),
        }
    } else {
        Json(report.document()).into_response()
    }
}

/// `POST /fhir/DiagnosticReport` — the submitted observations and one
/// report row linking them.
async fn create_report(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let path = "/fhir/DiagnosticReport";
    let resource = match DiagnosticReportResource::parse(body) {
        Ok(resource) => resource,
        Err(e) => return failure(path, &CoreError::Document(e)).into_response(),
    };

    match DiagnosticReport::create(state.store, &resource).await {
        Ok(stored) => Outcome(
            OperationOutcome::new(Severity::Success, 200, path, "successfully added observation")
                .with_diagnostics(json!({"report_id": stored.get("report_id")})),
        )
        .into_response(),
        Err(e @ CoreError::MissingFields { .. }) => {
            tracing::debug!(error = %e, "report rejected");
            Outcome(OperationOutcome::new(
                Severity::Error,
                406,
                path,
                "missing observations!",
            ))
            .into_response()
        }
        Err(e) => failure(path, &e).into_response(),
    }
}

/// `DELETE /fhir/DiagnosticReport/:id`.
async fn delete_report(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let path = format!("/fhir/DiagnosticReport/{id}");
    let report = DiagnosticReport::from_id(state.store, id);
    match report.delete().await {
        Ok(()) => Outcome(OperationOutcome::new(
            Severity::Success,
            200,
            path,
            "Successfully deleted",
        ))
        .into_response(),
        Err(e) => failure(&path, &e).into_response(),
    }
}
