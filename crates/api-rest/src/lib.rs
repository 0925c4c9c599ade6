//! # API REST
//!
//! REST surface for the ward record system.
//!
//! Handles:
//! - HTTP routing with axum, one router per resource under `/fhir`
//! - query-parameter handling (`_query`, `_include`, `_count`/`page`,
//!   `patient`, `result`, `type`)
//! - conversion of mapping-layer results into documents, bundles and
//!   outcome envelopes (JSON serialisation, CORS)
//!
//! This crate stays thin: every decision about rows, references and
//! validation lives in `ward-core`.

#![warn(rust_2018_idioms)]

pub mod outcome;
pub mod routes;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use ward_store::{BlobStore, Store};

/// Application state shared across REST API handlers.
///
/// Carries the storage handles every adapter is constructed around. Each
/// request builds its own adapter instances; nothing request-scoped lives
/// here.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub blobs: Arc<dyn BlobStore>,
}

/// Builds the full `/fhir` router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/fhir/Observation", routes::observation::router())
        .nest("/fhir/DiagnosticReport", routes::diagnostic_report::router())
        .nest("/fhir/Encounter", routes::encounter::router())
        .nest("/fhir/Location", routes::location::router())
        .nest("/fhir/Patient", routes::patient::router())
        .nest("/fhir/History", routes::history::router())
        .nest("/fhir/Practitioner", routes::practitioner::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `addr` and serves the router until the process stops.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("-- ward REST API listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
