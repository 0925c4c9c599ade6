//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own against the in-process store, with
//! patient photos on the local filesystem.
//!
//! ## Intended use
//! Development and debugging when you only want the HTTP surface; the
//! workspace's main `ward-run` binary is the deployable entry point.

use api_rest::AppState;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ward_core::schema::in_memory_store;
use ward_store::FsBlobStore;

/// # Environment Variables
/// - `WARD_REST_ADDR`: server address (default: "0.0.0.0:3000")
/// - `PATIENT_DATA_DIR`: directory for patient photo blobs (default:
///   "/patient_data"); must exist
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the patient data directory does not exist, or
/// - the server address cannot be bound.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("WARD_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let patient_data_dir =
        std::env::var("PATIENT_DATA_DIR").unwrap_or_else(|_| "/patient_data".into());
    let patient_data_path = Path::new(&patient_data_dir);
    if !patient_data_path.exists() {
        anyhow::bail!(
            "Patient data directory does not exist: {}",
            patient_data_path.display()
        );
    }

    let state = AppState {
        store: Arc::new(in_memory_store()),
        blobs: Arc::new(FsBlobStore::new(patient_data_path.to_path_buf())?),
    };

    api_rest::serve(&addr, state).await
}
