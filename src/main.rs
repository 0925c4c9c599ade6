//! Main entry point for the ward record server.
//!
//! Wires configuration, the storage backends and the REST router together
//! and serves until the process stops.

use api_rest::AppState;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ward_core::schema::in_memory_store;
use ward_core::CoreConfig;
use ward_store::FsBlobStore;

/// # Environment Variables
/// - `WARD_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `PATIENT_DATA_DIR`: directory for patient photo blobs (default:
///   "/patient_data"); must exist
///
/// # Returns
/// * `Ok(())` - if the server starts and runs successfully
/// * `Err(anyhow::Error)` - if startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("ward=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("WARD_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let patient_data_dir =
        std::env::var("PATIENT_DATA_DIR").unwrap_or_else(|_| "/patient_data".into());
    let cfg = CoreConfig::new(Path::new(&patient_data_dir).to_path_buf())?;

    tracing::info!("-- Starting ward record server on {}", rest_addr);

    let state = AppState {
        store: Arc::new(in_memory_store()),
        blobs: Arc::new(FsBlobStore::new(cfg.patient_data_dir().to_path_buf())?),
    };

    api_rest::serve(&rest_addr, state).await
}
