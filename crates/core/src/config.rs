//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! services. The intent is to avoid reading process-wide environment
//! variables during request handling, which can lead to inconsistent
//! behaviour in multi-threaded runtimes and test harnesses.

use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    patient_data_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidConfig` if the patient data directory does
    /// not exist.
    pub fn new(patient_data_dir: PathBuf) -> CoreResult<Self> {
        if !patient_data_dir.is_dir() {
            return Err(CoreError::InvalidConfig(format!(
                "patient data directory does not exist: {}",
                patient_data_dir.display()
            )));
        }
        Ok(Self { patient_data_dir })
    }

    /// Where patient photo blobs are rooted.
    pub fn patient_data_dir(&self) -> &Path {
        &self.patient_data_dir
    }
}
