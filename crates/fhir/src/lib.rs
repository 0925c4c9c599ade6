//! FHIR wire/boundary support for the ward record system.
//!
//! This crate provides **wire models** and **format/translation helpers** for
//! the JSON documents exchanged with clients:
//! - the `OperationOutcome` result envelope every operation reports through
//! - typed references (`"Patient/3"`) linking one document to another
//! - `Bundle` searchset collections
//! - per-resource document shapes (Patient, Location, Observation,
//!   DiagnosticReport, Encounter, Practitioner) and the vocabularies they
//!   draw on (vital-sign kinds, location physical types)
//! - parsers for incoming resources that surface a best-effort field path on
//!   schema mismatch
//!
//! This crate focuses on:
//! - FHIR semantic alignment (without claiming full FHIR coverage)
//! - serialisation/deserialisation
//! - translation between row-level primitives and the wire structs
//!
//! It never touches storage; hydration and persistence live in `ward-core`.

pub mod bundle;
pub mod diagnostic_report;
pub mod encounter;
pub mod location;
pub mod observation;
pub mod outcome;
pub mod patient;
pub mod practitioner;
pub mod reference;
pub mod vitals;

// Re-export facades
pub use bundle::Bundle;
pub use outcome::{OperationOutcome, Severity};
pub use reference::{Reference, ResourceType};

// Re-export document and vocabulary types
pub use diagnostic_report::DiagnosticReportDocument;
pub use encounter::{EncounterDocument, EncounterResource};
pub use location::{Coding, LocationDocument, PhysicalType};
pub use observation::ObservationDocument;
pub use patient::{PatientDocument, PatientResource};
pub use practitioner::PractitionerDocument;
pub use vitals::VitalSign;

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

pub type FhirResult<T> = Result<T, FhirError>;

/// Deserialises `value` into `T`, reporting the failing field path.
///
/// A mismatch surfaces as `Translation("<resource> schema mismatch at
/// <path>: <cause>")` so the HTTP layer can hand clients something
/// actionable in the outcome diagnostics.
pub(crate) fn parse_resource<T: serde::de::DeserializeOwned>(
    resource: &'static str,
    value: serde_json::Value,
) -> FhirResult<T> {
    serde_path_to_error::deserialize(value).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        FhirError::Translation(format!("{resource} schema mismatch at {path}: {source}"))
    })
}
