use fhir::FhirError;
use ward_store::StoreError;

/// Failures surfaced by the mapping layer.
///
/// One variant per entry in the error taxonomy: validation failure,
/// not-found, precondition failure, malformed input, storage failure.
/// Adapters never let a raw storage error escape in any other shape, and
/// never panic; the HTTP layer maps each variant to an outcome envelope and
/// status code.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{resource} is missing required fields: {fields:?}")]
    MissingFields {
        resource: &'static str,
        fields: Vec<&'static str>,
    },
    #[error("could not find {resource}")]
    NotFound { resource: &'static str },
    #[error("unrecognised location type: {0}")]
    UnknownLocationType(String),
    #[error("unrecognised observation kind: {0}")]
    UnknownObservationKind(String),
    #[error("missing practitioner designation")]
    MissingDesignation,
    #[error("patient has no contact attached")]
    MissingContact,
    #[error("no fields to update")]
    NothingToUpdate,
    #[error("invalid photo payload: {0}")]
    InvalidPhoto(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
    #[error("document translation failure: {0}")]
    Document(#[from] FhirError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
