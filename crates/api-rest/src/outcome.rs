//! Outcome-to-response conversion.
//!
//! The mapping layer reports every failure as a [`CoreError`]; this module
//! owns the translation into an `OperationOutcome` envelope served with the
//! matching HTTP status. Handlers with route-specific wording construct the
//! envelope themselves and wrap it in [`Outcome`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use fhir::{OperationOutcome, Severity};
use ward_core::CoreError;

/// An outcome envelope as an HTTP response: the document is the whole body,
/// the issue code is the status.
pub struct Outcome(pub OperationOutcome);

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0.document())).into_response()
    }
}

/// The HTTP status for each failure class.
///
/// Validation failures are 406, not-found 404, precondition and malformed
/// input 400, storage failures 500.
pub fn status_for(err: &CoreError) -> u16 {
    match err {
        CoreError::MissingFields { .. }
        | CoreError::UnknownObservationKind(_)
        | CoreError::NothingToUpdate => 406,
        CoreError::NotFound { .. } | CoreError::MissingContact => 404,
        CoreError::UnknownLocationType(_)
        | CoreError::MissingDesignation
        | CoreError::InvalidPhoto(_)
        | CoreError::Document(_) => 400,
        CoreError::Storage(_) | CoreError::InvalidConfig(_) => 500,
    }
}

/// A failure envelope with the error's own message as the detail text.
pub fn failure(path: &str, err: &CoreError) -> Outcome {
    Outcome(OperationOutcome::new(
        Severity::Error,
        status_for(err),
        path,
        err.to_string(),
    ))
}

/// A success envelope.
pub fn success(path: &str, text: &str) -> Outcome {
    Outcome(OperationOutcome::new(Severity::Success, 200, path, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_error_taxonomy() {
        assert_eq!(
            status_for(&CoreError::MissingFields {
                resource: "Contact",
                fields: vec!["phone"],
            }),
            406
        );
        assert_eq!(status_for(&CoreError::NotFound { resource: "Patient" }), 404);
        assert_eq!(status_for(&CoreError::MissingDesignation), 400);
        assert_eq!(
            status_for(&CoreError::UnknownLocationType("corridor".into())),
            400
        );
        assert_eq!(
            status_for(&CoreError::Storage(ward_store::StoreError::Backend(
                "boom".into()
            ))),
            500
        );
    }
}
