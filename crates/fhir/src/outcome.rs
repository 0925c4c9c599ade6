//! The `OperationOutcome` result envelope.
//!
//! Every write operation — and every read that can fail — reports its result
//! through one canonical document: a single-issue `OperationOutcome` carrying
//! severity, an HTTP-style status code, the request path, human-readable
//! text, and an optional diagnostics payload. The HTTP layer turns the same
//! envelope into the full response body with the matching status code, so
//! clients see exactly one failure shape across the whole surface.

use serde::Serialize;
use serde_json::{json, Value};

/// How bad the reported issue is.
///
/// `Success` is not part of the upstream FHIR value set but the surface has
/// always reported successful writes through the same envelope, so it stays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    Error,
    Warning,
    Information,
    Success,
}

impl Severity {
    fn to_wire(self) -> &'static str {
        match self {
            Severity::Fatal => "fatal",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Information => "information",
            Severity::Success => "success",
        }
    }
}

/// A uniform operation result.
///
/// Construct with [`OperationOutcome::new`], attach structured diagnostics
/// with [`OperationOutcome::with_diagnostics`], and project the canonical
/// document with [`OperationOutcome::document`].
#[derive(Clone, Debug)]
pub struct OperationOutcome {
    severity: Severity,
    code: u16,
    path: String,
    text: String,
    diagnostics: Value,
}

impl OperationOutcome {
    /// Creates an outcome with empty diagnostics.
    pub fn new(
        severity: Severity,
        code: u16,
        path: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            path: path.into(),
            text: text.into(),
            diagnostics: json!({}),
        }
    }

    /// Attaches a diagnostics payload (echoed ids, offending input, ...).
    pub fn with_diagnostics(mut self, diagnostics: Value) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// The HTTP-style status code this outcome should be served with.
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Projects the canonical single-issue document.
    pub fn document(&self) -> Value {
        let wire = OutcomeWire {
            resource_type: "OperationOutcome",
            issue: vec![IssueWire {
                severity: self.severity.to_wire(),
                code: self.code,
                details: DetailsWire { text: &self.text },
                diagnostics: &self.diagnostics,
                expression: &self.path,
            }],
        };
        // Serialisation of a plain wire struct cannot fail.
        serde_json::to_value(wire).unwrap_or_else(|_| json!({}))
    }
}

#[derive(Serialize)]
struct OutcomeWire<'a> {
    #[serde(rename = "resourceType")]
    resource_type: &'static str,
    issue: Vec<IssueWire<'a>>,
}

#[derive(Serialize)]
struct IssueWire<'a> {
    severity: &'static str,
    code: u16,
    details: DetailsWire<'a>,
    diagnostics: &'a Value,
    expression: &'a str,
}

#[derive(Serialize)]
struct DetailsWire<'a> {
    text: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_carries_all_five_fields() {
        let outcome = OperationOutcome::new(
            Severity::Error,
            404,
            "/fhir/Patient/9",
            "could not find patient",
        )
        .with_diagnostics(json!({"id": 9}));

        let doc = outcome.document();
        assert_eq!(doc["resourceType"], "OperationOutcome");
        let issue = &doc["issue"][0];
        assert_eq!(issue["severity"], "error");
        assert_eq!(issue["code"], 404);
        assert_eq!(issue["details"]["text"], "could not find patient");
        assert_eq!(issue["diagnostics"]["id"], 9);
        assert_eq!(issue["expression"], "/fhir/Patient/9");
        assert_eq!(doc["issue"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn success_outcomes_use_the_same_shape() {
        let outcome = OperationOutcome::new(Severity::Success, 200, "/fhir/Location", "created");
        let doc = outcome.document();
        assert_eq!(doc["issue"][0]["severity"], "success");
        assert_eq!(outcome.code(), 200);
        assert_eq!(doc["issue"][0]["diagnostics"], json!({}));
    }
}
