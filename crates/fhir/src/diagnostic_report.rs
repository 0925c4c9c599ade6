//! DiagnosticReport wire models.
//!
//! A report is a fixed-width tuple of up to seven observation slots, one per
//! vital-sign kind. The `result` list is polymorphic on the wire: the cheap
//! projection emits bare `"Observation/<id>"` reference strings, the linked
//! projection embeds the full observation documents. Absent slots are
//! omitted.

use crate::bundle::Meta;
use crate::{parse_resource, FhirResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outgoing DiagnosticReport document.
#[derive(Clone, Debug, Serialize)]
pub struct DiagnosticReportDocument {
    #[serde(rename = "resourceType")]
    pub resource_type: &'static str,
    pub id: i64,
    pub meta: Meta,
    /// Bare `"Patient/<id>"` string, as this surface has always emitted it.
    pub subject: String,
    pub status: &'static str,
    pub result: Vec<Value>,
}

impl DiagnosticReportDocument {
    pub fn new(id: i64, subject: String, last_updated: DateTime<Utc>, result: Vec<Value>) -> Self {
        Self {
            resource_type: "DiagnosticReport",
            id,
            meta: Meta { last_updated },
            subject,
            status: "final",
            result,
        }
    }
}

/// Incoming DiagnosticReport creation body.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DiagnosticReportResource {
    #[serde(default)]
    pub result: Vec<ObservationIn>,
    #[serde(default)]
    pub meta: Option<MetaIn>,
    /// `"Patient/<id>"` reference.
    #[serde(default)]
    pub subject: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ObservationIn {
    #[serde(default)]
    pub code: CodeIn,
    #[serde(rename = "valueQuantity", default)]
    pub value_quantity: QuantityIn,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CodeIn {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct QuantityIn {
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MetaIn {
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl DiagnosticReportResource {
    pub fn parse(value: Value) -> FhirResult<Self> {
        parse_resource("DiagnosticReport", value)
    }
}

impl ObservationIn {
    /// Whether this entry names a kind and carries a value.
    pub fn is_complete(&self) -> bool {
        self.code.text.is_some() && self.value_quantity.value.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_creation_body() {
        let body = json!({
            "subject": "Patient/3",
            "meta": {"last_updated": "2026-01-23T13:58:04Z"},
            "result": [
                {"code": {"text": "heart_rate"}, "valueQuantity": {"value": 72}},
                {"code": {"text": "systolic_bp"}, "valueQuantity": {"value": 120}},
            ],
        });

        let resource = DiagnosticReportResource::parse(body).expect("parse report");
        assert_eq!(resource.subject.as_deref(), Some("Patient/3"));
        assert_eq!(resource.result.len(), 2);
        assert!(resource.result.iter().all(ObservationIn::is_complete));
    }

    #[test]
    fn incomplete_observation_entries_are_flagged() {
        let entry: ObservationIn =
            serde_json::from_value(json!({"code": {}, "valueQuantity": {"value": 72}}))
                .expect("deserialise entry");
        assert!(!entry.is_complete());
    }

    #[test]
    fn document_emits_bare_subject_and_result_list() {
        let doc = DiagnosticReportDocument::new(
            2,
            "Patient/3".into(),
            Utc::now(),
            vec![json!("Observation/10"), json!("Observation/11")],
        );
        let value = serde_json::to_value(&doc).expect("serialise report");
        assert_eq!(value["subject"], "Patient/3");
        assert_eq!(value["result"][0], "Observation/10");
        assert_eq!(value["status"], "final");
    }
}
