//! Observation wire model.

use crate::bundle::Meta;
use crate::vitals::VitalSign;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

const UNITS_OF_MEASURE: &str = "http://unitsofmeasure.org";

/// Outgoing Observation document.
#[derive(Clone, Debug, Serialize)]
pub struct ObservationDocument {
    #[serde(rename = "resourceType")]
    pub resource_type: &'static str,
    /// Observation ids have always been emitted as strings.
    pub id: String,
    pub code: CodeText,
    pub meta: Meta,
    pub status: &'static str,
    pub subject: SubjectReference,
    #[serde(rename = "valueQuantity")]
    pub value_quantity: ValueQuantity,
}

#[derive(Clone, Debug, Serialize)]
pub struct CodeText {
    pub text: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct SubjectReference {
    pub reference: String,
}

/// The recorded value plus its unit/code pair.
///
/// An unrecognised observation name leaves `unit`/`code` off entirely.
#[derive(Clone, Debug, Serialize)]
pub struct ValueQuantity {
    pub value: Value,
    pub system: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl ObservationDocument {
    pub fn new(
        id: i64,
        name: String,
        value: Value,
        last_updated: DateTime<Utc>,
        subject_reference: String,
    ) -> Self {
        let unit_code = VitalSign::parse(&name).map(VitalSign::unit_code);
        Self {
            resource_type: "Observation",
            id: id.to_string(),
            code: CodeText { text: name },
            meta: Meta { last_updated },
            status: "final",
            subject: SubjectReference {
                reference: subject_reference,
            },
            value_quantity: ValueQuantity {
                value,
                system: UNITS_OF_MEASURE,
                unit: unit_code.map(|(unit, _)| unit),
                code: unit_code.map(|(_, code)| code),
            },
        }
    }
}
