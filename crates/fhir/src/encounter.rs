//! Encounter wire models.

use crate::bundle::Meta;
use crate::Reference;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outgoing Encounter document.
///
/// `subject` and `location` entries are either reference objects or whole
/// embedded documents, depending on the inclusion config the caller asked
/// for, so both stay [`Value`].
#[derive(Clone, Debug, Serialize)]
pub struct EncounterDocument {
    #[serde(rename = "resourceType")]
    pub resource_type: &'static str,
    pub meta: Meta,
    pub status: String,
    pub class: EncounterClass,
    pub subject: Value,
    pub location: Vec<Value>,
}

/// The encounter class, e.g. `admission`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EncounterClass {
    #[serde(default)]
    pub data: Option<String>,
}

impl EncounterDocument {
    pub fn new(
        last_updated: DateTime<Utc>,
        status: String,
        class: String,
        subject: Value,
        location: Value,
    ) -> Self {
        Self {
            resource_type: "Encounter",
            meta: Meta { last_updated },
            status,
            class: EncounterClass { data: Some(class) },
            subject,
            location: vec![location],
        }
    }
}

/// Incoming Encounter body (create and update).
///
/// Clients send either flat column names (`patient_id`, `location_id`) or
/// resource-shaped fields (`subject`, `location`); the accessors below
/// resolve both spellings.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EncounterResource {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub class: Option<EncounterClass>,
    #[serde(default)]
    pub subject: Option<Value>,
    #[serde(default)]
    pub location: Vec<Value>,
    #[serde(default)]
    pub patient_id: Option<i64>,
    #[serde(default)]
    pub location_id: Option<i64>,
}

impl EncounterResource {
    pub fn parse(value: Value) -> crate::FhirResult<Self> {
        crate::parse_resource("Encounter", value)
    }

    pub fn class_data(&self) -> Option<String> {
        self.class.as_ref().and_then(|c| c.data.clone())
    }

    /// `patient_id`, falling back to `subject` as a number or a
    /// `"Patient/<id>"` reference.
    pub fn resolved_patient_id(&self) -> Option<i64> {
        self.patient_id
            .or_else(|| self.subject.as_ref().and_then(id_from_value))
    }

    /// `location_id`, falling back to the first `location` entry.
    pub fn resolved_location_id(&self) -> Option<i64> {
        self.location_id
            .or_else(|| self.location.first().and_then(id_from_value))
    }
}

fn id_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => Reference::id_part(s).parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_flat_column_ids() {
        let resource = EncounterResource::parse(json!({
            "status": "finished",
            "class": {"data": "admission"},
            "patient_id": 3,
            "location_id": 7,
        }))
        .expect("parse encounter");
        assert_eq!(resource.resolved_patient_id(), Some(3));
        assert_eq!(resource.resolved_location_id(), Some(7));
        assert_eq!(resource.class_data().as_deref(), Some("admission"));
    }

    #[test]
    fn resolves_resource_shaped_ids() {
        let resource = EncounterResource::parse(json!({
            "subject": "Patient/3",
            "location": [7],
        }))
        .expect("parse encounter");
        assert_eq!(resource.resolved_patient_id(), Some(3));
        assert_eq!(resource.resolved_location_id(), Some(7));
    }

    #[test]
    fn missing_ids_resolve_to_none() {
        let resource = EncounterResource::parse(json!({})).expect("parse empty");
        assert_eq!(resource.resolved_patient_id(), None);
        assert_eq!(resource.resolved_location_id(), None);
    }

    #[test]
    fn document_wraps_subject_and_location() {
        let doc = EncounterDocument::new(
            Utc::now(),
            "finished".into(),
            "admission".into(),
            json!({"reference": "Patient/3"}),
            json!({"reference": "Location/7"}),
        );
        let value = serde_json::to_value(&doc).expect("serialise encounter");
        assert_eq!(value["resourceType"], "Encounter");
        assert_eq!(value["class"]["data"], "admission");
        assert_eq!(value["subject"]["reference"], "Patient/3");
        assert_eq!(value["location"][0]["reference"], "Location/7");
    }
}
