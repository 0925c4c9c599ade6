//! Patient wire models.
//!
//! Two shapes live here: the outgoing [`PatientDocument`] projected from
//! storage, and the incoming [`PatientResource`] accepted on create. The
//! incoming shape is lenient — unknown keys are ignored, every field is
//! optional — because required-field enforcement belongs to the adapter,
//! which reports the missing names through the outcome envelope.

use crate::{parse_resource, FhirResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Outgoing document
// ============================================================================

/// Outgoing Patient document.
#[derive(Clone, Debug, Serialize)]
pub struct PatientDocument {
    pub identifier: Vec<Identifier>,
    #[serde(rename = "resourceType")]
    pub resource_type: &'static str,
    pub id: i64,
    pub active: bool,
    pub name: Vec<HumanName>,
    pub gender: String,
    pub photo: Vec<Attachment>,
    pub contact: Vec<ContactEntry>,
}

/// How this record is identified to downstream consumers.
#[derive(Clone, Debug, Serialize)]
pub struct Identifier {
    #[serde(rename = "use")]
    pub use_kind: &'static str,
    pub system: &'static str,
    pub value: &'static str,
    pub assigner: &'static str,
}

impl Identifier {
    /// The fixed identifier entry every patient document carries.
    pub fn database_id() -> Self {
        Self {
            use_kind: "usual",
            system: "urn:ietf:rfc:3986",
            value: "database id",
            assigner: "ward",
        }
    }
}

/// A human name as the surface has always emitted it: `given` stays a plain
/// string, `prefix` is split on spaces.
#[derive(Clone, Debug, Serialize)]
pub struct HumanName {
    #[serde(rename = "use")]
    pub use_kind: &'static str,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    pub given: String,
    pub prefix: Vec<String>,
}

impl HumanName {
    pub fn usual(text: String, family: Option<String>, given: String, prefix: &str) -> Self {
        Self {
            use_kind: "usual",
            text,
            family,
            given,
            prefix: prefix.split(' ').map(str::to_string).collect(),
        }
    }
}

/// A stored photo: content type, blob path, and SHA-256 content hash.
#[derive(Clone, Debug, Serialize)]
pub struct Attachment {
    #[serde(rename = "contentType")]
    pub content_type: String,
    pub url: String,
    pub hash: String,
}

/// The patient's contact person.
#[derive(Clone, Debug, Serialize)]
pub struct ContactEntry {
    pub name: HumanName,
    pub telecom: Vec<Telecom>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Telecom {
    pub system: &'static str,
    pub value: String,
    #[serde(rename = "use")]
    pub use_kind: &'static str,
}

impl Telecom {
    pub fn home_phone(value: String) -> Self {
        Self {
            system: "phone",
            value,
            use_kind: "home",
        }
    }
}

// ============================================================================
// Incoming resource
// ============================================================================

/// Incoming Patient resource accepted on create.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PatientResource {
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub name: Vec<NameIn>,
    #[serde(default)]
    pub gender: Option<String>,
    /// Base64 data URL, e.g. `data:image/jpeg;base64,...`.
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub contact: Vec<ContactIn>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NameIn {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub given: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ContactIn {
    #[serde(default)]
    pub name: NameIn,
    #[serde(default)]
    pub telecom: Vec<TelecomIn>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TelecomIn {
    #[serde(default)]
    pub value: Option<String>,
}

impl PatientResource {
    /// Parses an incoming body, reporting the failing field path.
    pub fn parse(value: Value) -> FhirResult<Self> {
        parse_resource("Patient", value)
    }

    /// The primary (first) name entry, if one was sent.
    pub fn primary_name(&self) -> Option<&NameIn> {
        self.name.first()
    }

    /// The primary contact entry, if one was sent.
    pub fn primary_contact(&self) -> Option<&ContactIn> {
        self.contact.first()
    }
}

impl ContactIn {
    /// First telecom value — the contact phone number.
    pub fn phone(&self) -> Option<String> {
        self.telecom.first().and_then(|t| t.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_full_create_body() {
        let body = json!({
            "active": true,
            "name": [{"family": "Williams", "given": "Sarah", "prefix": "Ms"}],
            "gender": "female",
            "contact": [{
                "name": {"family": "Williams", "given": "Jane", "prefix": "Mrs"},
                "telecom": [{"value": "01234 567890"}],
            }],
        });

        let resource = PatientResource::parse(body).expect("parse patient");
        let name = resource.primary_name().expect("primary name");
        assert_eq!(name.family.as_deref(), Some("Williams"));
        let contact = resource.primary_contact().expect("primary contact");
        assert_eq!(contact.phone().as_deref(), Some("01234 567890"));
    }

    #[test]
    fn mismatched_types_report_the_path() {
        let body = json!({"name": "not-an-array"});
        let err = PatientResource::parse(body).expect_err("should reject");
        let message = err.to_string();
        assert!(message.contains("name"), "path missing from: {message}");
    }

    #[test]
    fn document_serialises_expected_shape() {
        let doc = PatientDocument {
            identifier: vec![Identifier::database_id()],
            resource_type: "Patient",
            id: 3,
            active: true,
            name: vec![HumanName::usual(
                "Sarah Williams".into(),
                Some("Williams".into()),
                "Sarah".into(),
                "Ms",
            )],
            gender: "female".into(),
            photo: vec![],
            contact: vec![ContactEntry {
                name: HumanName::usual("Jane Williams".into(), None, "Jane".into(), "Mrs"),
                telecom: vec![Telecom::home_phone("01234 567890".into())],
            }],
        };

        let value = serde_json::to_value(&doc).expect("serialise patient");
        assert_eq!(value["resourceType"], "Patient");
        assert_eq!(value["name"][0]["use"], "usual");
        assert_eq!(value["name"][0]["prefix"], json!(["Ms"]));
        assert_eq!(value["contact"][0]["telecom"][0]["system"], "phone");
        assert_eq!(value["identifier"][0]["assigner"], "ward");
    }

    #[test]
    fn multi_word_prefix_splits() {
        let name = HumanName::usual("X".into(), None, "X".into(), "Prof Dr");
        assert_eq!(name.prefix, vec!["Prof", "Dr"]);
    }
}
