//! Practitioner wire model.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outgoing Practitioner document.
#[derive(Clone, Debug, Serialize)]
pub struct PractitionerDocument {
    #[serde(rename = "resourceType")]
    pub resource_type: &'static str,
    pub active: bool,
    pub id: i64,
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
    pub name: Vec<GivenName>,
    pub telecom: Vec<EmailTelecom>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GivenName {
    pub given: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct EmailTelecom {
    pub system: &'static str,
    pub value: String,
}

impl PractitionerDocument {
    pub fn new(id: i64, name: String, username: String, added: DateTime<Utc>) -> Self {
        Self {
            resource_type: "Practitioner",
            active: true,
            id,
            last_updated: added,
            name: vec![GivenName { given: vec![name] }],
            telecom: vec![EmailTelecom {
                system: "email",
                value: username,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_shape() {
        let doc = PractitionerDocument::new(9, "Jo Bloggs".into(), "jo@ward.test".into(), Utc::now());
        let value = serde_json::to_value(&doc).expect("serialise practitioner");
        assert_eq!(value["resourceType"], "Practitioner");
        assert_eq!(value["active"], true);
        assert_eq!(value["name"][0]["given"][0], "Jo Bloggs");
        assert_eq!(value["telecom"][0]["system"], "email");
    }
}
