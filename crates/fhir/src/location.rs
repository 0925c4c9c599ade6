//! Location wire model and the physical-type vocabulary.

use chrono::{DateTime, Utc};
use serde::Serialize;

const PHYSICAL_TYPE_SYSTEM: &str =
    "https://www.hl7.org/fhir/codesystem-location-physical-type.html";

/// A system/code/display triple.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Coding {
    pub system: &'static str,
    pub code: &'static str,
    pub display: &'static str,
}

/// The three known physical location kinds.
///
/// Lookup is case-insensitive and total over the three kinds; any other
/// input yields `None`, the unresolved sentinel that blocks insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhysicalType {
    Wing,
    Ward,
    Room,
}

impl PhysicalType {
    pub fn lookup(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "wing" => Some(PhysicalType::Wing),
            "ward" => Some(PhysicalType::Ward),
            "room" => Some(PhysicalType::Room),
            _ => None,
        }
    }

    pub fn coding(self) -> Coding {
        let (code, display) = match self {
            PhysicalType::Wing => ("wi", "Wing"),
            PhysicalType::Ward => ("wa", "Ward"),
            PhysicalType::Room => ("ro", "Room"),
        };
        Coding {
            system: PHYSICAL_TYPE_SYSTEM,
            code,
            display,
        }
    }

    /// The display string, which is also what the `type` column stores.
    pub fn display(self) -> &'static str {
        self.coding().display
    }
}

/// Outgoing Location document.
#[derive(Clone, Debug, Serialize)]
pub struct LocationDocument {
    #[serde(rename = "resourceType")]
    pub resource_type: &'static str,
    pub id: i64,
    pub meta: LocationMeta,
    pub status: String,
    pub name: String,
    pub description: String,
    pub coding: Vec<Coding>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LocationMeta {
    #[serde(rename = "versionID")]
    pub version_id: u32,
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
}

impl LocationDocument {
    pub fn new(
        id: i64,
        status: String,
        name: String,
        description: String,
        physical_type: PhysicalType,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            resource_type: "Location",
            id,
            meta: LocationMeta {
                version_id: 1,
                last_updated,
            },
            status,
            name,
            description,
            coding: vec![physical_type.coding()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive_over_known_kinds() {
        assert_eq!(PhysicalType::lookup("ward"), Some(PhysicalType::Ward));
        assert_eq!(PhysicalType::lookup("WING"), Some(PhysicalType::Wing));
        assert_eq!(PhysicalType::lookup("Room"), Some(PhysicalType::Room));
    }

    #[test]
    fn unknown_kinds_are_unresolved() {
        assert_eq!(PhysicalType::lookup("corridor"), None);
        assert_eq!(PhysicalType::lookup(""), None);
    }

    #[test]
    fn coding_triples_are_fixed() {
        let coding = PhysicalType::Ward.coding();
        assert_eq!(coding.code, "wa");
        assert_eq!(coding.display, "Ward");
        assert!(coding.system.contains("location-physical-type"));
    }

    #[test]
    fn document_embeds_one_coding() {
        let doc = LocationDocument::new(
            1,
            "active".into(),
            "Ward 1".into(),
            "Surgical".into(),
            PhysicalType::Ward,
            Utc::now(),
        );
        let value = serde_json::to_value(&doc).expect("serialise location");
        assert_eq!(value["resourceType"], "Location");
        assert_eq!(value["coding"][0]["code"], "wa");
        assert_eq!(value["meta"]["versionID"], 1);
    }
}
