//! `Bundle` searchset collections.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Resource metadata carrying the last-updated stamp.
#[derive(Clone, Debug, Serialize)]
pub struct Meta {
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
}

/// A searchset collection of documents.
///
/// Entries are whole documents (optionally annotated with a `url`/`fullUrl`
/// by the HTTP layer), so the entry type stays [`Value`].
#[derive(Clone, Debug, Serialize)]
pub struct Bundle {
    #[serde(rename = "resourceType")]
    pub resource_type: &'static str,
    pub meta: Meta,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub entry: Vec<Value>,
}

impl Bundle {
    /// A `searchset` bundle stamped with the current time.
    pub fn searchset(entry: Vec<Value>) -> Self {
        Self {
            resource_type: "Bundle",
            meta: Meta {
                last_updated: Utc::now(),
            },
            kind: "searchset",
            entry,
        }
    }
}
