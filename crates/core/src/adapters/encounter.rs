//! Encounter adapter.
//!
//! An encounter ties a patient to a location (generally an admission). Its
//! document form can embed the full patient and/or location documents
//! instead of references, driven by an explicit [`Include`] config; both
//! embeds are resolved concurrently.

use crate::adapters::location::Location;
use crate::adapters::patient::Patient;
use crate::schema::tables;
use crate::validate::{datetime_value, get_datetime, get_i64, get_string, require};
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use fhir::{EncounterDocument, Reference, ResourceType};
use serde_json::{json, Value};
use std::sync::Arc;
use ward_store::{BlobStore, Predicate, Row, Store};

const REQUIRED: &[&str] = &["class", "status", "patient_id", "location_id", "last_updated"];

/// Which nested resources to embed in the document projection.
///
/// Parsed from an `_include` directive of the form
/// `<directive>:patient;location` — the head before the first colon is
/// dropped, the remainder is a `;`-separated list of resource names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Include {
    pub patient: bool,
    pub location: bool,
}

impl Include {
    pub fn parse(directive: &str) -> Self {
        let mut include = Self::default();
        let Some((_, tail)) = directive.split_once(':') else {
            return include;
        };
        for name in tail.split(';') {
            match name {
                "patient" => include.patient = true,
                "location" => include.location = true,
                _ => {}
            }
        }
        include
    }
}

/// Caller-supplied fields for a new encounter.
#[derive(Clone, Debug, Default)]
pub struct EncounterSeed {
    pub class: Option<String>,
    pub status: Option<String>,
    pub patient_id: Option<i64>,
    pub location_id: Option<i64>,
}

pub struct Encounter {
    store: Arc<dyn Store>,
    blobs: Arc<dyn BlobStore>,
    pub encounter_id: Option<i64>,
    pub class: Option<String>,
    pub status: Option<String>,
    pub patient_id: Option<i64>,
    pub location_id: Option<i64>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Encounter {
    /// Constructs an encounter from caller-supplied fields.
    pub fn new(store: Arc<dyn Store>, blobs: Arc<dyn BlobStore>, seed: EncounterSeed) -> Self {
        Self {
            store,
            blobs,
            encounter_id: None,
            class: seed.class,
            status: seed.status,
            patient_id: seed.patient_id,
            location_id: seed.location_id,
            last_updated: None,
        }
    }

    /// Constructs an encounter carrying only its identifier.
    pub fn from_id(store: Arc<dyn Store>, blobs: Arc<dyn BlobStore>, encounter_id: i64) -> Self {
        let mut encounter = Self::new(store, blobs, EncounterSeed::default());
        encounter.encounter_id = Some(encounter_id);
        encounter
    }

    /// Constructs an encounter from a row already read from storage.
    pub fn from_row(store: Arc<dyn Store>, blobs: Arc<dyn BlobStore>, row: &Row) -> Self {
        let mut encounter = Self::new(store, blobs, EncounterSeed::default());
        encounter.merge(row);
        encounter
    }

    /// Hydrates the encounter from its row.
    pub async fn populate(&mut self) -> CoreResult<()> {
        let encounter_id = self.encounter_id.ok_or(CoreError::NotFound {
            resource: "Encounter",
        })?;
        let rows = self
            .store
            .select(
                tables::ENCOUNTER,
                &Predicate::by("encounter_id", encounter_id),
            )
            .await?;
        let row = rows.first().ok_or(CoreError::NotFound {
            resource: "Encounter",
        })?;
        self.merge(row);
        Ok(())
    }

    /// Validates and inserts the encounter.
    ///
    /// The timestamp is stamped before validation, so `last_updated` can
    /// never be the missing field.
    pub async fn insert(&mut self) -> CoreResult<Row> {
        self.last_updated = Some(Utc::now());
        let row = self.to_row();
        require("Encounter", &row, REQUIRED)?;
        let stored = self.store.insert(tables::ENCOUNTER, row).await?;
        self.encounter_id = get_i64(&stored, "encounter_id");
        Ok(stored)
    }

    /// Writes the present subset of fields, stamping a fresh timestamp.
    pub async fn update(&mut self) -> CoreResult<()> {
        let encounter_id = self.encounter_id.ok_or(CoreError::NotFound {
            resource: "Encounter",
        })?;
        let mut changes = self.to_row();
        changes.remove("last_updated");
        if changes.is_empty() {
            return Err(CoreError::NothingToUpdate);
        }
        self.last_updated = Some(Utc::now());
        changes.insert(
            "last_updated".to_string(),
            datetime_value(self.last_updated.unwrap_or_else(Utc::now)),
        );
        let touched = self
            .store
            .update(
                tables::ENCOUNTER,
                changes,
                &Predicate::by("encounter_id", encounter_id),
            )
            .await?;
        if touched == 0 {
            return Err(CoreError::NotFound {
                resource: "Encounter",
            });
        }
        Ok(())
    }

    /// Removes the encounter row.
    pub async fn delete(&self) -> CoreResult<()> {
        let encounter_id = self.encounter_id.ok_or(CoreError::NotFound {
            resource: "Encounter",
        })?;
        self.store
            .delete(
                tables::ENCOUNTER,
                &Predicate::by("encounter_id", encounter_id),
            )
            .await?;
        Ok(())
    }

    /// Projects the encounter, optionally embedding patient and location.
    ///
    /// The two embeds are independent reads and run concurrently.
    pub async fn document(&self, include: Include) -> CoreResult<EncounterDocument> {
        let patient_id = self.patient_id.unwrap_or_default();
        let location_id = self.location_id.unwrap_or_default();

        let patient_embed = async {
            if !include.patient {
                return Ok::<Option<Value>, CoreError>(None);
            }
            let mut patient = Patient::from_id(self.store.clone(), self.blobs.clone(), patient_id);
            let document = patient.document().await?;
            Ok(Some(serde_json::to_value(document).map_err(|e| CoreError::Document(e.into()))?))
        };
        let location_embed = async {
            if !include.location {
                return Ok::<Option<Value>, CoreError>(None);
            }
            let mut location = Location::from_id(self.store.clone(), location_id);
            location.populate().await?;
            let document = location.document()?;
            Ok(Some(serde_json::to_value(document).map_err(|e| CoreError::Document(e.into()))?))
        };
        let (patient_embed, location_embed) = futures::join!(patient_embed, location_embed);

        let subject = match patient_embed? {
            Some(document) => document,
            None => json!({"reference": Reference::new(ResourceType::Patient, patient_id)}),
        };
        let location = match location_embed? {
            Some(document) => document,
            None => json!({"reference": Reference::new(ResourceType::Location, location_id)}),
        };

        Ok(EncounterDocument::new(
            self.last_updated.unwrap_or_else(Utc::now),
            self.status.clone().unwrap_or_default(),
            self.class.clone().unwrap_or_default(),
            subject,
            location,
        ))
    }

    /// All encounters matching an equality map of column filters.
    pub async fn search(
        store: Arc<dyn Store>,
        blobs: Arc<dyn BlobStore>,
        filters: &[(String, Value)],
    ) -> CoreResult<Vec<Encounter>> {
        let mut predicate = Predicate::all();
        for (column, value) in filters {
            predicate = predicate.and(column.clone(), value.clone());
        }
        let rows = store.select(tables::ENCOUNTER, &predicate).await?;
        Ok(rows
            .iter()
            .map(|row| Encounter::from_row(store.clone(), blobs.clone(), row))
            .collect())
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        for (column, value) in [("class", &self.class), ("status", &self.status)] {
            if let Some(value) = value {
                row.insert(column.to_string(), value.clone().into());
            }
        }
        if let Some(patient_id) = self.patient_id {
            row.insert("patient_id".to_string(), patient_id.into());
        }
        if let Some(location_id) = self.location_id {
            row.insert("location_id".to_string(), location_id.into());
        }
        if let Some(last_updated) = self.last_updated {
            row.insert("last_updated".to_string(), datetime_value(last_updated));
        }
        row
    }

    fn merge(&mut self, row: &Row) {
        self.encounter_id = get_i64(row, "encounter_id").or(self.encounter_id);
        self.class = get_string(row, "class").or_else(|| self.class.take());
        self.status = get_string(row, "status").or_else(|| self.status.take());
        self.patient_id = get_i64(row, "patient_id").or(self.patient_id);
        self.location_id = get_i64(row, "location_id").or(self.location_id);
        self.last_updated = get_datetime(row, "last_updated").or(self.last_updated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::contact::{Contact, ContactSeed};
    use crate::adapters::location::{Location as LocationAdapter, LocationSeed};
    use crate::adapters::patient::{Patient as PatientAdapter, PatientSeed};
    use crate::schema::in_memory_store;
    use ward_store::MemoryBlobStore;

    fn stores() -> (Arc<dyn Store>, Arc<dyn BlobStore>) {
        (
            Arc::new(in_memory_store()),
            Arc::new(MemoryBlobStore::new()),
        )
    }

    async fn fixture_ids(store: Arc<dyn Store>, blobs: Arc<dyn BlobStore>) -> (i64, i64) {
        let mut contact = Contact::new(
            store.clone(),
            ContactSeed {
                prefix: Some("Mrs".into()),
                fullname: Some("Jane Williams".into()),
                given: Some("Jane".into()),
                family: None,
                phone: Some("01234 567890".into()),
            },
        );
        let contact_row = contact.insert().await.expect("insert contact");

        let mut patient = PatientAdapter::new(
            store.clone(),
            blobs,
            PatientSeed {
                fullname: Some("Sarah Williams".into()),
                given: Some("Sarah".into()),
                family: None,
                prefix: Some("Ms".into()),
                gender: Some("female".into()),
                photo: None,
            },
        );
        patient.contact_id = get_i64(&contact_row, "contact_id");
        let patient_row = patient.insert().await.expect("insert patient");

        let mut location = LocationAdapter::new(
            store,
            LocationSeed {
                name: Some("Ward 1".into()),
                description: Some("Surgical".into()),
                physical_type: Some("ward".into()),
            },
        );
        let location_row = location.insert().await.expect("insert location");

        (
            get_i64(&patient_row, "patient_id").expect("patient id"),
            get_i64(&location_row, "location_id").expect("location id"),
        )
    }

    fn seed(patient_id: i64, location_id: i64) -> EncounterSeed {
        EncounterSeed {
            class: Some("admission".into()),
            status: Some("finished".into()),
            patient_id: Some(patient_id),
            location_id: Some(location_id),
        }
    }

    #[test]
    fn include_directive_parses() {
        assert_eq!(
            Include::parse("Encounter:patient;location"),
            Include {
                patient: true,
                location: true
            }
        );
        assert_eq!(
            Include::parse("Encounter:location"),
            Include {
                patient: false,
                location: true
            }
        );
        assert_eq!(Include::parse("no-directive"), Include::default());
    }

    #[tokio::test]
    async fn insert_then_populate_round_trips() {
        let (store, blobs) = stores();
        let (patient_id, location_id) = fixture_ids(store.clone(), blobs.clone()).await;
        let mut encounter = Encounter::new(store.clone(), blobs.clone(), seed(patient_id, location_id));
        let stored = encounter.insert().await.expect("insert encounter");
        let id = get_i64(&stored, "encounter_id").expect("encounter id");

        let mut hydrated = Encounter::from_id(store, blobs, id);
        hydrated.populate().await.expect("populate encounter");
        assert_eq!(hydrated.class.as_deref(), Some("admission"));
        assert_eq!(hydrated.patient_id, Some(patient_id));
    }

    #[tokio::test]
    async fn insert_rejects_missing_status() {
        let (store, blobs) = stores();
        let mut incomplete = seed(1, 1);
        incomplete.status = None;
        let mut encounter = Encounter::new(store.clone(), blobs, incomplete);
        let err = encounter.insert().await.expect_err("missing status");
        assert!(matches!(err, CoreError::MissingFields { fields, .. } if fields == vec!["status"]));
        let rows = store
            .select(tables::ENCOUNTER, &Predicate::all())
            .await
            .expect("select");
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn document_references_by_default_and_embeds_on_request() {
        let (store, blobs) = stores();
        let (patient_id, location_id) = fixture_ids(store.clone(), blobs.clone()).await;
        let mut encounter = Encounter::new(store, blobs, seed(patient_id, location_id));
        encounter.insert().await.expect("insert encounter");

        let bare = encounter.document(Include::default()).await.expect("bare");
        assert_eq!(
            bare.subject["reference"],
            format!("Patient/{patient_id}")
        );
        assert_eq!(
            bare.location[0]["reference"],
            format!("Location/{location_id}")
        );

        let embedded = encounter
            .document(Include {
                patient: true,
                location: true,
            })
            .await
            .expect("embedded");
        assert_eq!(embedded.subject["resourceType"], "Patient");
        assert_eq!(embedded.location[0]["resourceType"], "Location");
        assert_eq!(embedded.location[0]["coding"][0]["code"], "wa");
    }

    #[tokio::test]
    async fn update_writes_subset_and_rejects_empty() {
        let (store, blobs) = stores();
        let (patient_id, location_id) = fixture_ids(store.clone(), blobs.clone()).await;
        let mut encounter = Encounter::new(store.clone(), blobs.clone(), seed(patient_id, location_id));
        let stored = encounter.insert().await.expect("insert encounter");
        let id = get_i64(&stored, "encounter_id").expect("encounter id");

        let mut empty = Encounter::from_id(store.clone(), blobs.clone(), id);
        let err = empty.update().await.expect_err("empty change set");
        assert!(matches!(err, CoreError::NothingToUpdate));

        let mut change = Encounter::from_id(store.clone(), blobs.clone(), id);
        change.status = Some("in-progress".into());
        change.update().await.expect("update status");

        let mut hydrated = Encounter::from_id(store, blobs, id);
        hydrated.populate().await.expect("populate");
        assert_eq!(hydrated.status.as_deref(), Some("in-progress"));
        assert_eq!(hydrated.class.as_deref(), Some("admission"));
    }

    #[tokio::test]
    async fn search_filters_by_equality_map() {
        let (store, blobs) = stores();
        let (patient_id, location_id) = fixture_ids(store.clone(), blobs.clone()).await;
        let mut encounter = Encounter::new(store.clone(), blobs.clone(), seed(patient_id, location_id));
        encounter.insert().await.expect("insert encounter");

        let hits = Encounter::search(
            store.clone(),
            blobs.clone(),
            &[("patient_id".to_string(), Value::from(patient_id))],
        )
        .await
        .expect("search");
        assert_eq!(hits.len(), 1);

        let misses = Encounter::search(
            store,
            blobs,
            &[("patient_id".to_string(), Value::from(patient_id + 1))],
        )
        .await
        .expect("search");
        assert!(misses.is_empty());
    }
}
