//! Location adapter.
//!
//! Locations are wards, wings and rooms. The physical type is resolved
//! through the fixed three-entry vocabulary at construction time; an input
//! that resolves to nothing leaves the adapter carrying the unresolved
//! sentinel, which blocks insertion before any row is written.

use crate::schema::tables;
use crate::validate::{datetime_value, get_datetime, get_i64, get_string, require};
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use fhir::{LocationDocument, PhysicalType};
use std::sync::Arc;
use ward_store::{Predicate, Row, Store};

const REQUIRED: &[&str] = &["status", "name", "description", "type"];

/// Caller-supplied fields for a new location.
#[derive(Clone, Debug, Default)]
pub struct LocationSeed {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Raw physical-type input; defaults to `ward` when absent.
    pub physical_type: Option<String>,
}

pub struct Location {
    store: Arc<dyn Store>,
    pub location_id: Option<i64>,
    pub status: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub physical_type: Option<PhysicalType>,
    /// Kept for the insert-blocking error message.
    raw_type: String,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Location {
    /// Constructs a location from caller-supplied fields.
    ///
    /// Status defaults to `active` and the physical type to `ward`; an
    /// unrecognised type input stays unresolved rather than erroring here,
    /// so a caller can still inspect the rest of the construction.
    pub fn new(store: Arc<dyn Store>, seed: LocationSeed) -> Self {
        let raw_type = seed.physical_type.unwrap_or_else(|| "ward".to_string());
        Self {
            store,
            location_id: None,
            status: Some("active".to_string()),
            name: seed.name,
            description: seed.description,
            physical_type: PhysicalType::lookup(&raw_type),
            raw_type,
            last_updated: None,
        }
    }

    /// Constructs a location carrying only its identifier.
    pub fn from_id(store: Arc<dyn Store>, location_id: i64) -> Self {
        Self {
            store,
            location_id: Some(location_id),
            status: None,
            name: None,
            description: None,
            physical_type: None,
            raw_type: String::new(),
            last_updated: None,
        }
    }

    /// Constructs a location from a row already read from storage.
    pub fn from_row(store: Arc<dyn Store>, row: &Row) -> Self {
        let mut location = Self::from_id(store, 0);
        location.location_id = None;
        location.merge(row);
        location
    }

    /// Hydrates the location from its row, including the stored type.
    pub async fn populate(&mut self) -> CoreResult<()> {
        let location_id = self.location_id.ok_or(CoreError::NotFound {
            resource: "Location",
        })?;
        let rows = self
            .store
            .select(tables::LOCATION, &Predicate::by("location_id", location_id))
            .await?;
        let row = rows.first().ok_or(CoreError::NotFound {
            resource: "Location",
        })?;
        self.merge(row);
        Ok(())
    }

    /// Validates and inserts the location, returning the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownLocationType`] when the type input did not
    /// resolve — nothing is written in that case.
    pub async fn insert(&mut self) -> CoreResult<Row> {
        let physical_type = self
            .physical_type
            .ok_or_else(|| CoreError::UnknownLocationType(self.raw_type.clone()))?;
        self.last_updated = Some(Utc::now());

        let mut row = Row::new();
        if let Some(status) = &self.status {
            row.insert("status".to_string(), status.clone().into());
        }
        if let Some(name) = &self.name {
            row.insert("name".to_string(), name.clone().into());
        }
        if let Some(description) = &self.description {
            row.insert("description".to_string(), description.clone().into());
        }
        row.insert("type".to_string(), physical_type.display().into());
        if let Some(last_updated) = self.last_updated {
            row.insert("last_updated".to_string(), datetime_value(last_updated));
        }
        require("Location", &row, REQUIRED)?;

        let stored = self.store.insert(tables::LOCATION, row).await?;
        self.location_id = get_i64(&stored, "location_id");
        Ok(stored)
    }

    /// Removes the location row.
    pub async fn delete(&self) -> CoreResult<()> {
        let location_id = self.location_id.ok_or(CoreError::NotFound {
            resource: "Location",
        })?;
        self.store
            .delete(tables::LOCATION, &Predicate::by("location_id", location_id))
            .await?;
        Ok(())
    }

    /// Projects the current state into a Location document.
    pub fn document(&self) -> CoreResult<LocationDocument> {
        let (Some(location_id), Some(status), Some(name), Some(description), Some(physical_type)) = (
            self.location_id,
            self.status.clone(),
            self.name.clone(),
            self.description.clone(),
            self.physical_type,
        ) else {
            return Err(CoreError::MissingFields {
                resource: "Location",
                fields: vec!["status", "name", "description", "type"],
            });
        };
        Ok(LocationDocument::new(
            location_id,
            status,
            name,
            description,
            physical_type,
            self.last_updated.unwrap_or_else(Utc::now),
        ))
    }

    /// All locations of one stored type (`Ward`, `Wing`, `Room`).
    pub async fn list_by_type(
        store: Arc<dyn Store>,
        type_display: &str,
    ) -> CoreResult<Vec<LocationDocument>> {
        let rows = store
            .select(tables::LOCATION, &Predicate::by("type", type_display))
            .await?;
        let mut documents = Vec::with_capacity(rows.len());
        for row in &rows {
            documents.push(Location::from_row(store.clone(), row).document()?);
        }
        Ok(documents)
    }

    fn merge(&mut self, row: &Row) {
        self.location_id = get_i64(row, "location_id").or(self.location_id);
        self.status = get_string(row, "status").or_else(|| self.status.take());
        self.name = get_string(row, "name").or_else(|| self.name.take());
        self.description = get_string(row, "description").or_else(|| self.description.take());
        if let Some(stored) = get_string(row, "type") {
            self.physical_type = PhysicalType::lookup(&stored).or(self.physical_type);
        }
        self.last_updated = get_datetime(row, "last_updated").or(self.last_updated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::in_memory_store;

    fn seed(physical_type: &str) -> LocationSeed {
        LocationSeed {
            name: Some("Ward 1".into()),
            description: Some("Surgical".into()),
            physical_type: Some(physical_type.into()),
        }
    }

    #[tokio::test]
    async fn insert_then_populate_carries_the_coding() {
        let store: Arc<dyn Store> = Arc::new(in_memory_store());
        let mut location = Location::new(store.clone(), seed("ward"));
        let stored = location.insert().await.expect("insert location");
        let id = get_i64(&stored, "location_id").expect("generated id");

        let mut hydrated = Location::from_id(store, id);
        hydrated.populate().await.expect("populate location");
        let doc = hydrated.document().expect("project document");
        assert_eq!(doc.coding[0].code, "wa");
        assert_eq!(doc.name, "Ward 1");
        assert_eq!(doc.status, "active");
    }

    #[tokio::test]
    async fn unresolved_type_blocks_insert() {
        let store: Arc<dyn Store> = Arc::new(in_memory_store());
        let mut location = Location::new(store.clone(), seed("corridor"));
        let err = location.insert().await.expect_err("unresolved type");
        assert!(matches!(err, CoreError::UnknownLocationType(raw) if raw == "corridor"));

        let rows = store
            .select(tables::LOCATION, &Predicate::all())
            .await
            .expect("select");
        assert!(rows.is_empty(), "no row should have been written");
    }

    #[tokio::test]
    async fn missing_name_blocks_insert() {
        let store: Arc<dyn Store> = Arc::new(in_memory_store());
        let mut incomplete = seed("room");
        incomplete.name = None;
        let mut location = Location::new(store, incomplete);
        let err = location.insert().await.expect_err("missing name");
        assert!(matches!(err, CoreError::MissingFields { fields, .. } if fields == vec!["name"]));
    }

    #[tokio::test]
    async fn type_defaults_to_ward() {
        let store: Arc<dyn Store> = Arc::new(in_memory_store());
        let location = Location::new(
            store,
            LocationSeed {
                name: Some("X".into()),
                description: Some("Y".into()),
                physical_type: None,
            },
        );
        assert_eq!(location.physical_type, Some(PhysicalType::Ward));
    }

    #[tokio::test]
    async fn list_by_type_filters_on_the_stored_display() {
        let store: Arc<dyn Store> = Arc::new(in_memory_store());
        Location::new(store.clone(), seed("ward"))
            .insert()
            .await
            .expect("insert ward");
        Location::new(store.clone(), seed("room"))
            .insert()
            .await
            .expect("insert room");

        let wards = Location::list_by_type(store, "Ward").await.expect("list");
        assert_eq!(wards.len(), 1);
        assert_eq!(wards[0].coding[0].code, "wa");
    }
}
