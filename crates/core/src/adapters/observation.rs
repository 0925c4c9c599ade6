//! Observation adapter.
//!
//! An observation is one recorded vital sign. It is linked from a diagnostic
//! report through the report's fixed-slot column named after the kind, so
//! projecting an observation resolves its owning report by reverse lookup on
//! that column.

use crate::schema::tables;
use crate::validate::{datetime_value, get_datetime, get_i64, get_string, require};
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use fhir::{ObservationDocument, Reference, ResourceType, VitalSign};
use serde_json::Value;
use std::sync::Arc;
use ward_store::{Predicate, Row, Store};

pub struct Observation {
    store: Arc<dyn Store>,
    pub observation_id: Option<i64>,
    pub name: Option<String>,
    pub value: Option<Value>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Observation {
    /// Constructs an observation to record, stamped now.
    pub fn new(store: Arc<dyn Store>, name: String, value: Value) -> Self {
        Self {
            store,
            observation_id: None,
            name: Some(name),
            value: Some(value),
            last_updated: Some(Utc::now()),
        }
    }

    /// Constructs an observation carrying only its identifier.
    pub fn from_id(store: Arc<dyn Store>, observation_id: i64) -> Self {
        Self {
            store,
            observation_id: Some(observation_id),
            name: None,
            value: None,
            last_updated: None,
        }
    }

    /// Constructs an observation from a row already read from storage.
    pub fn from_row(store: Arc<dyn Store>, row: &Row) -> Self {
        Self {
            store,
            observation_id: get_i64(row, "observation_id"),
            name: get_string(row, "name"),
            value: row.get("value").cloned(),
            last_updated: get_datetime(row, "last_updated"),
        }
    }

    /// Hydrates the observation from its row.
    pub async fn populate(&mut self) -> CoreResult<()> {
        let observation_id = self.observation_id.ok_or(CoreError::NotFound {
            resource: "Observation",
        })?;
        let rows = self
            .store
            .select(
                tables::OBSERVATION,
                &Predicate::by("observation_id", observation_id),
            )
            .await?;
        let row = rows.first().ok_or(CoreError::NotFound {
            resource: "Observation",
        })?;
        self.observation_id = get_i64(row, "observation_id").or(self.observation_id);
        self.name = get_string(row, "name").or_else(|| self.name.take());
        self.value = row.get("value").cloned().or_else(|| self.value.take());
        self.last_updated = get_datetime(row, "last_updated").or(self.last_updated);
        Ok(())
    }

    /// Inserts the observation row, returning it with the generated id.
    pub async fn insert(&mut self) -> CoreResult<Row> {
        let mut row = Row::new();
        if let Some(name) = &self.name {
            row.insert("name".to_string(), name.clone().into());
        }
        if let Some(value) = &self.value {
            row.insert("value".to_string(), value.clone());
        }
        require("Observation", &row, &["name", "value"])?;
        row.insert(
            "last_updated".to_string(),
            datetime_value(self.last_updated.unwrap_or_else(Utc::now)),
        );
        let stored = self.store.insert(tables::OBSERVATION, row).await?;
        self.observation_id = get_i64(&stored, "observation_id");
        Ok(stored)
    }

    /// Projects the observation, resolving its owning report for `subject`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no diagnostic report links this observation
    /// (or its kind is unrecognised, in which case no slot column exists to
    /// look through).
    pub async fn document(&self) -> CoreResult<ObservationDocument> {
        let observation_id = self.observation_id.ok_or(CoreError::NotFound {
            resource: "Observation",
        })?;
        let name = self.name.clone().unwrap_or_default();

        let kind = VitalSign::parse(&name).ok_or(CoreError::NotFound {
            resource: "DiagnosticReport",
        })?;
        let reports = self
            .store
            .select(
                tables::DIAGNOSTIC_REPORT,
                &Predicate::by(kind.column(), observation_id),
            )
            .await?;
        let report_id = reports
            .first()
            .and_then(|row| get_i64(row, "report_id"))
            .ok_or(CoreError::NotFound {
                resource: "DiagnosticReport",
            })?;

        Ok(ObservationDocument::new(
            observation_id,
            name,
            self.value.clone().unwrap_or(Value::Null),
            self.last_updated.unwrap_or_else(Utc::now),
            Reference::new(ResourceType::DiagnosticReport, report_id),
        ))
    }

    /// Every observation, projected concurrently.
    pub async fn list(store: Arc<dyn Store>) -> CoreResult<Vec<ObservationDocument>> {
        let rows = store.select(tables::OBSERVATION, &Predicate::all()).await?;
        let reads = rows.iter().map(|row| {
            let observation = Observation::from_row(store.clone(), row);
            async move { observation.document().await }
        });
        futures::future::try_join_all(reads).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::in_memory_store;
    use serde_json::json;

    async fn link_report(store: &Arc<dyn Store>, column: &str, observation_id: i64) -> i64 {
        let mut row = Row::new();
        row.insert(column.to_string(), observation_id.into());
        row.insert("patient_id".to_string(), 1.into());
        let stored = store
            .insert(tables::DIAGNOSTIC_REPORT, row)
            .await
            .expect("insert report row");
        get_i64(&stored, "report_id").expect("report id")
    }

    #[tokio::test]
    async fn insert_then_populate_round_trips() {
        let store: Arc<dyn Store> = Arc::new(in_memory_store());
        let mut obs = Observation::new(store.clone(), "heart_rate".into(), json!(72));
        let stored = obs.insert().await.expect("insert observation");
        let id = get_i64(&stored, "observation_id").expect("observation id");

        let mut hydrated = Observation::from_id(store, id);
        hydrated.populate().await.expect("populate");
        assert_eq!(hydrated.name.as_deref(), Some("heart_rate"));
        assert_eq!(hydrated.value, Some(json!(72)));
    }

    #[tokio::test]
    async fn insert_requires_name_and_value() {
        let store: Arc<dyn Store> = Arc::new(in_memory_store());
        let mut obs = Observation::new(store, "heart_rate".into(), Value::Null);
        let err = obs.insert().await.expect_err("null value");
        assert!(matches!(err, CoreError::MissingFields { fields, .. } if fields == vec!["value"]));
    }

    #[tokio::test]
    async fn document_resolves_owning_report() {
        let store: Arc<dyn Store> = Arc::new(in_memory_store());
        let mut obs = Observation::new(store.clone(), "systolic_bp".into(), json!(120));
        let stored = obs.insert().await.expect("insert observation");
        let id = get_i64(&stored, "observation_id").expect("observation id");
        let report_id = link_report(&store, "systolic_bp", id).await;

        let doc = obs.document().await.expect("project document");
        assert_eq!(
            doc.subject.reference,
            format!("DiagnosticReport/{report_id}")
        );
        assert_eq!(doc.value_quantity.unit, Some("mmHg"));
    }

    #[tokio::test]
    async fn unlinked_observation_has_no_document() {
        let store: Arc<dyn Store> = Arc::new(in_memory_store());
        let mut obs = Observation::new(store, "heart_rate".into(), json!(60));
        obs.insert().await.expect("insert observation");
        let err = obs.document().await.expect_err("no linking report");
        assert!(matches!(err, CoreError::NotFound { resource } if resource == "DiagnosticReport"));
    }
}
