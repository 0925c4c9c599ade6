//! DiagnosticReport adapter.
//!
//! A report is a fixed-width tuple of up to seven observation ids, one
//! denormalised column per vital-sign kind — no join table. The slot layout
//! is hidden behind this adapter: callers only ever see the canonical slot
//! order, so swapping the columns for a join table later would not move any
//! caller.

use crate::adapters::observation::Observation;
use crate::schema::tables;
use crate::validate::{datetime_value, get_datetime, get_i64};
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use fhir::diagnostic_report::DiagnosticReportResource;
use fhir::{DiagnosticReportDocument, Reference, ResourceType, VitalSign};
use serde_json::Value;
use std::sync::Arc;
use ward_store::{Predicate, Row, Store};

pub struct DiagnosticReport {
    store: Arc<dyn Store>,
    pub report_id: Option<i64>,
    pub patient_id: Option<i64>,
    pub last_updated: Option<DateTime<Utc>>,
    /// Observation id per slot, in [`VitalSign::ALL`] order.
    slots: [Option<i64>; 7],
}

impl DiagnosticReport {
    /// Constructs a report from a row already read from storage.
    pub fn from_row(store: Arc<dyn Store>, row: &Row) -> Self {
        let mut slots = [None; 7];
        for (slot, kind) in slots.iter_mut().zip(VitalSign::ALL) {
            *slot = get_i64(row, kind.column());
        }
        Self {
            store,
            report_id: get_i64(row, "report_id"),
            patient_id: get_i64(row, "patient_id"),
            last_updated: get_datetime(row, "last_updated"),
            slots,
        }
    }

    /// Constructs a report carrying only its identifier.
    pub fn from_id(store: Arc<dyn Store>, report_id: i64) -> Self {
        Self {
            store,
            report_id: Some(report_id),
            patient_id: None,
            last_updated: None,
            slots: [None; 7],
        }
    }

    /// The observation id in the given kind's slot.
    pub fn slot(&self, kind: VitalSign) -> Option<i64> {
        let index = VitalSign::ALL.iter().position(|k| *k == kind)?;
        self.slots[index]
    }

    /// Hydrates the report from its row.
    pub async fn populate(&mut self) -> CoreResult<()> {
        let report_id = self.report_id.ok_or(CoreError::NotFound {
            resource: "DiagnosticReport",
        })?;
        let rows = self
            .store
            .select(
                tables::DIAGNOSTIC_REPORT,
                &Predicate::by("report_id", report_id),
            )
            .await?;
        let row = rows.first().ok_or(CoreError::NotFound {
            resource: "DiagnosticReport",
        })?;
        *self = Self::from_row(self.store.clone(), row);
        Ok(())
    }

    /// Cheap projection: present slots as bare observation references.
    pub fn document(&self) -> DiagnosticReportDocument {
        let result = self
            .present_slots()
            .map(|(_, id)| Value::from(Reference::new(ResourceType::Observation, id)))
            .collect();
        self.document_with(result)
    }

    /// Expensive projection: present slots resolved to full observation
    /// documents, one concurrent read per slot.
    pub async fn document_linked(&self) -> CoreResult<DiagnosticReportDocument> {
        let reads = self.present_slots().map(|(_, observation_id)| {
            let store = self.store.clone();
            async move {
                let rows = store
                    .select(
                        tables::OBSERVATION,
                        &Predicate::by("observation_id", observation_id),
                    )
                    .await?;
                let row = rows.first().ok_or(CoreError::NotFound {
                    resource: "Observation",
                })?;
                let document = Observation::from_row(store.clone(), row).document().await?;
                serde_json::to_value(document).map_err(|e| CoreError::Document(e.into()))
            }
        });
        let result = futures::future::try_join_all(reads).await?;
        Ok(self.document_with(result))
    }

    /// Creates a report plus its observations from one submitted resource.
    ///
    /// Every submitted observation is validated first (a recognised kind and
    /// a value); the observation rows are then inserted concurrently and the
    /// report row last, linking each slot by kind.
    pub async fn create(
        store: Arc<dyn Store>,
        resource: &DiagnosticReportResource,
    ) -> CoreResult<Row> {
        if resource.result.iter().any(|entry| !entry.is_complete()) {
            return Err(CoreError::MissingFields {
                resource: "DiagnosticReport",
                fields: vec!["result"],
            });
        }
        for entry in &resource.result {
            let name = entry.code.text.as_deref().unwrap_or_default();
            if VitalSign::parse(name).is_none() {
                return Err(CoreError::UnknownObservationKind(name.to_string()));
            }
        }
        let patient_id: i64 = resource
            .subject
            .as_deref()
            .and_then(|subject| Reference::id_part(subject).parse().ok())
            .ok_or(CoreError::MissingFields {
                resource: "DiagnosticReport",
                fields: vec!["subject"],
            })?;

        let inserts = resource.result.iter().map(|entry| {
            let mut observation = Observation::new(
                store.clone(),
                entry.code.text.clone().unwrap_or_default(),
                entry.value_quantity.value.clone().unwrap_or(Value::Null),
            );
            async move { observation.insert().await }
        });
        let observation_rows = futures::future::try_join_all(inserts).await?;

        let mut row = Row::new();
        for stored in &observation_rows {
            if let (Some(name), Some(observation_id)) = (
                stored.get("name").and_then(Value::as_str),
                get_i64(stored, "observation_id"),
            ) {
                row.insert(name.to_string(), observation_id.into());
            }
        }
        row.insert("patient_id".to_string(), patient_id.into());
        let last_updated = resource
            .meta
            .as_ref()
            .and_then(|meta| meta.last_updated)
            .unwrap_or_else(Utc::now);
        row.insert("last_updated".to_string(), datetime_value(last_updated));

        Ok(store.insert(tables::DIAGNOSTIC_REPORT, row).await?)
    }

    /// One page of a patient's reports, newest first.
    pub async fn for_patient(
        store: Arc<dyn Store>,
        patient_id: i64,
        count: Option<usize>,
        page: Option<usize>,
    ) -> CoreResult<Vec<DiagnosticReport>> {
        let rows = store
            .select(
                tables::DIAGNOSTIC_REPORT,
                &Predicate::by("patient_id", patient_id),
            )
            .await?;
        let mut reports: Vec<DiagnosticReport> = rows
            .iter()
            .map(|row| DiagnosticReport::from_row(store.clone(), row))
            .collect();
        reports.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));

        if let Some(count) = count {
            let offset = count * page.unwrap_or(0);
            reports = reports.into_iter().skip(offset).take(count).collect();
        }
        Ok(reports)
    }

    /// Removes the report row.
    pub async fn delete(&self) -> CoreResult<()> {
        let report_id = self.report_id.ok_or(CoreError::NotFound {
            resource: "DiagnosticReport",
        })?;
        self.store
            .delete(
                tables::DIAGNOSTIC_REPORT,
                &Predicate::by("report_id", report_id),
            )
            .await?;
        Ok(())
    }

    fn present_slots(&self) -> impl Iterator<Item = (VitalSign, i64)> + '_ {
        VitalSign::ALL
            .into_iter()
            .zip(self.slots)
            .filter_map(|(kind, id)| id.map(|id| (kind, id)))
    }

    fn document_with(&self, result: Vec<Value>) -> DiagnosticReportDocument {
        DiagnosticReportDocument::new(
            self.report_id.unwrap_or_default(),
            Reference::new(ResourceType::Patient, self.patient_id.unwrap_or_default()),
            self.last_updated.unwrap_or_else(Utc::now),
            result,
        )
    }
}
