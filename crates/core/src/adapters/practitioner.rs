//! Practitioner adapter. Read-only: practitioners are provisioned outside
//! this surface.

use crate::schema::tables;
use crate::validate::{get_datetime, get_i64, get_string};
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use fhir::PractitionerDocument;
use std::sync::Arc;
use ward_store::{Predicate, Row, Store};

pub struct Practitioner {
    store: Arc<dyn Store>,
    pub practitioner_id: Option<i64>,
    pub name: Option<String>,
    pub username: Option<String>,
    pub added: Option<DateTime<Utc>>,
}

impl Practitioner {
    pub fn from_id(store: Arc<dyn Store>, practitioner_id: i64) -> Self {
        Self {
            store,
            practitioner_id: Some(practitioner_id),
            name: None,
            username: None,
            added: None,
        }
    }

    pub fn from_row(store: Arc<dyn Store>, row: &Row) -> Self {
        Self {
            store,
            practitioner_id: get_i64(row, "practitioner_id"),
            name: get_string(row, "name"),
            username: get_string(row, "username"),
            added: get_datetime(row, "added"),
        }
    }

    /// Hydrates from the practitioner row; absence is a not-found outcome.
    pub async fn populate(&mut self) -> CoreResult<()> {
        let practitioner_id = self.practitioner_id.ok_or(CoreError::NotFound {
            resource: "Practitioner",
        })?;
        let rows = self
            .store
            .select(
                tables::PRACTITIONER,
                &Predicate::by("practitioner_id", practitioner_id),
            )
            .await?;
        let row = rows.first().ok_or(CoreError::NotFound {
            resource: "Practitioner",
        })?;
        self.practitioner_id = get_i64(row, "practitioner_id").or(self.practitioner_id);
        self.name = get_string(row, "name").or_else(|| self.name.take());
        self.username = get_string(row, "username").or_else(|| self.username.take());
        self.added = get_datetime(row, "added").or(self.added);
        Ok(())
    }

    /// Projects the practitioner document; incomplete state is not-found
    /// rather than a partial document.
    pub fn document(&self) -> CoreResult<PractitionerDocument> {
        let (Some(practitioner_id), Some(name), Some(added)) =
            (self.practitioner_id, self.name.clone(), self.added)
        else {
            return Err(CoreError::NotFound {
                resource: "Practitioner",
            });
        };
        Ok(PractitionerDocument::new(
            practitioner_id,
            name,
            self.username.clone().unwrap_or_default(),
            added,
        ))
    }

    /// Every practitioner as a document.
    pub async fn list(store: Arc<dyn Store>) -> CoreResult<Vec<PractitionerDocument>> {
        let rows = store.select(tables::PRACTITIONER, &Predicate::all()).await?;
        let mut documents = Vec::with_capacity(rows.len());
        for row in &rows {
            documents.push(Practitioner::from_row(store.clone(), row).document()?);
        }
        Ok(documents)
    }
}
