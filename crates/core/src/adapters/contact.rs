//! Contact adapter.
//!
//! A contact is the person attached to exactly one patient. It has no
//! document shape of its own — it only ever appears embedded in a patient
//! document — so this adapter covers construction, hydration and insert.

use crate::schema::tables;
use crate::validate::{datetime_value, get_datetime, get_i64, get_string, require};
use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use ward_store::{Predicate, Row, Store};

const REQUIRED: &[&str] = &["prefix", "fullname", "given", "phone"];

/// Caller-supplied fields for a new contact.
#[derive(Clone, Debug, Default)]
pub struct ContactSeed {
    pub prefix: Option<String>,
    pub fullname: Option<String>,
    pub given: Option<String>,
    pub family: Option<String>,
    pub phone: Option<String>,
}

pub struct Contact {
    store: Arc<dyn Store>,
    pub contact_id: Option<i64>,
    pub prefix: Option<String>,
    pub fullname: Option<String>,
    pub given: Option<String>,
    pub family: Option<String>,
    pub phone: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Contact {
    /// Constructs a contact from caller-supplied fields.
    pub fn new(store: Arc<dyn Store>, seed: ContactSeed) -> Self {
        Self {
            store,
            contact_id: None,
            prefix: seed.prefix,
            fullname: seed.fullname,
            given: seed.given,
            family: seed.family,
            phone: seed.phone,
            last_updated: None,
        }
    }

    /// Constructs a contact carrying only its identifier, ready to populate.
    pub fn from_id(store: Arc<dyn Store>, contact_id: i64) -> Self {
        Self {
            store,
            contact_id: Some(contact_id),
            prefix: None,
            fullname: None,
            given: None,
            family: None,
            phone: None,
            last_updated: None,
        }
    }

    /// Hydrates every field from the contact's row.
    pub async fn populate(&mut self) -> CoreResult<()> {
        let contact_id = self.contact_id.ok_or(CoreError::NotFound {
            resource: "Contact",
        })?;
        let rows = self
            .store
            .select(tables::CONTACT, &Predicate::by("contact_id", contact_id))
            .await?;
        let row = rows.first().ok_or(CoreError::NotFound {
            resource: "Contact",
        })?;
        self.merge(row);
        Ok(())
    }

    /// Validates and inserts the contact, returning the stored row.
    pub async fn insert(&mut self) -> CoreResult<Row> {
        self.last_updated = Some(Utc::now());
        let row = self.to_row();
        require("Contact", &row, REQUIRED)?;
        let stored = self.store.insert(tables::CONTACT, row).await?;
        self.contact_id = get_i64(&stored, "contact_id");
        Ok(stored)
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        for (column, value) in [
            ("prefix", &self.prefix),
            ("fullname", &self.fullname),
            ("given", &self.given),
            ("family", &self.family),
            ("phone", &self.phone),
        ] {
            if let Some(value) = value {
                row.insert(column.to_string(), value.clone().into());
            }
        }
        if let Some(last_updated) = self.last_updated {
            row.insert("last_updated".to_string(), datetime_value(last_updated));
        }
        row
    }

    fn merge(&mut self, row: &Row) {
        self.contact_id = get_i64(row, "contact_id").or(self.contact_id);
        self.prefix = get_string(row, "prefix").or_else(|| self.prefix.take());
        self.fullname = get_string(row, "fullname").or_else(|| self.fullname.take());
        self.given = get_string(row, "given").or_else(|| self.given.take());
        self.family = get_string(row, "family").or_else(|| self.family.take());
        self.phone = get_string(row, "phone").or_else(|| self.phone.take());
        self.last_updated = get_datetime(row, "last_updated").or(self.last_updated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::in_memory_store;

    fn seed() -> ContactSeed {
        ContactSeed {
            prefix: Some("Mrs".into()),
            fullname: Some("Jane Williams".into()),
            given: Some("Jane".into()),
            family: Some("Williams".into()),
            phone: Some("01234 567890".into()),
        }
    }

    #[tokio::test]
    async fn insert_then_populate_round_trips() {
        let store: Arc<dyn Store> = Arc::new(in_memory_store());
        let mut contact = Contact::new(store.clone(), seed());
        let stored = contact.insert().await.expect("insert contact");
        let id = crate::validate::get_i64(&stored, "contact_id").expect("generated id");

        let mut hydrated = Contact::from_id(store, id);
        hydrated.populate().await.expect("populate contact");
        assert_eq!(hydrated.prefix.as_deref(), Some("Mrs"));
        assert_eq!(hydrated.fullname.as_deref(), Some("Jane Williams"));
        assert_eq!(hydrated.given.as_deref(), Some("Jane"));
        assert_eq!(hydrated.phone.as_deref(), Some("01234 567890"));
        assert!(hydrated.last_updated.is_some());
    }

    #[tokio::test]
    async fn insert_rejects_missing_required_field_and_writes_nothing() {
        let store: Arc<dyn Store> = Arc::new(in_memory_store());
        let mut incomplete = seed();
        incomplete.phone = None;
        let mut contact = Contact::new(store.clone(), incomplete);

        let err = contact.insert().await.expect_err("should reject");
        match err {
            CoreError::MissingFields { resource, fields } => {
                assert_eq!(resource, "Contact");
                assert_eq!(fields, vec!["phone"]);
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }

        let mut probe = Contact::from_id(store, 1);
        let err = probe.populate().await.expect_err("no row should exist");
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn populate_without_identifier_is_not_found() {
        let store: Arc<dyn Store> = Arc::new(in_memory_store());
        let mut contact = Contact::new(store, ContactSeed::default());
        let err = contact.populate().await.expect_err("no id");
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
