//! Patient adapter.
//!
//! The patient row owns one contact (hydrated alongside it) and may carry a
//! photo. The photo arrives as a base64 data URL, is decoded and written to
//! blob storage before the row insert, and only its path is recorded in the
//! row. The blob write is not rolled back if the row insert then fails; the
//! partial state is logged for operator reconciliation.
//!
//! Deletion removes the rows that exist solely to support the patient
//! (history, practitioner links) before the patient row, and the photo blob
//! last, so a storage failure cannot leave a blob referenced by nothing.

use crate::adapters::contact::Contact;
use crate::schema::tables;
use crate::validate::{
    datetime_value, get_bool, get_datetime, get_i64, get_string, require,
};
use crate::{CoreError, CoreResult};
use base64::Engine;
use chrono::{DateTime, Utc};
use fhir::patient::{Attachment, ContactEntry, HumanName, Identifier, Telecom};
use fhir::PatientDocument;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use ward_store::{BlobStore, Predicate, Row, Store};

const REQUIRED: &[&str] = &["active", "fullname", "given", "prefix", "gender", "contact_id"];

/// Caller-supplied fields for a new patient.
#[derive(Clone, Debug, Default)]
pub struct PatientSeed {
    pub fullname: Option<String>,
    pub given: Option<String>,
    pub family: Option<String>,
    pub prefix: Option<String>,
    pub gender: Option<String>,
    /// Base64 data URL (`data:image/jpeg;base64,...`).
    pub photo: Option<String>,
}

pub struct Patient {
    store: Arc<dyn Store>,
    blobs: Arc<dyn BlobStore>,
    pub patient_id: Option<i64>,
    pub active: Option<bool>,
    pub fullname: Option<String>,
    pub given: Option<String>,
    pub family: Option<String>,
    pub prefix: Option<String>,
    pub gender: Option<String>,
    pub photo: Option<String>,
    pub photo_url: Option<String>,
    pub contact_id: Option<i64>,
    pub last_updated: Option<DateTime<Utc>>,
    pub contact: Option<Contact>,
}

impl Patient {
    /// Constructs a patient from caller-supplied fields.
    pub fn new(store: Arc<dyn Store>, blobs: Arc<dyn BlobStore>, seed: PatientSeed) -> Self {
        Self {
            store,
            blobs,
            patient_id: None,
            active: None,
            fullname: seed.fullname,
            given: seed.given,
            family: seed.family,
            prefix: seed.prefix,
            gender: seed.gender,
            photo: seed.photo,
            photo_url: None,
            contact_id: None,
            last_updated: None,
            contact: None,
        }
    }

    /// Constructs a patient carrying only its identifier.
    pub fn from_id(store: Arc<dyn Store>, blobs: Arc<dyn BlobStore>, patient_id: i64) -> Self {
        let mut patient = Self::new(store, blobs, PatientSeed::default());
        patient.patient_id = Some(patient_id);
        patient
    }

    /// Hydrates the patient and its contact from storage.
    pub async fn populate(&mut self) -> CoreResult<()> {
        let patient_id = self.patient_id.ok_or(CoreError::NotFound {
            resource: "Patient",
        })?;
        let rows = self
            .store
            .select(tables::PATIENT, &Predicate::by("patient_id", patient_id))
            .await?;
        let row = rows.first().ok_or(CoreError::NotFound {
            resource: "Patient",
        })?;
        self.merge(row);

        let contact_id = self.contact_id.ok_or(CoreError::MissingContact)?;
        let mut contact = Contact::from_id(self.store.clone(), contact_id);
        contact.populate().await?;
        self.contact = Some(contact);
        Ok(())
    }

    /// Validates and inserts the patient, returning the stored row.
    ///
    /// A photo, when present, is decoded and written to blob storage first;
    /// the row then records only the blob path. The two writes are not
    /// atomic — see the module docs.
    pub async fn insert(&mut self) -> CoreResult<Row> {
        self.last_updated = Some(Utc::now());
        self.active = Some(true);

        let mut row = self.to_row();
        require("Patient", &row, REQUIRED)?;

        if let Some(photo) = self.photo.clone() {
            let photo_url = self.store_photo(&photo).await?;
            row.insert("photo_url".to_string(), photo_url.clone().into());
            self.photo_url = Some(photo_url);
        }

        let stored = match self.store.insert(tables::PATIENT, row).await {
            Ok(stored) => stored,
            Err(e) => {
                if let Some(photo_url) = &self.photo_url {
                    tracing::warn!(photo_url, "patient row insert failed after photo write");
                }
                return Err(e.into());
            }
        };
        self.patient_id = get_i64(&stored, "patient_id");
        Ok(stored)
    }

    /// Writes the present subset of fields, stamping a fresh timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NothingToUpdate`] when no updatable field is
    /// set, and [`CoreError::NotFound`] when the row predicate matched
    /// nothing.
    pub async fn update(&mut self) -> CoreResult<()> {
        let patient_id = self.patient_id.ok_or(CoreError::NotFound {
            resource: "Patient",
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
                tables::PATIENT,
                changes,
                &Predicate::by("patient_id", patient_id),
            )
            .await?;
        if touched == 0 {
            return Err(CoreError::NotFound {
                resource: "Patient",
            });
        }
        self.populate().await
    }

    /// Deletes the patient row, its supporting rows, and finally its photo.
    pub async fn delete(&self) -> CoreResult<()> {
        let patient_id = self.patient_id.ok_or(CoreError::NotFound {
            resource: "Patient",
        })?;
        let rows = self
            .store
            .select(tables::PATIENT, &Predicate::by("patient_id", patient_id))
            .await?;
        let row = rows.first().ok_or(CoreError::NotFound {
            resource: "Patient",
        })?;
        let photo_url = get_string(row, "photo_url");

        let by_patient = Predicate::by("patient_id", patient_id);
        self.store
            .delete(tables::PATIENT_HISTORY, &by_patient)
            .await?;
        self.store
            .delete(tables::PRACTITIONER_PATIENTS, &by_patient)
            .await?;
        self.store.delete(tables::PATIENT, &by_patient).await?;

        if let Some(photo_url) = photo_url {
            if self.blobs.exists(&photo_url).await? {
                self.blobs.delete(&photo_url).await?;
            }
        }
        Ok(())
    }

    /// Projects the patient into its document shape.
    ///
    /// Always re-populates first, so a raw identifier is sufficient input.
    /// Fails closed when the contact cannot be resolved.
    pub async fn document(&mut self) -> CoreResult<PatientDocument> {
        self.populate().await?;
        let contact = self.contact.as_ref().ok_or(CoreError::MissingContact)?;

        let photo = match &self.photo_url {
            Some(photo_url) if self.blobs.exists(photo_url).await? => {
                let bytes = self.blobs.read(photo_url).await?;
                vec![Attachment {
                    content_type: content_type_for(photo_url).to_string(),
                    url: photo_url.clone(),
                    hash: hex::encode(Sha256::digest(&bytes)),
                }]
            }
            _ => vec![],
        };

        Ok(PatientDocument {
            identifier: vec![Identifier::database_id()],
            resource_type: "Patient",
            id: self.patient_id.unwrap_or_default(),
            active: self.active.unwrap_or_default(),
            name: vec![HumanName::usual(
                self.fullname.clone().unwrap_or_default(),
                self.family.clone(),
                self.given.clone().unwrap_or_default(),
                self.prefix.as_deref().unwrap_or_default(),
            )],
            gender: self.gender.clone().unwrap_or_default(),
            photo,
            contact: vec![ContactEntry {
                name: HumanName::usual(
                    contact.fullname.clone().unwrap_or_default(),
                    contact.family.clone(),
                    contact.given.clone().unwrap_or_default(),
                    contact.prefix.as_deref().unwrap_or_default(),
                ),
                telecom: vec![Telecom::home_phone(
                    contact.phone.clone().unwrap_or_default(),
                )],
            }],
        })
    }

    /// All patients as documents; hydration fans out concurrently.
    ///
    /// Patients whose projection fails (for example a dangling contact
    /// reference) are logged and skipped rather than failing the whole list.
    pub async fn list(
        store: Arc<dyn Store>,
        blobs: Arc<dyn BlobStore>,
    ) -> CoreResult<Vec<PatientDocument>> {
        let rows = store.select(tables::PATIENT, &Predicate::all()).await?;
        Self::documents_for_rows(store, blobs, rows).await
    }

    /// Patients whose full name contains `needle`, case-insensitively.
    pub async fn search(
        store: Arc<dyn Store>,
        blobs: Arc<dyn BlobStore>,
        needle: &str,
    ) -> CoreResult<Vec<PatientDocument>> {
        let needle = needle.to_lowercase();
        let rows = store
            .select(tables::PATIENT, &Predicate::all())
            .await?
            .into_iter()
            .filter(|row| {
                get_string(row, "fullname")
                    .map(|name| name.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
            .collect();
        Self::documents_for_rows(store, blobs, rows).await
    }

    async fn documents_for_rows(
        store: Arc<dyn Store>,
        blobs: Arc<dyn BlobStore>,
        rows: Vec<Row>,
    ) -> CoreResult<Vec<PatientDocument>> {
        let projections = rows.iter().filter_map(|row| {
            let patient_id = get_i64(row, "patient_id")?;
            let mut patient = Patient::from_id(store.clone(), blobs.clone(), patient_id);
            Some(async move { (patient_id, patient.document().await) })
        });
        let mut documents = Vec::new();
        for (patient_id, projected) in futures::future::join_all(projections).await {
            match projected {
                Ok(document) => documents.push(document),
                Err(e) => tracing::warn!(patient_id, error = %e, "skipping unprojectable patient"),
            }
        }
        Ok(documents)
    }

    async fn store_photo(&self, photo: &str) -> CoreResult<String> {
        let (content_type, bytes) = decode_data_url(photo)?;
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let photo_url = format!(
            "/patient/{}-{}.{}",
            self.given.as_deref().unwrap_or("patient"),
            &nonce[..8],
            extension_for(&content_type),
        );
        self.blobs.write(&photo_url, &bytes).await?;
        Ok(photo_url)
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        if let Some(active) = self.active {
            row.insert("active".to_string(), active.into());
        }
        for (column, value) in [
            ("fullname", &self.fullname),
            ("given", &self.given),
            ("family", &self.family),
            ("prefix", &self.prefix),
            ("gender", &self.gender),
            ("photo_url", &self.photo_url),
        ] {
            if let Some(value) = value {
                row.insert(column.to_string(), value.clone().into());
            }
        }
        if let Some(contact_id) = self.contact_id {
            row.insert("contact_id".to_string(), contact_id.into());
        }
        if let Some(last_updated) = self.last_updated {
            row.insert("last_updated".to_string(), datetime_value(last_updated));
        }
        row
    }

    fn merge(&mut self, row: &Row) {
        self.patient_id = get_i64(row, "patient_id").or(self.patient_id);
        self.active = get_bool(row, "active").or(self.active);
        self.fullname = get_string(row, "fullname").or_else(|| self.fullname.take());
        self.given = get_string(row, "given").or_else(|| self.given.take());
        self.family = get_string(row, "family").or_else(|| self.family.take());
        self.prefix = get_string(row, "prefix").or_else(|| self.prefix.take());
        self.gender = get_string(row, "gender").or_else(|| self.gender.take());
        self.photo_url = get_string(row, "photo_url").or_else(|| self.photo_url.take());
        self.contact_id = get_i64(row, "contact_id").or(self.contact_id);
        self.last_updated = get_datetime(row, "last_updated").or(self.last_updated);
    }
}

/// Splits a `data:<mime>;base64,<payload>` URL into content type and bytes.
fn decode_data_url(data: &str) -> CoreResult<(String, Vec<u8>)> {
    let rest = data
        .strip_prefix("data:")
        .ok_or_else(|| CoreError::InvalidPhoto("not a data URL".to_string()))?;
    let (content_type, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| CoreError::InvalidPhoto("missing base64 payload".to_string()))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| CoreError::InvalidPhoto(e.to_string()))?;
    Ok((content_type.to_string(), bytes))
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}

fn content_type_for(path: &str) -> &'static str {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::contact::{Contact, ContactSeed};
    use crate::schema::in_memory_store;
    use ward_store::MemoryBlobStore;

    fn stores() -> (Arc<dyn Store>, Arc<dyn BlobStore>) {
        (
            Arc::new(in_memory_store()),
            Arc::new(MemoryBlobStore::new()),
        )
    }

    async fn insert_contact(store: Arc<dyn Store>) -> i64 {
        let mut contact = Contact::new(
            store,
            ContactSeed {
                prefix: Some("Mrs".into()),
                fullname: Some("Jane Williams".into()),
                given: Some("Jane".into()),
                family: Some("Williams".into()),
                phone: Some("01234 567890".into()),
            },
        );
        let row = contact.insert().await.expect("insert contact");
        get_i64(&row, "contact_id").expect("contact id")
    }

    fn seed() -> PatientSeed {
        PatientSeed {
            fullname: Some("Sarah Williams".into()),
            given: Some("Sarah".into()),
            family: Some("Williams".into()),
            prefix: Some("Ms".into()),
            gender: Some("female".into()),
            photo: None,
        }
    }

    // A 1x1 transparent PNG.
    const PHOTO: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[tokio::test]
    async fn insert_then_document_round_trips() {
        let (store, blobs) = stores();
        let contact_id = insert_contact(store.clone()).await;

        let mut patient = Patient::new(store.clone(), blobs.clone(), seed());
        patient.contact_id = Some(contact_id);
        let stored = patient.insert().await.expect("insert patient");
        let id = get_i64(&stored, "patient_id").expect("patient id");

        let mut hydrated = Patient::from_id(store, blobs, id);
        let doc = hydrated.document().await.expect("project document");
        assert_eq!(doc.id, id);
        assert!(doc.active);
        assert_eq!(doc.name[0].text, "Sarah Williams");
        assert_eq!(doc.contact[0].telecom[0].value, "01234 567890");
        assert!(doc.photo.is_empty());
    }

    #[tokio::test]
    async fn insert_rejects_missing_contact_reference() {
        let (store, blobs) = stores();
        let mut patient = Patient::new(store.clone(), blobs, seed());
        let err = patient.insert().await.expect_err("no contact id");
        assert!(
            matches!(err, CoreError::MissingFields { fields, .. } if fields == vec!["contact_id"])
        );
        let rows = store
            .select(tables::PATIENT, &Predicate::all())
            .await
            .expect("select");
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn photo_is_written_to_blob_storage_and_hashed() {
        let (store, blobs) = stores();
        let contact_id = insert_contact(store.clone()).await;

        let mut with_photo = seed();
        with_photo.photo = Some(PHOTO.into());
        let mut patient = Patient::new(store.clone(), blobs.clone(), with_photo);
        patient.contact_id = Some(contact_id);
        let stored = patient.insert().await.expect("insert patient");

        let photo_url = get_string(&stored, "photo_url").expect("photo url recorded");
        assert!(photo_url.starts_with("/patient/Sarah-"));
        assert!(photo_url.ends_with(".png"));
        assert!(blobs.exists(&photo_url).await.expect("exists"));

        let id = get_i64(&stored, "patient_id").expect("patient id");
        let mut hydrated = Patient::from_id(store, blobs, id);
        let doc = hydrated.document().await.expect("project document");
        assert_eq!(doc.photo.len(), 1);
        assert_eq!(doc.photo[0].content_type, "image/png");
        assert_eq!(doc.photo[0].hash.len(), 64);
    }

    #[tokio::test]
    async fn document_fails_closed_without_contact() {
        let (store, blobs) = stores();
        // Row with a contact reference pointing nowhere.
        let mut row = Row::new();
        row.insert("fullname".to_string(), "Ghost".into());
        row.insert("active".to_string(), true.into());
        row.insert("contact_id".to_string(), 99.into());
        let stored = store
            .insert(tables::PATIENT, row)
            .await
            .expect("insert raw row");
        let id = get_i64(&stored, "patient_id").expect("patient id");

        let mut patient = Patient::from_id(store, blobs, id);
        let err = patient.document().await.expect_err("dangling contact");
        assert!(matches!(err, CoreError::NotFound { resource } if resource == "Contact"));
    }

    #[tokio::test]
    async fn delete_removes_supporting_rows_then_blob() {
        let (store, blobs) = stores();
        let contact_id = insert_contact(store.clone()).await;

        let mut with_photo = seed();
        with_photo.photo = Some(PHOTO.into());
        let mut patient = Patient::new(store.clone(), blobs.clone(), with_photo);
        patient.contact_id = Some(contact_id);
        let stored = patient.insert().await.expect("insert patient");
        let id = get_i64(&stored, "patient_id").expect("patient id");
        let photo_url = get_string(&stored, "photo_url").expect("photo url");

        // Supporting rows that only exist for this patient.
        let mut link = Row::new();
        link.insert("patient_id".to_string(), id.into());
        link.insert("practitioner_id".to_string(), 1.into());
        store
            .insert(tables::PRACTITIONER_PATIENTS, link)
            .await
            .expect("insert link");

        let target = Patient::from_id(store.clone(), blobs.clone(), id);
        target.delete().await.expect("delete patient");

        assert!(store
            .select(tables::PATIENT, &Predicate::by("patient_id", id))
            .await
            .expect("select")
            .is_empty());
        assert!(store
            .select(tables::PRACTITIONER_PATIENTS, &Predicate::by("patient_id", id))
            .await
            .expect("select")
            .is_empty());
        assert!(!blobs.exists(&photo_url).await.expect("exists"));
    }

    #[tokio::test]
    async fn update_rejects_an_empty_change_set() {
        let (store, blobs) = stores();
        let contact_id = insert_contact(store.clone()).await;
        let mut patient = Patient::new(store.clone(), blobs.clone(), seed());
        patient.contact_id = Some(contact_id);
        let stored = patient.insert().await.expect("insert patient");
        let id = get_i64(&stored, "patient_id").expect("patient id");

        let mut untouched = Patient::from_id(store, blobs, id);
        let err = untouched.update().await.expect_err("nothing to update");
        assert!(matches!(err, CoreError::NothingToUpdate));
    }

    #[tokio::test]
    async fn update_writes_only_the_present_subset() {
        let (store, blobs) = stores();
        let contact_id = insert_contact(store.clone()).await;
        let mut patient = Patient::new(store.clone(), blobs.clone(), seed());
        patient.contact_id = Some(contact_id);
        let stored = patient.insert().await.expect("insert patient");
        let id = get_i64(&stored, "patient_id").expect("patient id");

        let mut changed = Patient::from_id(store.clone(), blobs, id);
        changed.gender = Some("other".into());
        changed.update().await.expect("update patient");

        // Re-populated after the write.
        assert_eq!(changed.gender.as_deref(), Some("other"));
        assert_eq!(changed.fullname.as_deref(), Some("Sarah Williams"));
    }

    #[tokio::test]
    async fn search_matches_case_insensitively() {
        let (store, blobs) = stores();
        let contact_id = insert_contact(store.clone()).await;
        let mut patient = Patient::new(store.clone(), blobs.clone(), seed());
        patient.contact_id = Some(contact_id);
        patient.insert().await.expect("insert patient");

        let hits = Patient::search(store.clone(), blobs.clone(), "sarah")
            .await
            .expect("search");
        assert_eq!(hits.len(), 1);
        let misses = Patient::search(store, blobs, "zebra").await.expect("search");
        assert!(misses.is_empty());
    }
}
