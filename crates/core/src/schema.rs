//! The relational schema the adapters map onto.
//!
//! Table names and generated-key columns in one place. The diagnostic report
//! table is denormalised: one column per vital-sign kind holding that slot's
//! observation id (no join table). The three history association tables link
//! `medication_usage` rows to a `patient_history` parent, one table per
//! usage category.

use ward_store::MemoryStore;

pub mod tables {
    pub const CONTACT: &str = "contact";
    pub const PATIENT: &str = "patient";
    pub const LOCATION: &str = "location";
    pub const OBSERVATION: &str = "observation";
    pub const DIAGNOSTIC_REPORT: &str = "diagnostic_report";
    pub const ENCOUNTER: &str = "encounter";
    pub const PRACTITIONER: &str = "practitioner";
    pub const PATIENT_HISTORY: &str = "patient_history";
    pub const MEDICATION_USAGE: &str = "medication_usage";
    pub const HISTORY_PRESCRIPTION_USAGE: &str = "history_prescription_medication_usage";
    pub const HISTORY_OTC_USAGE: &str = "history_otc_medication_usage";
    pub const HISTORY_RECREATIONAL_USAGE: &str = "history_otc_drug_usage";
    pub const PRACTITIONER_PATIENTS: &str = "practitionerpatients";
}

/// An in-memory store with every table of the clinical schema declared.
///
/// The default backend for the server binary and the storage fixture for
/// every adapter test.
pub fn in_memory_store() -> MemoryStore {
    MemoryStore::new()
        .declare(tables::CONTACT, Some("contact_id"))
        .declare(tables::PATIENT, Some("patient_id"))
        .declare(tables::LOCATION, Some("location_id"))
        .declare(tables::OBSERVATION, Some("observation_id"))
        .declare(tables::DIAGNOSTIC_REPORT, Some("report_id"))
        .declare(tables::ENCOUNTER, Some("encounter_id"))
        .declare(tables::PRACTITIONER, Some("practitioner_id"))
        .declare(tables::PATIENT_HISTORY, Some("history_id"))
        .declare(tables::MEDICATION_USAGE, Some("medication_usage_id"))
        .declare(tables::HISTORY_PRESCRIPTION_USAGE, None)
        .declare(tables::HISTORY_OTC_USAGE, None)
        .declare(tables::HISTORY_RECREATIONAL_USAGE, None)
        .declare(tables::PRACTITIONER_PATIENTS, None)
}
