//! # Ward Core
//!
//! Resource mapping and composite persistence for the ward record system.
//!
//! This crate owns the translation between relational rows and the FHIR
//! document shapes in the `fhir` crate:
//! - one [`adapters`] module per record type, each owning hydration
//!   (`populate`), validated insert, update, delete, and document projection
//! - the [`history`] composite writer/reader (one parent row plus three
//!   independent many-to-many child sets)
//! - the relational [`schema`] (table names, generated-key columns)
//!
//! Storage is injected: every adapter takes `Arc<dyn Store>` (and, for
//! Patient, `Arc<dyn BlobStore>`) at construction, so tests run against the
//! in-memory backends with no further setup.
//!
//! **No API concerns**: HTTP routing, query-parameter handling and
//! outcome-to-response conversion belong in `api-rest`.

pub mod adapters;
pub mod config;
pub mod error;
pub mod history;
pub mod schema;
pub(crate) mod validate;

pub use adapters::contact::{Contact, ContactSeed};
pub use adapters::diagnostic_report::DiagnosticReport;
pub use adapters::encounter::{Encounter, EncounterSeed, Include};
pub use adapters::location::{Location, LocationSeed};
pub use adapters::observation::Observation;
pub use adapters::patient::{Patient, PatientSeed};
pub use adapters::practitioner::Practitioner;
pub use config::CoreConfig;
pub use error::{CoreError, CoreResult};
pub use history::{HistoryIntake, HistoryWriter};
