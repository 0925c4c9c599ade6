//! One router per resource, all mounted under `/fhir`.

pub mod diagnostic_report;
pub mod encounter;
pub mod history;
pub mod location;
pub mod observation;
pub mod patient;
pub mod practitioner;
