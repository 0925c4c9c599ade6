//! Typed references between documents.
//!
//! A reference is a weak string pointer `"<ResourceType>/<id>"` embedded in
//! one document to name another. Construction and resolution are pure and
//! total; a malformed input (no recognised prefix) resolves to the raw
//! string, which is the caller's responsibility to avoid.

use std::fmt;

/// The resource types this surface produces and consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceType {
    Patient,
    Contact,
    Location,
    Observation,
    DiagnosticReport,
    Encounter,
    Practitioner,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceType::Patient => "Patient",
            ResourceType::Contact => "Contact",
            ResourceType::Location => "Location",
            ResourceType::Observation => "Observation",
            ResourceType::DiagnosticReport => "DiagnosticReport",
            ResourceType::Encounter => "Encounter",
            ResourceType::Practitioner => "Practitioner",
        };
        f.write_str(name)
    }
}

/// Reference construction and resolution.
pub struct Reference;

impl Reference {
    /// `"<Type>/<id>"`.
    pub fn new(resource_type: ResourceType, id: impl fmt::Display) -> String {
        format!("{resource_type}/{id}")
    }

    /// Strips the type prefix from a reference, returning the id part.
    ///
    /// Tolerates a bare id (no `/`), which some callers send in place of a
    /// full reference.
    pub fn id_part(reference: &str) -> &str {
        match reference.rsplit_once('/') {
            Some((_, id)) => id,
            None => reference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_typed_references() {
        assert_eq!(Reference::new(ResourceType::Patient, 3), "Patient/3");
        assert_eq!(
            Reference::new(ResourceType::DiagnosticReport, 17),
            "DiagnosticReport/17"
        );
    }

    #[test]
    fn strips_prefix_round_trip() {
        let reference = Reference::new(ResourceType::Observation, 42);
        assert_eq!(Reference::id_part(&reference), "42");
    }

    #[test]
    fn bare_ids_pass_through() {
        assert_eq!(Reference::id_part("42"), "42");
    }
}
