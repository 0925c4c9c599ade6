//! Resource adapters.
//!
//! One module per record type. Each adapter owns the full lifecycle of its
//! relational row shape:
//!
//! - **construct** — from caller-supplied fields (a `*Seed`) or from an
//!   identifier alone
//! - **populate** — hydrate from storage by identifier; fails with
//!   `NotFound` when the row is absent
//! - **insert** — validate the type's required-field list, stamp a fresh
//!   `last_updated`, write exactly one row, return it with generated columns
//! - **update** — write only the present subset of fields under the row
//!   predicate; rejects an empty subset
//! - **delete** — remove the row and anything that exists solely to support
//!   it, dependents first
//! - **document** — pure projection into the `fhir` wire shapes, possibly
//!   after nested hydration of related resources
//!
//! Cross-references between adapters are weak typed references
//! (`"Patient/3"`), never cascading ownership. Each request builds its own
//! adapter instances around shared `Arc<dyn Store>`/`Arc<dyn BlobStore>`
//! handles; adapters hold no global state.

pub mod contact;
pub mod diagnostic_report;
pub mod encounter;
pub mod location;
pub mod observation;
pub mod patient;
pub mod practitioner;
