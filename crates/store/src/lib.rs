//! Storage interfaces for the ward record system.
//!
//! This crate defines the two external collaborators the mapping layer talks
//! to, and nothing else:
//!
//! - [`Store`] — durable keyed row storage with simple predicate-based
//!   select/insert/update/delete. Predicates are equality maps; anything
//!   richer (substring search, pagination) is layered above the store.
//! - [`BlobStore`] — binary payload storage at a caller-derived path, used
//!   for patient photos.
//!
//! Both traits are object-safe and async so adapters receive them as
//! `Arc<dyn Store>` / `Arc<dyn BlobStore>` rather than importing a
//! process-wide handle. The in-process implementations ([`MemoryStore`],
//! [`FsBlobStore`], [`MemoryBlobStore`]) back the server binary and the test
//! suites alike.

pub mod blob;
pub mod memory;

pub use blob::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use memory::MemoryStore;

use serde_json::Value;

/// A stored row: column name to JSON value.
///
/// Rows deliberately stay schemaless at this boundary; each adapter owns the
/// projection between its typed fields and this shape.
pub type Row = serde_json::Map<String, Value>;

/// Errors surfaced by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unknown table: {0}")]
    UnknownTable(String),
    #[error("backend failure: {0}")]
    Backend(String),
    #[error("blob not found: {0}")]
    BlobNotFound(String),
    #[error("invalid blob path: {0}")]
    InvalidBlobPath(String),
    #[error("blob I/O failure: {0}")]
    BlobIo(#[from] std::io::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// An equality predicate over row columns.
///
/// The empty predicate matches every row (a whole-table select).
#[derive(Clone, Debug, Default)]
pub struct Predicate {
    terms: Vec<(String, Value)>,
}

impl Predicate {
    /// A predicate with no terms; matches all rows.
    pub fn all() -> Self {
        Self::default()
    }

    /// A single-term equality predicate.
    pub fn by(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and(column, value)
    }

    /// Adds another equality term.
    pub fn and(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.terms.push((column.into(), value.into()));
        self
    }

    /// Whether the given row satisfies every term.
    pub fn matches(&self, row: &Row) -> bool {
        self.terms
            .iter()
            .all(|(column, value)| row.get(column) == Some(value))
    }

    pub fn terms(&self) -> &[(String, Value)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Relational row storage consumed by the resource adapters.
///
/// Implementations must not interpret row contents beyond the predicate
/// columns. `insert` returns the stored row including any generated columns
/// (primary keys), which callers echo back to clients.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Returns all rows of `table` matching `predicate`.
    async fn select(&self, table: &str, predicate: &Predicate) -> StoreResult<Vec<Row>>;

    /// Inserts one row, returning the stored row with generated columns.
    async fn insert(&self, table: &str, row: Row) -> StoreResult<Row>;

    /// Applies `changes` to every row matching `predicate`; returns the
    /// number of rows touched.
    async fn update(&self, table: &str, changes: Row, predicate: &Predicate) -> StoreResult<u64>;

    /// Deletes every row matching `predicate`; returns the number removed.
    async fn delete(&self, table: &str, predicate: &Predicate) -> StoreResult<u64>;
}
