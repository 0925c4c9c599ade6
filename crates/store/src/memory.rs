//! In-memory [`Store`] backend.
//!
//! Rows live in a `tokio::sync::RwLock`-guarded table map; primary keys are
//! assigned from per-table sequences, mirroring serial columns in the SQL
//! schema this store stands in for. Tables must be declared up front (name
//! plus optional generated-key column) so a typo in a table name surfaces as
//! [`StoreError::UnknownTable`] rather than silently creating a new table.

use crate::{Predicate, Row, Store, StoreError, StoreResult};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    tables: HashMap<String, Vec<Row>>,
    sequences: HashMap<String, i64>,
}

/// Declared shape of one table.
#[derive(Clone, Copy, Debug)]
struct TableSpec {
    /// Generated-key column, if the table has one. Association tables do not.
    primary_key: Option<&'static str>,
}

/// An in-process relational store.
///
/// Used as the default backend for the server binary and as the storage fake
/// in every adapter test — the behaviour under test is identical either way.
pub struct MemoryStore {
    specs: HashMap<&'static str, TableSpec>,
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Creates an empty store with no declared tables.
    pub fn new() -> Self {
        Self {
            specs: HashMap::new(),
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Declares a table, optionally with a generated-key column.
    pub fn declare(mut self, table: &'static str, primary_key: Option<&'static str>) -> Self {
        self.specs.insert(table, TableSpec { primary_key });
        self
    }

    fn spec(&self, table: &str) -> StoreResult<TableSpec> {
        self.specs
            .get(table)
            .copied()
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn select(&self, table: &str, predicate: &Predicate) -> StoreResult<Vec<Row>> {
        self.spec(table)?;
        let inner = self.inner.read().await;
        let rows = inner
            .tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| predicate.matches(row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }

    async fn insert(&self, table: &str, mut row: Row) -> StoreResult<Row> {
        let spec = self.spec(table)?;
        let mut inner = self.inner.write().await;
        if let Some(key) = spec.primary_key {
            if !row.contains_key(key) {
                let next = inner
                    .sequences
                    .entry(table.to_string())
                    .and_modify(|n| *n += 1)
                    .or_insert(1);
                row.insert(key.to_string(), Value::from(*next));
            }
        }
        inner
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, changes: Row, predicate: &Predicate) -> StoreResult<u64> {
        self.spec(table)?;
        let mut inner = self.inner.write().await;
        let mut touched = 0;
        if let Some(rows) = inner.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| predicate.matches(row)) {
                for (column, value) in &changes {
                    row.insert(column.clone(), value.clone());
                }
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn delete(&self, table: &str, predicate: &Predicate) -> StoreResult<u64> {
        self.spec(table)?;
        let mut inner = self.inner.write().await;
        let mut removed = 0;
        if let Some(rows) = inner.tables.get_mut(table) {
            let before = rows.len();
            rows.retain(|row| !predicate.matches(row));
            removed = (before - rows.len()) as u64;
        }
        Ok(removed)
    }
}
