//! Required-field validation and row access helpers.
//!
//! Every adapter validates the same way: build the row it intends to write,
//! then check the type's required-field list against it. The check is here,
//! once, parameterised by the field list, instead of being re-rolled per
//! adapter.

use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde_json::Value;
use ward_store::Row;

/// Whether a column value counts as absent for required-field purposes.
///
/// Nulls and empty strings are absent; `false` and `0` are present (they are
/// legitimate recorded answers).
pub(crate) fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Checks that every field in `required` is present and non-empty on `row`.
///
/// # Errors
///
/// Returns [`CoreError::MissingFields`] naming every absent field, so a
/// caller fixing its input sees the whole list at once.
pub(crate) fn require(resource: &'static str, row: &Row, required: &[&'static str]) -> CoreResult<()> {
    let missing: Vec<&'static str> = required
        .iter()
        .copied()
        .filter(|field| row.get(*field).map_or(true, is_empty_value))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::MissingFields {
            resource,
            fields: missing,
        })
    }
}

pub(crate) fn get_i64(row: &Row, column: &str) -> Option<i64> {
    match row.get(column) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

pub(crate) fn get_string(row: &Row, column: &str) -> Option<String> {
    match row.get(column) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    }
}

pub(crate) fn get_bool(row: &Row, column: &str) -> Option<bool> {
    row.get(column).and_then(Value::as_bool)
}

pub(crate) fn get_datetime(row: &Row, column: &str) -> Option<DateTime<Utc>> {
    match row.get(column) {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

/// A timestamp as stored in a row column.
pub(crate) fn datetime_value(dt: DateTime<Utc>) -> Value {
    Value::from(dt.to_rfc3339())
}
