use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};

use super::datetime::to_storage;

/// Distinguish a missing field from an explicit `null` in PATCH bodies.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// absent gives `None`, `null` gives `Some(None)`, a value gives `Some(Some(v))`.
pub fn double_option<'de, T, D>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

/// SQL assignments collected from a patch payload.
///
/// Repositories push one entry per field that was present in the request
/// and hand the list to `db::repository::apply_changes`.
#[derive(Debug, Default)]
pub struct Changes {
    pub(crate) assignments: Vec<(&'static str, rusqlite::types::Value)>,
}

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &'static str, value: impl Into<rusqlite::types::Value>) {
        self.assignments.push((column, value.into()));
    }

    /// Record a nullable text column from a double option.
    pub fn text(&mut self, column: &'static str, field: &Option<Option<String>>) {
        if let Some(value) = field {
            self.set(column, value.clone());
        }
    }

    /// Record a non-nullable text column; explicit nulls are ignored.
    pub fn required_text(&mut self, column: &'static str, field: &Option<String>) {
        if let Some(value) = field {
            self.set(column, value.clone());
        }
    }

    pub fn int(&mut self, column: &'static str, field: &Option<Option<i64>>) {
        if let Some(value) = field {
            self.set(column, *value);
        }
    }

    pub fn datetime(&mut self, column: &'static str, field: &Option<Option<NaiveDateTime>>) {
        if let Some(value) = field {
            self.set(column, value.as_ref().map(to_storage));
        }
    }

    pub fn required_datetime(&mut self, column: &'static str, field: &Option<NaiveDateTime>) {
        if let Some(value) = field {
            self.set(column, to_storage(value));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.assignments.iter().any(|(c, _)| *c == column)
    }
}
