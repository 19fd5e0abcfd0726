//! State record - the typed fields threaded through a pipeline run

use crate::core::error::RecordError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Value stored in a record field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    /// Free text (generated or user supplied)
    Text(String),
    /// Path to a file produced by a stage
    Path(PathBuf),
}

impl FieldValue {
    /// Name of the value kind, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Path(_) => "path",
        }
    }

    /// Render the value as a string (paths are displayed lossily)
    pub fn render(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Path(p) => p.display().to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<PathBuf> for FieldValue {
    fn from(value: PathBuf) -> Self {
        FieldValue::Path(value)
    }
}

/// Accumulating work-in-progress record of one pipeline run
///
/// Fields are kept in name order so that two records with the same content
/// compare and serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl StateRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record from initial text fields
    pub fn from_texts<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), FieldValue::Text(v.into())))
                .collect(),
        }
    }

    /// Get a field, failing if it has not been produced yet
    pub fn get(&self, field: &str) -> Result<&FieldValue, RecordError> {
        self.fields.get(field).ok_or_else(|| RecordError::MissingField {
            field: field.to_string(),
        })
    }

    /// Get a text field
    pub fn text(&self, field: &str) -> Result<&str, RecordError> {
        match self.get(field)? {
            FieldValue::Text(s) => Ok(s),
            other => Err(RecordError::WrongKind {
                field: field.to_string(),
                expected: "text",
                found: other.kind(),
            }),
        }
    }

    /// Get a file path field
    pub fn path(&self, field: &str) -> Result<&Path, RecordError> {
        match self.get(field)? {
            FieldValue::Path(p) => Ok(p),
            other => Err(RecordError::WrongKind {
                field: field.to_string(),
                expected: "path",
                found: other.kind(),
            }),
        }
    }

    /// Check whether a field is present
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Names of all present fields, in order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Iterate over all fields
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Return this record with every key of `update` overwritten
    ///
    /// Keys not named by the update are preserved. Inserting into the map
    /// cannot fail, so either the whole update is applied or (when the
    /// caller rejects it beforehand) none of it is.
    pub fn merge(mut self, update: Update) -> Self {
        self.fields.extend(update.fields);
        self
    }
}

/// Partial update produced by a stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Update {
    fields: BTreeMap<String, FieldValue>,
}

impl Update {
    /// Create an empty update
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field to an arbitrary value
    pub fn set(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Set a text field
    pub fn text(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(field, FieldValue::Text(value.into()))
    }

    /// Set a file path field
    pub fn path(self, field: impl Into<String>, value: impl Into<PathBuf>) -> Self {
        self.set(field, FieldValue::Path(value.into()))
    }

    /// Names of the fields this update writes
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
