//! Form and partial snapshots
//!
//! - [`FormSnapshot`]: complete field → value mapping bound to an active
//!   section. It always holds every declared field; values are replaced,
//!   fields are never added or removed.
//! - [`PartialSnapshot`]: any subset of fields, as delivered by the remote
//!   record or the local draft.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SnapshotError;
use crate::schema::SectionSchema;

/// Complete, materialized field mapping of one active section
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormSnapshot {
    fields: IndexMap<String, Value>,
}

impl FormSnapshot {
    /// Build from ordered pairs
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            fields: pairs.into_iter().collect(),
        }
    }

    /// Current value of a field
    #[inline]
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Whether the snapshot holds `field`
    #[inline]
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Replace the value of an existing field
    ///
    /// # Returns
    /// The previous value
    ///
    /// # Errors
    /// [`SnapshotError::UnknownField`] if the field is not part of the snapshot
    pub fn set(&mut self, field: &str, value: Value) -> Result<Value, SnapshotError> {
        match self.fields.get_mut(field) {
            Some(slot) => Ok(std::mem::replace(slot, value)),
            None => Err(SnapshotError::UnknownField(field.to_string())),
        }
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the snapshot is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Copy the named fields into a partial snapshot
    ///
    /// Names not held by this snapshot are ignored.
    #[must_use]
    pub fn restrict<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> PartialSnapshot {
        let mut partial = PartialSnapshot::new();
        for name in fields {
            if let Some(value) = self.fields.get(name) {
                partial.insert(name, value.clone());
            }
        }
        partial
    }

    /// Copy every field into a JSON object
    #[must_use]
    pub fn to_json_map(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Subset of a section's fields
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartialSnapshot {
    fields: IndexMap<String, Value>,
}

impl PartialSnapshot {
    /// Create empty partial snapshot
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object
    #[must_use]
    pub fn from_json_map(map: Map<String, Value>) -> Self {
        Self {
            fields: map.into_iter().collect(),
        }
    }

    /// Insert or replace a field
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(field.into(), value)
    }

    /// Value of a field, if defined
    #[inline]
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Whether the field is defined (a `null` value still counts)
    #[inline]
    #[must_use]
    pub fn contains_key(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Number of defined fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field is defined
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Defined field names
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Iterate defined fields
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Drop every field the schema does not declare
    ///
    /// # Returns
    /// Names of the dropped fields
    pub fn retain_declared(&mut self, schema: &SectionSchema) -> Vec<String> {
        let mut dropped = Vec::new();
        self.fields.retain(|name, _| {
            let keep = schema.declares(name);
            if !keep {
                dropped.push(name.clone());
            }
            keep
        });
        dropped
    }

    /// Copy into a JSON object
    #[must_use]
    pub fn to_json_map(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl FromIterator<(String, Value)> for PartialSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
