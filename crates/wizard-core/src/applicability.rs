//! Field applicability per subject
//!
//! A field group that requires a shift only applies to subjects offering
//! it. Inapplicable fields are pinned to their defaults, refuse edits, and
//! are skipped by validation.

use std::collections::BTreeSet;

use wizard_remote::SubjectMetadata;
use wizard_snapshot::{FormSnapshot, SectionSchema};

/// Set of fields that do not apply to the active subject
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Applicability {
    inapplicable: BTreeSet<String>,
}

impl Applicability {
    /// Every field applies
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Applicability of `schema`'s groups for a subject
    #[must_use]
    pub fn for_subject(schema: &SectionSchema, subject: &SubjectMetadata) -> Self {
        let inapplicable = schema
            .groups()
            .iter()
            .filter(|group| {
                group
                    .requires_shift
                    .is_some_and(|shift| !subject.offers(shift))
            })
            .flat_map(|group| group.fields.iter().cloned())
            .collect();
        Self { inapplicable }
    }

    /// Whether `field` applies
    #[inline]
    #[must_use]
    pub fn applies(&self, field: &str) -> bool {
        !self.inapplicable.contains(field)
    }

    /// Inapplicable fields
    pub fn inapplicable(&self) -> impl Iterator<Item = &str> {
        self.inapplicable.iter().map(String::as_str)
    }

    /// Reset every inapplicable field to its schema default
    ///
    /// # Returns
    /// Fields whose value changed
    pub fn pin_defaults(&self, schema: &SectionSchema, snapshot: &mut FormSnapshot) -> Vec<String> {
        let mut reset = Vec::new();
        for field in &self.inapplicable {
            let Some(default) = schema.default_of(field) else {
                continue;
            };
            if snapshot.get(field) == Some(default) {
                continue;
            }
            if snapshot.set(field, default.clone()).is_ok() {
                reset.push(field.clone());
            }
        }
        reset
    }
}
