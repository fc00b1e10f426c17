//! Section catalog
//!
//! The ordered list of wizard steps. Each step pairs a schema with the rule
//! table its reconciler runs; both are fixed once the catalog is built.

use indexmap::IndexMap;
use std::sync::Arc;

use wizard_reconcile::{ReconcileError, Reconciler, RuleTable};
use wizard_remote::SubmissionStatus;
use wizard_snapshot::{SectionId, SectionSchema, SnapshotError};

/// Errors raised while building a catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A schema failed to build
    #[error("schema error: {0}")]
    Schema(#[from] SnapshotError),

    /// A rule table does not fit its schema
    #[error("rule error: {0}")]
    Rules(#[from] ReconcileError),

    /// Two steps share an id
    #[error("duplicate section: {0}")]
    DuplicateSection(SectionId),

    /// No steps given
    #[error("catalog has no sections")]
    Empty,
}

/// One wizard step
#[derive(Debug, Clone)]
pub struct SectionDefinition {
    schema: SectionSchema,
    reconciler: Reconciler,
    position: usize,
    terminal: bool,
}

impl SectionDefinition {
    /// Section id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &SectionId {
        self.schema.id()
    }

    /// Display title
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        self.schema.title()
    }

    /// Field schema
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &SectionSchema {
        &self.schema
    }

    /// Reconciler over the section's rule table
    #[inline]
    #[must_use]
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Zero-based step position
    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether this is the last step
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Status sent with submissions of this step
    #[must_use]
    pub fn submission_status(&self) -> SubmissionStatus {
        if self.terminal {
            SubmissionStatus::Completed
        } else {
            SubmissionStatus::Draft
        }
    }
}

/// Ordered, immutable set of wizard steps
#[derive(Debug, Clone)]
pub struct SectionCatalog {
    sections: IndexMap<SectionId, Arc<SectionDefinition>>,
}

impl SectionCatalog {
    /// Build from ordered (schema, rules) pairs
    ///
    /// # Errors
    /// [`CatalogError`] on duplicate ids, an empty list, or a rule table
    /// mentioning fields its schema does not declare
    pub fn from_sections(
        sections: impl IntoIterator<Item = (SectionSchema, RuleTable)>,
    ) -> Result<Self, CatalogError> {
        let pairs: Vec<_> = sections.into_iter().collect();
        if pairs.is_empty() {
            return Err(CatalogError::Empty);
        }

        let last = pairs.len() - 1;
        let mut map = IndexMap::with_capacity(pairs.len());
        for (position, (schema, rules)) in pairs.into_iter().enumerate() {
            let reconciler = Reconciler::for_schema(&schema, rules)?;
            let id = schema.id().clone();
            if map.contains_key(&id) {
                return Err(CatalogError::DuplicateSection(id));
            }
            map.insert(
                id,
                Arc::new(SectionDefinition {
                    schema,
                    reconciler,
                    position,
                    terminal: position == last,
                }),
            );
        }

        Ok(Self { sections: map })
    }

    /// The census wizard's steps
    ///
    /// # Errors
    /// Only if a built-in definition is inconsistent
    pub fn census() -> Result<Self, CatalogError> {
        Self::from_sections(crate::census::sections()?)
    }

    /// Step by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<SectionDefinition>> {
        self.sections.get(id)
    }

    /// Step following `id`
    #[must_use]
    pub fn next_after(&self, id: &str) -> Option<&Arc<SectionDefinition>> {
        let index = self.sections.get_index_of(id)?;
        self.sections.get_index(index + 1).map(|(_, def)| def)
    }

    /// First step
    #[must_use]
    pub fn first(&self) -> Option<&Arc<SectionDefinition>> {
        self.sections.first().map(|(_, def)| def)
    }

    /// Steps in order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<SectionDefinition>> {
        self.sections.values()
    }

    /// Number of steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether the catalog is empty (never true once built)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wizard_reconcile::{ClearRule, Predicate};
    use wizard_snapshot::FieldSpec;

    fn schema(id: &str) -> SectionSchema {
        SectionSchema::builder(SectionId::new(id).unwrap(), id)
            .field(FieldSpec::number("n"))
            .build()
            .unwrap()
    }

    #[test]
    fn last_step_is_terminal() {
        let catalog = SectionCatalog::from_sections([
            (schema("a"), RuleTable::new()),
            (schema("b"), RuleTable::new()),
        ])
        .unwrap();

        let a = catalog.get("a").unwrap();
        assert_eq!(a.submission_status(), SubmissionStatus::Draft);
        assert_eq!(catalog.next_after("a").unwrap().id().as_str(), "b");
        assert!(catalog.next_after("b").is_none());
        assert_eq!(catalog.get("b").unwrap().submission_status(), SubmissionStatus::Completed);
    }

    #[test]
    fn rejects_duplicates_and_foreign_rules() {
        let err = SectionCatalog::from_sections([
            (schema("a"), RuleTable::new()),
            (schema("a"), RuleTable::new()),
        ])
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateSection(_)));

        let rules = RuleTable::new().with(ClearRule::new("x", Predicate::IsTrue, &["n"]));
        let err = SectionCatalog::from_sections([(schema("a"), rules)]).unwrap_err();
        assert!(matches!(err, CatalogError::Rules(_)));

        assert!(matches!(
            SectionCatalog::from_sections(Vec::new()),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn census_catalog_builds() {
        let catalog = SectionCatalog::census().unwrap();
        let ids: Vec<&str> = catalog.iter().map(|s| s.id().as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "identification",
                "general",
                "food",
                "cleaning",
                "security",
                "tech",
                "staff",
                "students",
                "management",
                "rating",
                "observations",
            ]
        );
        assert!(catalog.get("observations").unwrap().is_terminal());
    }
}
