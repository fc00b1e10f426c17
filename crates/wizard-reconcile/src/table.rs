//! Rule table
//!
//! Rules are indexed by trigger field once, when the section definition
//! loads. Dispatch for a changed field is a single map lookup that yields
//! the rules in declaration order.

use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

use wizard_snapshot::{FormSnapshot, SectionSchema};

use crate::error::ReconcileError;
use crate::rule::DependencyRule;

/// Static set of dependency rules for one section
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<Arc<dyn DependencyRule>>,
    by_trigger: HashMap<String, SmallVec<[usize; 2]>>,
}

impl RuleTable {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule (builder style)
    #[must_use]
    pub fn with(mut self, rule: impl DependencyRule + 'static) -> Self {
        self.push(Arc::new(rule));
        self
    }

    /// Add a shared rule
    pub fn push(&mut self, rule: Arc<dyn DependencyRule>) {
        let index = self.rules.len();
        for trigger in rule.triggers() {
            self.by_trigger
                .entry(trigger.clone())
                .or_default()
                .push(index);
        }
        self.rules.push(rule);
    }

    /// Rules triggered by a change of `field`, in declaration order
    pub fn rules_for<'a>(&'a self, field: &str) -> impl Iterator<Item = &'a dyn DependencyRule> + 'a {
        self.by_trigger
            .get(field)
            .map(|indices| indices.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |&i| -> &'a dyn DependencyRule { self.rules[i].as_ref() })
    }

    /// Whether any rule is triggered by `field`
    #[inline]
    #[must_use]
    pub fn is_trigger(&self, field: &str) -> bool {
        self.by_trigger.contains_key(field)
    }

    /// First rule holding `field` at its reset value in `snapshot`
    pub fn locking(&self, field: &str, snapshot: &FormSnapshot) -> Option<&dyn DependencyRule> {
        self.iter().find(|rule| rule.locks(field, snapshot))
    }

    /// All rules in declaration order
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = &'a dyn DependencyRule> + 'a {
        self.rules
            .iter()
            .map(|rule| -> &'a dyn DependencyRule { rule.as_ref() })
    }

    /// Number of rules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table holds no rules
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check that every field a rule mentions is declared by `schema`
    ///
    /// # Errors
    /// [`ReconcileError::InvalidRule`] naming the first rule that references
    /// an undeclared field
    pub fn validate_against(&self, schema: &SectionSchema) -> Result<(), ReconcileError> {
        for rule in self.iter() {
            let undeclared = rule
                .triggers()
                .iter()
                .chain(rule.affected())
                .find(|field| !schema.declares(field));
            if let Some(field) = undeclared {
                return Err(ReconcileError::invalid_rule(
                    rule.name(),
                    format!("field '{field}' not declared by section {}", schema.id()),
                ));
            }
        }
        Ok(())
    }
}
