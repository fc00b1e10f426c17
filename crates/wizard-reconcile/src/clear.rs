//! Conditional clear rule
//!
//! A controller field gates a set of dependents. While the controller's
//! predicate holds the dependents are left alone; as soon as it stops
//! holding, every dependent is reset to its schema default (numbers to zero,
//! choices to unset).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use wizard_snapshot::value::contains_option;
use wizard_snapshot::FormSnapshot;

use crate::rule::{DependencyRule, Derivation, DerivedWrite, RuleContext};

/// Condition a controller value must satisfy to keep its dependents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum Predicate {
    /// Value equals the given value
    Equals(Value),
    /// Value equals one of the given values
    OneOf(Vec<Value>),
    /// Multi-select value contains the given option
    Contains(String),
    /// Value is `true`
    IsTrue,
}

impl Predicate {
    /// Shorthand for `Equals` on a string option
    #[inline]
    #[must_use]
    pub fn equals(option: &str) -> Self {
        Self::Equals(Value::from(option))
    }

    /// Shorthand for `Contains`
    #[inline]
    #[must_use]
    pub fn contains(option: &str) -> Self {
        Self::Contains(option.to_string())
    }

    /// Evaluate against a controller value
    #[must_use]
    pub fn holds(&self, value: &Value) -> bool {
        match self {
            Self::Equals(expected) => value == expected,
            Self::OneOf(options) => options.contains(value),
            Self::Contains(option) => contains_option(value, option),
            Self::IsTrue => value.as_bool() == Some(true),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals(expected) => write!(f, "{expected}"),
            Self::OneOf(options) => {
                let options: Vec<String> = options.iter().map(Value::to_string).collect();
                write!(f, "one of {}", options.join(", "))
            }
            Self::Contains(option) => write!(f, "selecting \"{option}\""),
            Self::IsTrue => f.write_str("true"),
        }
    }
}

/// Reset `dependents` to defaults whenever `controller` fails `predicate`
#[derive(Debug, Clone)]
pub struct ClearRule {
    name: String,
    controller: Vec<String>,
    predicate: Predicate,
    dependents: Vec<String>,
}

impl ClearRule {
    /// Create rule
    #[must_use]
    pub fn new(controller: &str, predicate: Predicate, dependents: &[&str]) -> Self {
        Self {
            name: format!("clear({controller}->{})", dependents.join(",")),
            controller: vec![controller.to_string()],
            predicate,
            dependents: dependents.iter().map(ToString::to_string).collect(),
        }
    }

    /// Controller field
    #[inline]
    #[must_use]
    pub fn controller(&self) -> &str {
        &self.controller[0]
    }

    /// Predicate the controller must satisfy
    #[inline]
    #[must_use]
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Whether the dependents currently apply
    #[must_use]
    pub fn is_active(&self, controller_value: &Value) -> bool {
        self.predicate.holds(controller_value)
    }

    fn is_active_in(&self, snapshot: &FormSnapshot) -> bool {
        self.is_active(snapshot.get(self.controller()).unwrap_or(&Value::Null))
    }

    /// Dependents holding something other than their default while the
    /// controller is inactive
    fn stale<'a>(
        &'a self,
        snapshot: &'a FormSnapshot,
        defaults: &'a FormSnapshot,
    ) -> impl Iterator<Item = (&'a String, Value)> + 'a {
        let inactive = !self.is_active_in(snapshot);
        self.dependents
            .iter()
            .filter(move |_| inactive)
            .filter_map(move |dependent| {
                let default = defaults.get(dependent).cloned().unwrap_or(Value::Null);
                (snapshot.get(dependent) != Some(&default)).then_some((dependent, default))
            })
    }
}

impl DependencyRule for ClearRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn triggers(&self) -> &[String] {
        &self.controller
    }

    fn affected(&self) -> &[String] {
        &self.dependents
    }

    fn derive(&self, ctx: &RuleContext<'_>) -> Derivation {
        self.stale(ctx.snapshot, ctx.defaults)
            .map(|(dependent, default)| DerivedWrite::new(dependent.clone(), default))
            .collect()
    }

    fn violation(&self, snapshot: &FormSnapshot, defaults: &FormSnapshot) -> Option<String> {
        let stale: Vec<&str> = self
            .stale(snapshot, defaults)
            .map(|(dependent, _)| dependent.as_str())
            .collect();
        (!stale.is_empty()).then(|| {
            format!(
                "{} must be cleared while {} is not {}",
                stale.join(", "),
                self.controller(),
                self.predicate
            )
        })
    }

    fn locks(&self, field: &str, snapshot: &FormSnapshot) -> bool {
        self.dependents.iter().any(|d| d == field) && !self.is_active_in(snapshot)
    }

    fn settles_on_load(&self) -> bool {
        true
    }
}
