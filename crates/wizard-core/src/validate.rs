//! Submission validation
//!
//! The lifecycle controller asks a [`SectionValidator`] before every
//! submission. [`SchemaValidator`] checks what the field schema and rule
//! table can express; hosts with richer rules plug in their own.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use wizard_snapshot::value::{is_blank, read_number};
use wizard_snapshot::{FieldKind, FieldSpec, FormSnapshot};

use crate::applicability::Applicability;
use crate::catalog::SectionDefinition;

/// What is wrong with one field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    /// Required field left blank (or a required flag unchecked)
    Required,
    /// Number field holds something unparseable
    NotANumber {
        /// Offending value
        value: Value,
    },
    /// Number below the declared minimum
    BelowMinimum {
        /// Declared minimum
        min: f64,
        /// Parsed value
        value: f64,
    },
    /// Value outside the declared options
    UnknownOption {
        /// Offending value
        value: Value,
    },
    /// A dependency rule left the snapshot inconsistent
    Rule {
        /// Rule name
        rule: String,
        /// Description
        message: String,
    },
}

/// One validation failure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Field concerned (the rule's first affected field for rule violations)
    pub field: String,
    /// Failure kind
    #[serde(flatten)]
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::Required => write!(f, "{}: required", self.field),
            ViolationKind::NotANumber { value } => {
                write!(f, "{}: not a number ({value})", self.field)
            }
            ViolationKind::BelowMinimum { min, value } => {
                write!(f, "{}: {value} is below minimum {min}", self.field)
            }
            ViolationKind::UnknownOption { value } => {
                write!(f, "{}: {value} is not an allowed option", self.field)
            }
            ViolationKind::Rule { message, .. } => write!(f, "{}: {message}", self.field),
        }
    }
}

/// All violations found in one snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Violations in field declaration order, rule violations last
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Whether nothing was flagged
    #[inline]
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of violations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Whether the report is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations concerning `field`
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Violation> + 'a {
        self.violations.iter().filter(move |v| v.field == field)
    }

    fn push(&mut self, field: &str, kind: ViolationKind) {
        self.violations.push(Violation {
            field: field.to_string(),
            kind,
        });
    }

    fn into_result(self) -> Result<(), Self> {
        if self.passed() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} violation(s)", self.violations.len())?;
        for (i, v) in self.violations.iter().enumerate() {
            f.write_str(if i == 0 { ": " } else { "; " })?;
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Pre-submission check of a settled snapshot
pub trait SectionValidator: Send + Sync {
    /// Validate `snapshot` for `section`, skipping inapplicable fields
    ///
    /// # Errors
    /// A [`ValidationReport`] listing every violation found
    fn validate(
        &self,
        section: &SectionDefinition,
        snapshot: &FormSnapshot,
        applicability: &Applicability,
    ) -> Result<(), ValidationReport>;
}

/// Validator driven by the section schema and rule table
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    /// Create validator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn check_field(spec: &FieldSpec, value: &Value, report: &mut ValidationReport) {
        let name = spec.name.as_str();
        let missing = match spec.kind {
            FieldKind::Flag => value.as_bool() != Some(true),
            _ => is_blank(value),
        };
        if missing {
            if spec.required {
                report.push(name, ViolationKind::Required);
            }
            return;
        }

        match &spec.kind {
            FieldKind::Number { min } => match read_number(value) {
                None => report.push(
                    name,
                    ViolationKind::NotANumber {
                        value: value.clone(),
                    },
                ),
                Some(n) => {
                    if let Some(min) = *min {
                        if n < min {
                            report.push(name, ViolationKind::BelowMinimum { min, value: n });
                        }
                    }
                }
            },
            FieldKind::Choice { options } => {
                if !value.as_str().is_some_and(|v| options.iter().any(|o| o == v)) {
                    report.push(
                        name,
                        ViolationKind::UnknownOption {
                            value: value.clone(),
                        },
                    );
                }
            }
            FieldKind::MultiChoice { options } => {
                let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
                let foreign = if value.is_array() {
                    items
                        .iter()
                        .find(|item| !item.as_str().is_some_and(|v| options.iter().any(|o| o == v)))
                        .cloned()
                } else {
                    Some(value.clone())
                };
                if let Some(value) = foreign {
                    report.push(name, ViolationKind::UnknownOption { value });
                }
            }
            FieldKind::Text | FieldKind::Flag => {}
        }
    }
}

impl SectionValidator for SchemaValidator {
    fn validate(
        &self,
        section: &SectionDefinition,
        snapshot: &FormSnapshot,
        applicability: &Applicability,
    ) -> Result<(), ValidationReport> {
        let mut report = ValidationReport::default();

        for spec in section.schema().fields() {
            if !applicability.applies(&spec.name) {
                continue;
            }
            let value = snapshot.get(&spec.name).unwrap_or(&Value::Null);
            Self::check_field(spec, value, &mut report);
        }

        for rule in section.reconciler().table().iter() {
            let Some(message) = rule.violation(snapshot, section.reconciler().defaults()) else {
                continue;
            };
            let field = rule.affected().first().map_or("", String::as_str);
            if !applicability.applies(field) {
                continue;
            }
            report.push(
                field,
                ViolationKind::Rule {
                    rule: rule.name().to_string(),
                    message,
                },
            );
        }

        if !report.passed() {
            tracing::debug!(
                section = %section.id(),
                violations = report.len(),
                "snapshot failed validation"
            );
        }
        report.into_result()
    }
}
