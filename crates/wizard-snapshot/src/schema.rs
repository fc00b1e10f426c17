//! Section field schemas
//!
//! A [`SectionSchema`] declares every field a section owns, each field's
//! kind and default, and the optional field groups that only apply to some
//! subjects. The schema is static: it is built once when the section
//! definition loads and never mutated afterwards.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SnapshotError;
use crate::ids::SectionId;
use crate::snapshot::FormSnapshot;

/// Kind of value a field holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Numeric input, optionally bounded below
    Number {
        /// Inclusive lower bound
        min: Option<f64>,
    },
    /// Free text
    Text,
    /// Exactly one of the listed options
    Choice {
        /// Allowed options
        options: Vec<String>,
    },
    /// Any subset of the listed options
    MultiChoice {
        /// Allowed options
        options: Vec<String>,
    },
    /// Boolean checkbox
    Flag,
}

impl FieldKind {
    /// Default value for a field of this kind
    ///
    /// Numbers start at zero, collections empty, flags unchecked, and
    /// text or single choices unset.
    #[must_use]
    pub fn default_value(&self) -> Value {
        match self {
            Self::Number { .. } => Value::from(0),
            Self::Text | Self::Choice { .. } => Value::Null,
            Self::MultiChoice { .. } => Value::Array(Vec::new()),
            Self::Flag => Value::Bool(false),
        }
    }

    /// Options for choice kinds
    #[must_use]
    pub fn options(&self) -> Option<&[String]> {
        match self {
            Self::Choice { options } | Self::MultiChoice { options } => Some(options),
            _ => None,
        }
    }
}

/// Declaration of one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name (wire key)
    pub name: String,
    /// Value kind
    pub kind: FieldKind,
    /// Must be filled before submit
    pub required: bool,
    /// Value used when no other source defines the field
    pub default: Value,
}

impl FieldSpec {
    fn with_kind(name: &str, kind: FieldKind) -> Self {
        let default = kind.default_value();
        Self {
            name: name.to_string(),
            kind,
            required: false,
            default,
        }
    }

    /// Non-negative number field
    #[must_use]
    pub fn number(name: &str) -> Self {
        Self::with_kind(name, FieldKind::Number { min: Some(0.0) })
    }

    /// Unbounded number field
    #[must_use]
    pub fn signed_number(name: &str) -> Self {
        Self::with_kind(name, FieldKind::Number { min: None })
    }

    /// Free text field
    #[must_use]
    pub fn text(name: &str) -> Self {
        Self::with_kind(name, FieldKind::Text)
    }

    /// Single choice field
    #[must_use]
    pub fn choice(name: &str, options: &[&str]) -> Self {
        Self::with_kind(
            name,
            FieldKind::Choice {
                options: options.iter().map(ToString::to_string).collect(),
            },
        )
    }

    /// Multiple choice field
    #[must_use]
    pub fn multi_choice(name: &str, options: &[&str]) -> Self {
        Self::with_kind(
            name,
            FieldKind::MultiChoice {
                options: options.iter().map(ToString::to_string).collect(),
            },
        )
    }

    /// Checkbox field
    #[must_use]
    pub fn flag(name: &str) -> Self {
        Self::with_kind(name, FieldKind::Flag)
    }

    /// Mark as required
    #[inline]
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Override the kind default
    #[inline]
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = default;
        self
    }
}

/// School shift a field group may depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shift {
    /// Morning (manhã)
    Morning,
    /// Afternoon (tarde)
    Afternoon,
    /// Night (noite)
    Night,
    /// Full-time (integral)
    FullTime,
}

impl Shift {
    /// All shifts
    pub const ALL: [Shift; 4] = [Self::Morning, Self::Afternoon, Self::Night, Self::FullTime];
}

/// Named set of fields that is only applicable to some subjects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldGroup {
    /// Group name
    pub name: String,
    /// Member fields
    pub fields: Vec<String>,
    /// Shift the subject must offer for the group to apply
    pub requires_shift: Option<Shift>,
}

impl FieldGroup {
    /// Create group applicable to every subject
    #[must_use]
    pub fn new(name: &str, fields: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            fields: fields.iter().map(ToString::to_string).collect(),
            requires_shift: None,
        }
    }

    /// Restrict the group to subjects offering `shift`
    #[inline]
    #[must_use]
    pub fn requires(mut self, shift: Shift) -> Self {
        self.requires_shift = Some(shift);
        self
    }
}

/// Static definition of one wizard section
#[derive(Debug, Clone, PartialEq)]
pub struct SectionSchema {
    id: SectionId,
    title: String,
    fields: IndexMap<String, FieldSpec>,
    groups: Vec<FieldGroup>,
}

impl SectionSchema {
    /// Start building a schema
    #[must_use]
    pub fn builder(id: SectionId, title: impl Into<String>) -> SectionSchemaBuilder {
        SectionSchemaBuilder {
            id,
            title: title.into(),
            fields: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Section id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &SectionId {
        &self.id
    }

    /// Human readable title
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Whether the section declares `field`
    #[inline]
    #[must_use]
    pub fn declares(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Lookup field declaration
    #[inline]
    #[must_use]
    pub fn field(&self, field: &str) -> Option<&FieldSpec> {
        self.fields.get(field)
    }

    /// Declared fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values()
    }

    /// Declared field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of declared fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the section declares no fields
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Optional field groups
    #[inline]
    #[must_use]
    pub fn groups(&self) -> &[FieldGroup] {
        &self.groups
    }

    /// Group a field belongs to, if any
    #[must_use]
    pub fn group_of(&self, field: &str) -> Option<&FieldGroup> {
        self.groups
            .iter()
            .find(|g| g.fields.iter().any(|f| f == field))
    }

    /// Default value of a declared field
    #[must_use]
    pub fn default_of(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).map(|spec| &spec.default)
    }

    /// Materialize the default snapshot
    #[must_use]
    pub fn defaults(&self) -> FormSnapshot {
        FormSnapshot::from_pairs(
            self.fields
                .values()
                .map(|spec| (spec.name.clone(), spec.default.clone())),
        )
    }
}

/// Builder for [`SectionSchema`]
#[derive(Debug)]
pub struct SectionSchemaBuilder {
    id: SectionId,
    title: String,
    fields: Vec<FieldSpec>,
    groups: Vec<FieldGroup>,
}

impl SectionSchemaBuilder {
    /// Declare a field
    #[must_use]
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Declare an optional group over already declared fields
    #[must_use]
    pub fn group(mut self, group: FieldGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Finish the schema
    ///
    /// # Errors
    /// - [`SnapshotError::DuplicateField`] if a field is declared twice
    /// - [`SnapshotError::UnknownField`] if a group names an undeclared field
    pub fn build(self) -> Result<SectionSchema, SnapshotError> {
        let mut fields = IndexMap::with_capacity(self.fields.len());
        for spec in self.fields {
            if fields.contains_key(&spec.name) {
                return Err(SnapshotError::duplicate_field(self.id.as_str(), spec.name));
            }
            fields.insert(spec.name.clone(), spec);
        }

        for group in &self.groups {
            if let Some(missing) = group.fields.iter().find(|f| !fields.contains_key(*f)) {
                return Err(SnapshotError::UnknownField(missing.clone()));
            }
        }

        Ok(SectionSchema {
            id: self.id,
            title: self.title,
            fields,
            groups: self.groups,
        })
    }
}
