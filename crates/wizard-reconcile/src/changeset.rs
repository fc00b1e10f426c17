//! Change records produced by one reconciliation

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a write came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum WriteOrigin {
    /// Direct user edit
    User,
    /// Derived by a dependency rule
    Derived {
        /// Rule name
        rule: String,
    },
}

/// One field write applied to the snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedWrite {
    /// Field written
    pub field: String,
    /// Value before the write
    pub previous: Value,
    /// Value after the write
    pub value: Value,
    /// Origin of the write
    #[serde(flatten)]
    pub origin: WriteOrigin,
}

impl AppliedWrite {
    /// Whether the write was derived
    #[inline]
    #[must_use]
    pub fn is_derived(&self) -> bool {
        matches!(self.origin, WriteOrigin::Derived { .. })
    }
}

/// Why a proposed derived write was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Target is the field the user just edited
    UserEditWins,
    /// Target was already derived earlier in the same transaction
    AlreadyDerived,
}

/// Proposed derived write that was not applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedWrite {
    /// Rule that proposed it
    pub rule: String,
    /// Target field
    pub field: String,
    /// Proposed value
    pub value: Value,
    /// Why it was dropped
    pub reason: SkipReason,
}

/// Outcome of one user edit and its derived cascade
///
/// Observers receive a change set once per edit, after the snapshot has
/// settled.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Field the user edited
    pub edited: String,
    /// Applied writes in application order (user write first, if any)
    pub writes: Vec<AppliedWrite>,
    /// Derived proposals that lost a conflict
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedWrite>,
}

impl ChangeSet {
    /// Create empty change set for an edit of `field`
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            edited: field.into(),
            writes: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Whether any field value changed
    #[inline]
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.writes.is_empty()
    }

    /// Whether the user's own write changed the edited field
    #[must_use]
    pub fn user_changed(&self) -> bool {
        self.writes.iter().any(|w| !w.is_derived())
    }

    /// Derived writes
    pub fn derived(&self) -> impl Iterator<Item = &AppliedWrite> {
        self.writes.iter().filter(|w| w.is_derived())
    }

    /// Number of derived writes
    #[must_use]
    pub fn derived_count(&self) -> usize {
        self.derived().count()
    }

    /// Fields whose value changed
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.writes.iter().map(|w| w.field.as_str())
    }

    /// Final value written to `field`, if it changed
    #[must_use]
    pub fn value_of(&self, field: &str) -> Option<&Value> {
        self.writes
            .iter()
            .rev()
            .find(|w| w.field == field)
            .map(|w| &w.value)
    }
}
