//! Error types for reconciliation

/// Errors raised by the reconciler
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// Edit names a field the section does not declare
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Edit targets a field a rule currently holds at its default
    #[error("field {field} is locked by {rule}")]
    Locked {
        /// Field the edit targets
        field: String,
        /// Rule holding it
        rule: String,
    },

    /// Rule definition is inconsistent with its section
    #[error("invalid rule {rule}: {reason}")]
    InvalidRule {
        /// Rule name
        rule: String,
        /// What is wrong
        reason: String,
    },
}

impl ReconcileError {
    /// Create invalid rule error
    #[inline]
    pub fn invalid_rule(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            rule: rule.into(),
            reason: reason.into(),
        }
    }
}
