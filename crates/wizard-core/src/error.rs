//! Error types for the section lifecycle
//!
//! - [`EditError`]: a user edit was refused
//! - [`SubmitError`]: a submission did not commit
//! - [`LifecycleError`]: a section could not be activated
//! - [`WizardError`]: umbrella for hosts that handle all of the above
//!
//! [`ConfigError`] and [`CatalogError`] live next to the types they guard.

use wizard_reconcile::ReconcileError;
use wizard_remote::RemoteError;
use wizard_snapshot::{SectionId, SnapshotError};

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::validate::ValidationReport;

/// Edit refused by an active section
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    /// Field not declared by the section
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Field belongs to a group the subject does not offer
    #[error("field {0} does not apply to this subject")]
    NotApplicable(String),

    /// Field is gated by a controller that currently excludes it
    #[error("field {field} is locked by {rule}")]
    Locked {
        /// Field the edit targets
        field: String,
        /// Rule holding it at its default
        rule: String,
    },

    /// Section was submitted and no longer accepts edits
    #[error("section is closed")]
    Closed,
}

impl From<ReconcileError> for EditError {
    fn from(e: ReconcileError) -> Self {
        match e {
            ReconcileError::UnknownField(field) => Self::UnknownField(field),
            ReconcileError::Locked { field, rule } => Self::Locked { field, rule },
            ReconcileError::InvalidRule { rule, .. } => Self::UnknownField(rule),
        }
    }
}

/// Submission that did not commit; the draft is retained
#[derive(Debug, Clone, thiserror::Error)]
pub enum SubmitError {
    /// Validation collaborator refused the snapshot
    #[error("validation failed: {0}")]
    Invalid(ValidationReport),

    /// Backend refused or could not be reached
    #[error("backend rejected submission: {0}")]
    Backend(#[from] RemoteError),

    /// Backend did not confirm in time
    #[error("submission timed out after {secs}s")]
    Timeout {
        /// Configured bound
        secs: u64,
    },

    /// Section was already submitted
    #[error("section already submitted")]
    Closed,
}

impl SubmitError {
    /// Whether resubmitting the same snapshot may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Backend(e) => e.is_retryable(),
            Self::Timeout { .. } => true,
            Self::Invalid(_) | Self::Closed => false,
        }
    }
}

/// Section activation failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// Section not present in the catalog
    #[error("unknown section: {0}")]
    UnknownSection(String),

    /// A newer activation started before this one completed
    #[error("activation of {section} superseded")]
    Superseded {
        /// Section whose activation was abandoned
        section: SectionId,
    },
}

/// Umbrella error for hosts driving the wizard
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    /// Configuration invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Section catalog inconsistent
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Activation failed
    #[error("lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// Edit refused
    #[error("edit refused: {0}")]
    Edit(#[from] EditError),

    /// Submission failed
    #[error("submit failed: {0}")]
    Submit(#[from] SubmitError),

    /// Schema or payload error
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Backend error outside a submission
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Rule table inconsistent with its section
    #[error("reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),
}

impl WizardError {
    /// Whether retrying the failed operation may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Submit(e) => e.is_retryable(),
            Self::Remote(e) => e.is_retryable(),
            Self::Lifecycle(LifecycleError::Superseded { .. }) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(WizardError::from(SubmitError::Timeout { secs: 30 }).is_retryable());
        assert!(WizardError::from(SubmitError::from(RemoteError::status(503, "x"))).is_retryable());
        assert!(!WizardError::from(SubmitError::Closed).is_retryable());
        assert!(!WizardError::from(EditError::Closed).is_retryable());
    }

    #[test]
    fn reconcile_unknown_field_maps_to_edit_error() {
        let e = EditError::from(ReconcileError::UnknownField("x".into()));
        assert_eq!(e, EditError::UnknownField("x".into()));

        let e = EditError::from(ReconcileError::Locked {
            field: "qtd_anexos".into(),
            rule: "clear(possui_anexos->qtd_anexos)".into(),
        });
        assert_eq!(e.to_string(), "field qtd_anexos is locked by clear(possui_anexos->qtd_anexos)");
    }
}
