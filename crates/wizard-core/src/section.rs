//! Active section
//!
//! An [`ActiveSection`] owns the live snapshot of one section for one
//! subject between activation and submission. Edits go through the
//! reconciler and then fan out to observers, the draft binding first.
//! Every method takes `&mut self` or `&self`, so edits and submissions of
//! one section never interleave.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use ulid::Ulid;

use wizard_reconcile::{ChangeObserver, ChangeSet, FieldEdit, ObserverSet};
use wizard_remote::{RecordBackend, SubmissionPayload, SubmissionStatus};
use wizard_snapshot::{FormSnapshot, SectionKey, Source};

use crate::applicability::Applicability;
use crate::binding::DraftBinding;
use crate::catalog::SectionDefinition;
use crate::error::{EditError, SubmitError};
use crate::validate::{SectionValidator, ValidationReport};

/// Identifier of one activation (for logs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActivationId(pub Ulid);

impl ActivationId {
    /// Generate new activation ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ActivationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActivationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an active section stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionState {
    /// Accepting edits
    Editing,
    /// Submission confirmed; draft cleared
    Submitted,
    /// Draft discarded without submitting
    Discarded,
}

/// Everything an activation resolved, handed to [`ActiveSection::new`]
pub(crate) struct Activated {
    pub(crate) id: ActivationId,
    pub(crate) key: SectionKey,
    pub(crate) definition: Arc<SectionDefinition>,
    pub(crate) snapshot: FormSnapshot,
    pub(crate) provenance: IndexMap<String, Source>,
    pub(crate) applicability: Applicability,
    pub(crate) binding: Arc<DraftBinding>,
    pub(crate) backend: Arc<dyn RecordBackend>,
    pub(crate) census_year: u16,
    pub(crate) submit_timeout: Duration,
}

/// Editable state of one section of one subject
pub struct ActiveSection {
    id: ActivationId,
    key: SectionKey,
    definition: Arc<SectionDefinition>,
    snapshot: FormSnapshot,
    provenance: IndexMap<String, Source>,
    applicability: Applicability,
    observers: ObserverSet,
    binding: Arc<DraftBinding>,
    backend: Arc<dyn RecordBackend>,
    census_year: u16,
    submit_timeout: Duration,
    state: SectionState,
}

impl ActiveSection {
    /// Bind an initialized snapshot; the draft binding is the first observer
    pub(crate) fn new(activated: Activated) -> Self {
        let mut observers = ObserverSet::new();
        observers.subscribe(Arc::clone(&activated.binding) as Arc<dyn ChangeObserver>);

        Self {
            id: activated.id,
            key: activated.key,
            definition: activated.definition,
            snapshot: activated.snapshot,
            provenance: activated.provenance,
            applicability: activated.applicability,
            observers,
            binding: activated.binding,
            backend: activated.backend,
            census_year: activated.census_year,
            submit_timeout: activated.submit_timeout,
            state: SectionState::Editing,
        }
    }

    /// Activation id
    #[inline]
    #[must_use]
    pub fn id(&self) -> ActivationId {
        self.id
    }

    /// Subject, section and schema version
    #[inline]
    #[must_use]
    pub fn key(&self) -> &SectionKey {
        &self.key
    }

    /// Section definition
    #[inline]
    #[must_use]
    pub fn definition(&self) -> &SectionDefinition {
        &self.definition
    }

    /// Live snapshot
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> &FormSnapshot {
        &self.snapshot
    }

    /// Current value of a field
    #[inline]
    #[must_use]
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.snapshot.get(field)
    }

    /// Source each field was loaded from at activation
    #[inline]
    #[must_use]
    pub fn provenance(&self) -> &IndexMap<String, Source> {
        &self.provenance
    }

    /// Fields that apply to this subject
    #[inline]
    #[must_use]
    pub fn applicability(&self) -> &Applicability {
        &self.applicability
    }

    /// Lifecycle state
    #[inline]
    #[must_use]
    pub fn state(&self) -> SectionState {
        self.state
    }

    /// Whether edits are still accepted
    #[inline]
    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.state == SectionState::Editing
    }

    /// Attach an observer notified after every settled change
    pub fn subscribe(&mut self, observer: Arc<dyn ChangeObserver>) {
        self.observers.subscribe(observer);
    }

    /// Apply a user edit, reconcile, then notify observers once
    ///
    /// # Errors
    /// - [`EditError::Closed`] after submit or discard
    /// - [`EditError::UnknownField`] for undeclared fields
    /// - [`EditError::NotApplicable`] for fields of inapplicable groups
    /// - [`EditError::Locked`] for non-default values in fields whose
    ///   controller currently excludes them
    pub fn edit(&mut self, field: &str, value: Value) -> Result<ChangeSet, EditError> {
        if !self.is_editing() {
            return Err(EditError::Closed);
        }
        if !self.definition.schema().declares(field) {
            return Err(EditError::UnknownField(field.to_string()));
        }
        if !self.applicability.applies(field) {
            return Err(EditError::NotApplicable(field.to_string()));
        }

        let changes = self
            .definition
            .reconciler()
            .apply(&mut self.snapshot, FieldEdit::new(field, value))?;

        tracing::debug!(
            activation = %self.id,
            section = %self.key.section,
            field,
            derived = changes.derived_count(),
            "field edited"
        );
        self.observers.notify(&changes, &self.snapshot);
        Ok(changes)
    }

    /// Run `validator` against the live snapshot
    ///
    /// # Errors
    /// Every violation found
    pub fn validate(&self, validator: &dyn SectionValidator) -> Result<(), ValidationReport> {
        validator.validate(&self.definition, &self.snapshot, &self.applicability)
    }

    /// Payload a submission would send
    #[must_use]
    pub fn payload(&self) -> SubmissionPayload {
        SubmissionPayload::new(
            self.key.subject,
            self.key.section.clone(),
            self.census_year,
            self.submission_status(),
            &self.snapshot,
        )
    }

    /// Status this section submits with
    #[inline]
    #[must_use]
    pub fn submission_status(&self) -> SubmissionStatus {
        self.definition.submission_status()
    }

    /// Validate and send the snapshot to the backend
    ///
    /// Only a confirmed write seals the draft binding, clears the draft and
    /// closes the section. On any failure the draft and the snapshot are
    /// left as they were, so the same data can be resubmitted.
    ///
    /// # Errors
    /// - [`SubmitError::Closed`] after submit or discard
    /// - [`SubmitError::Invalid`] if validation fails
    /// - [`SubmitError::Backend`] if the backend refuses or is unreachable
    /// - [`SubmitError::Timeout`] if the backend does not answer in time
    pub async fn submit(&mut self, validator: &dyn SectionValidator) -> Result<(), SubmitError> {
        if !self.is_editing() {
            return Err(SubmitError::Closed);
        }
        self.validate(validator).map_err(SubmitError::Invalid)?;

        let payload = self.payload();
        let write = self.backend.write_record(&payload);
        let outcome = match tokio::time::timeout(self.submit_timeout, write).await {
            Ok(result) => result.map_err(SubmitError::from),
            Err(_) => Err(SubmitError::Timeout {
                secs: self.submit_timeout.as_secs(),
            }),
        };

        if let Err(e) = outcome {
            tracing::warn!(
                activation = %self.id,
                section = %self.key.section,
                subject = %self.key.subject,
                error = %e,
                "submission failed, draft retained"
            );
            return Err(e);
        }

        self.binding.seal_and_clear();
        self.state = SectionState::Submitted;
        tracing::info!(
            activation = %self.id,
            section = %self.key.section,
            subject = %self.key.subject,
            status = %payload.status,
            "section submitted"
        );
        Ok(())
    }

    /// Drop the local draft and close the section without submitting
    pub fn discard(&mut self) {
        if !self.is_editing() {
            return;
        }
        self.binding.seal_and_clear();
        self.state = SectionState::Discarded;
        tracing::info!(
            activation = %self.id,
            section = %self.key.section,
            subject = %self.key.subject,
            "draft discarded"
        );
    }
}

impl fmt::Debug for ActiveSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveSection")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("state", &self.state)
            .field("draft_key", self.binding.key())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}
