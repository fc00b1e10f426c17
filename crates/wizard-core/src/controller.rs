//! Section lifecycle controller
//!
//! Activation runs in a fixed order:
//!
//! 1. Fetch the remote record and subject metadata (failures read as absent)
//! 2. Read the local draft (failures read as absent)
//! 3. Merge defaults < remote < draft, pin inapplicable fields and clear
//!    dependents whose controller excludes them
//! 4. Attach the draft write-through, only now that the snapshot is complete
//!
//! Each activation takes a ticket from a monotonically increasing epoch. An
//! activation whose ticket is no longer current when its fetches resolve is
//! abandoned with [`LifecycleError::Superseded`] and applies nothing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use wizard_drafts::{DraftKey, DraftNamespace, DraftStore};
use wizard_remote::{RecordBackend, RemoteFetcher, SubjectMetadata};
use wizard_snapshot::{MergeResolver, MergeSources, SectionId, SectionKey, Source, SubjectId};

use crate::applicability::Applicability;
use crate::binding::DraftBinding;
use crate::catalog::{SectionCatalog, SectionDefinition};
use crate::config::{ConfigError, WizardConfig};
use crate::error::LifecycleError;
use crate::section::{Activated, ActivationId, ActiveSection};

/// Orchestrates section activation for one wizard session
#[derive(Debug)]
pub struct SectionController {
    catalog: Arc<SectionCatalog>,
    fetcher: RemoteFetcher,
    drafts: Arc<dyn DraftStore>,
    namespace: DraftNamespace,
    config: WizardConfig,
    epoch: AtomicU64,
}

impl SectionController {
    /// Create controller
    ///
    /// # Errors
    /// [`ConfigError`] if `config` does not validate
    pub fn new(
        catalog: Arc<SectionCatalog>,
        backend: Arc<dyn RecordBackend>,
        drafts: Arc<dyn DraftStore>,
        config: WizardConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let namespace = config.draft_namespace()?;
        let fetcher = RemoteFetcher::new(backend).with_timeout(config.fetch_timeout());

        Ok(Self {
            catalog,
            fetcher,
            drafts,
            namespace,
            config,
            epoch: AtomicU64::new(0),
        })
    }

    /// Section catalog
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &SectionCatalog {
        &self.catalog
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    /// Draft store
    #[inline]
    #[must_use]
    pub fn drafts(&self) -> &Arc<dyn DraftStore> {
        &self.drafts
    }

    /// Draft key of one section of one subject
    #[must_use]
    pub fn draft_key(&self, subject: SubjectId, section: &SectionId) -> DraftKey {
        self.namespace.key(SectionKey::new(
            subject,
            section.clone(),
            self.config.schema_version(),
        ))
    }

    /// Whether an activation holding `ticket` is still the newest
    fn is_current(&self, ticket: u64) -> bool {
        self.epoch.load(Ordering::Acquire) == ticket
    }

    /// Abandon every in-flight activation
    ///
    /// Call when the user navigates away before an activation resolves.
    pub fn cancel_pending(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }

    /// Activate `section` for `subject`
    ///
    /// # Errors
    /// - [`LifecycleError::UnknownSection`] if the catalog lacks `section`
    /// - [`LifecycleError::Superseded`] if a newer activation started (or
    ///   [`cancel_pending`](Self::cancel_pending) ran) before this one resolved
    pub async fn activate(
        &self,
        subject: SubjectId,
        section: &str,
    ) -> Result<ActiveSection, LifecycleError> {
        let definition = Arc::clone(self.definition(section)?);
        let ticket = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        let id = ActivationId::new();
        let schema = definition.schema();

        tracing::debug!(activation = %id, subject = %subject, section = %schema.id(), "activating section");

        let (remote, metadata) = tokio::join!(
            self.fetcher.fetch(subject, schema),
            self.fetcher.subject(subject),
        );

        if !self.is_current(ticket) {
            tracing::debug!(activation = %id, section = %schema.id(), "activation superseded");
            return Err(LifecycleError::Superseded {
                section: schema.id().clone(),
            });
        }

        let key = SectionKey::new(subject, schema.id().clone(), self.config.schema_version());
        let draft_key = self.namespace.key(key.clone());
        let draft = self.drafts.read(&draft_key).map(|mut draft| {
            let dropped = draft.retain_declared(schema);
            if !dropped.is_empty() {
                tracing::debug!(key = %draft_key, ?dropped, "ignored undeclared draft fields");
            }
            draft
        });

        let defaults = schema.defaults();
        let merged = MergeResolver::new().resolve(
            MergeSources::defaults_only(&defaults)
                .with_remote(remote.as_ref())
                .with_draft(draft.as_ref()),
        );

        let metadata = metadata.unwrap_or_else(|| SubjectMetadata::all_shifts(subject));
        let applicability = Applicability::for_subject(schema, &metadata);
        let mut snapshot = merged.snapshot;
        let pinned = applicability.pin_defaults(schema, &mut snapshot);
        if !pinned.is_empty() {
            tracing::debug!(activation = %id, ?pinned, "reset inapplicable fields");
        }

        let mut provenance = merged.provenance;
        for write in definition.reconciler().settle(&mut snapshot) {
            tracing::debug!(activation = %id, field = %write.field, "cleared stale dependent");
            provenance.insert(write.field, Source::Default);
        }

        let binding = Arc::new(DraftBinding::new(
            Arc::clone(&self.drafts),
            draft_key,
            draft.as_ref(),
        ));

        tracing::info!(
            activation = %id,
            subject = %subject,
            section = %schema.id(),
            remote = remote.is_some(),
            draft = draft.is_some(),
            "section active"
        );

        Ok(ActiveSection::new(Activated {
            id,
            key,
            definition: Arc::clone(&definition),
            snapshot,
            provenance,
            applicability,
            binding,
            backend: Arc::clone(self.fetcher.backend()),
            census_year: self.config.census_year,
            submit_timeout: self.config.submit_timeout(),
        }))
    }

    /// Remove the stored draft of a section without activating it
    ///
    /// # Errors
    /// [`LifecycleError::UnknownSection`] if the catalog lacks `section`
    pub fn discard_draft(&self, subject: SubjectId, section: &str) -> Result<(), LifecycleError> {
        let definition = self.definition(section)?;
        self.drafts.clear(&self.draft_key(subject, definition.id()));
        Ok(())
    }

    fn definition(&self, section: &str) -> Result<&Arc<SectionDefinition>, LifecycleError> {
        self.catalog
            .get(section)
            .ok_or_else(|| LifecycleError::UnknownSection(section.to_string()))
    }
}
