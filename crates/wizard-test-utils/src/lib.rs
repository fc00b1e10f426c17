//! Testing utilities for the census wizard workspace
//!
//! Shared fixtures: a two-step catalog small enough to reason about, a
//! draft store that counts and can fail writes, and an observer that
//! records every change set it sees.

#![allow(missing_docs)]

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use wizard_core::{SectionCatalog, SectionController, WizardConfig};
use wizard_drafts::{DraftError, DraftKey, DraftStore, MemoryDraftStore};
use wizard_reconcile::{ChangeObserver, ChangeSet, ClearRule, ComplementaryRule, Predicate, RuleTable};
use wizard_remote::{MemoryBackend, SubjectMetadata};
use wizard_snapshot::{
    FieldGroup, FieldSpec, FormSnapshot, PartialSnapshot, SectionId, SectionSchema, Shift,
    SubjectId,
};

pub const GENERAL: &str = "general";
pub const CLOSING: &str = "closing";

pub fn general_schema() -> SectionSchema {
    SectionSchema::builder(SectionId::new(GENERAL).unwrap(), "Dados Gerais")
        .field(FieldSpec::number("total_alunos").required())
        .field(FieldSpec::number("alunos_rural"))
        .field(FieldSpec::number("alunos_urbana"))
        .field(FieldSpec::choice("possui_anexos", &["Sim", "Não"]).required())
        .field(FieldSpec::number("qtd_anexos"))
        .field(FieldSpec::choice("tipo_predio_anexo", &["Próprio", "Alugado"]))
        .field(FieldSpec::number("turmas_noite"))
        .group(FieldGroup::new("turno_noite", &["turmas_noite"]).requires(Shift::Night))
        .build()
        .unwrap()
}

pub fn general_rules() -> RuleTable {
    RuleTable::new()
        .with(ComplementaryRule::new("alunos_rural", "alunos_urbana", "total_alunos"))
        .with(ClearRule::new(
            "possui_anexos",
            Predicate::equals("Sim"),
            &["qtd_anexos", "tipo_predio_anexo"],
        ))
}

pub fn closing_schema() -> SectionSchema {
    SectionSchema::builder(SectionId::new(CLOSING).unwrap(), "Observações")
        .field(FieldSpec::text("nome_responsavel").required())
        .field(FieldSpec::flag("declaracao_verdadeira").required())
        .build()
        .unwrap()
}

/// `general` then the terminal `closing` step
pub fn small_catalog() -> Arc<SectionCatalog> {
    Arc::new(
        SectionCatalog::from_sections([
            (general_schema(), general_rules()),
            (closing_schema(), RuleTable::new()),
        ])
        .unwrap(),
    )
}

pub fn general_id() -> SectionId {
    SectionId::new(GENERAL).unwrap()
}

pub fn partial(pairs: &[(&str, serde_json::Value)]) -> PartialSnapshot {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

pub fn day_school(subject: SubjectId) -> SubjectMetadata {
    SubjectMetadata {
        subject,
        name: Some("E.E. Teste".to_string()),
        shifts: vec![Shift::Morning, Shift::Afternoon],
    }
}

/// Controller over [`small_catalog`] with default configuration
pub fn controller(backend: Arc<MemoryBackend>, drafts: Arc<dyn DraftStore>) -> SectionController {
    controller_with(backend, drafts, WizardConfig::default())
}

pub fn controller_with(
    backend: Arc<MemoryBackend>,
    drafts: Arc<dyn DraftStore>,
    config: WizardConfig,
) -> SectionController {
    SectionController::new(small_catalog(), backend, drafts, config).unwrap()
}

/// Draft store counting operations, with write failure injection
#[derive(Debug, Default)]
pub struct CountingDraftStore {
    inner: MemoryDraftStore,
    writes: AtomicUsize,
    clears: AtomicUsize,
    fail_writes: AtomicBool,
}

impl CountingDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &MemoryDraftStore {
        &self.inner
    }
}

impl DraftStore for CountingDraftStore {
    fn try_write(&self, key: &DraftKey, draft: &PartialSnapshot) -> Result<(), DraftError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DraftError::io_error(
                key.storage_key(),
                std::io::Error::other("disk full"),
            ));
        }
        self.inner.try_write(key, draft)
    }

    fn try_read(&self, key: &DraftKey) -> Result<Option<PartialSnapshot>, DraftError> {
        self.inner.try_read(key)
    }

    fn try_clear(&self, key: &DraftKey) -> Result<(), DraftError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.try_clear(key)
    }
}

/// Observer recording every change set and the snapshot it came with
#[derive(Debug, Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<(ChangeSet, FormSnapshot)>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn changes(&self) -> Vec<ChangeSet> {
        self.seen.lock().iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn last_snapshot(&self) -> Option<FormSnapshot> {
        self.seen.lock().last().map(|(_, s)| s.clone())
    }
}

impl ChangeObserver for RecordingObserver {
    fn on_change(&self, changes: &ChangeSet, snapshot: &FormSnapshot) {
        self.seen.lock().push((changes.clone(), snapshot.clone()));
    }
}
