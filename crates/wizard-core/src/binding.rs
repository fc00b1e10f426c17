//! Draft write-through
//!
//! The binding is a change observer attached once a section has finished
//! initializing. On every settled change it persists the snapshot
//! restricted to the fields touched so far: fields carried over from the
//! prior draft plus every field a user edit or a derivation changed.
//! Untouched fields stay out of the draft so remote data keeps filling them
//! on the next activation.

use indexmap::IndexSet;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use wizard_drafts::{DraftKey, DraftStore};
use wizard_reconcile::{ChangeObserver, ChangeSet};
use wizard_snapshot::{FormSnapshot, PartialSnapshot};

/// Observer persisting a section's touched fields to the draft store
#[derive(Debug)]
pub(crate) struct DraftBinding {
    store: Arc<dyn DraftStore>,
    key: DraftKey,
    touched: Mutex<IndexSet<String>>,
    sealed: AtomicBool,
}

impl DraftBinding {
    /// Bind `key`, carrying over the fields of the prior draft
    pub(crate) fn new(store: Arc<dyn DraftStore>, key: DraftKey, prior: Option<&PartialSnapshot>) -> Self {
        let touched = prior
            .map(|draft| draft.keys().map(str::to_string).collect())
            .unwrap_or_default();
        Self {
            store,
            key,
            touched: Mutex::new(touched),
            sealed: AtomicBool::new(false),
        }
    }

    /// Draft key
    pub(crate) fn key(&self) -> &DraftKey {
        &self.key
    }

    /// Stop writing; later changes are dropped
    pub(crate) fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    pub(crate) fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// Seal, then remove the stored draft
    pub(crate) fn seal_and_clear(&self) {
        self.seal();
        self.store.clear(&self.key);
    }
}

impl ChangeObserver for DraftBinding {
    fn on_change(&self, changes: &ChangeSet, snapshot: &FormSnapshot) {
        if self.is_sealed() {
            tracing::debug!(key = %self.key, field = %changes.edited, "binding sealed, draft write dropped");
            return;
        }

        let draft = {
            let mut touched = self.touched.lock();
            touched.extend(changes.fields().map(str::to_string));
            snapshot.restrict(touched.iter().map(String::as_str))
        };
        self.store.write(&self.key, &draft);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wizard_drafts::MemoryDraftStore;
    use wizard_reconcile::{AppliedWrite, WriteOrigin};
    use wizard_snapshot::{SchemaVersion, SectionId, SectionKey, SubjectId};

    fn key() -> DraftKey {
        DraftKey::with_default_namespace(SectionKey::new(
            SubjectId(1),
            SectionId::new("general").unwrap(),
            SchemaVersion(1),
        ))
    }

    fn snapshot() -> FormSnapshot {
        FormSnapshot::from_pairs([
            ("total_alunos".to_string(), json!(30)),
            ("alunos_urbana".to_string(), json!(30)),
            ("possui_anexos".to_string(), json!("Não")),
            ("qtd_salas_aula".to_string(), json!(4)),
        ])
    }

    fn changes() -> ChangeSet {
        let mut changes = ChangeSet::new("total_alunos");
        changes.writes.push(AppliedWrite {
            field: "total_alunos".into(),
            previous: json!(0),
            value: json!(30),
            origin: WriteOrigin::User,
        });
        changes.writes.push(AppliedWrite {
            field: "alunos_urbana".into(),
            previous: json!(0),
            value: json!(30),
            origin: WriteOrigin::Derived {
                rule: "complementary".into(),
            },
        });
        changes
    }

    #[test]
    fn writes_touched_fields_only() {
        let store = Arc::new(MemoryDraftStore::new());
        let mut prior = PartialSnapshot::new();
        prior.insert("possui_anexos", json!("Não"));
        let binding = DraftBinding::new(store.clone(), key(), Some(&prior));

        binding.on_change(&changes(), &snapshot());

        let draft = store.read(&key()).unwrap();
        let keys: Vec<&str> = draft.keys().collect();
        assert_eq!(keys, vec!["possui_anexos", "total_alunos", "alunos_urbana"]);
        assert!(!draft.contains_key("qtd_salas_aula"));
    }

    #[test]
    fn sealed_binding_never_resurrects_draft() {
        let store = Arc::new(MemoryDraftStore::new());
        let binding = DraftBinding::new(store.clone(), key(), None);
        binding.on_change(&changes(), &snapshot());
        assert!(store.contains(binding.key()));

        binding.seal_and_clear();
        binding.on_change(&changes(), &snapshot());
        assert!(store.read(&key()).is_none());
        assert!(binding.is_sealed());
    }
}
