//! Functional tests for degraded and failing collaborators.
//!
//! Guarantees exercised here:
//! - Remote read failures and timeouts never block activation; the section
//!   loads from defaults and the local draft.
//! - An unreadable draft is treated as absent.
//! - A failed, timed out or invalid submission keeps the draft and the live
//!   snapshot, so the same data can be resubmitted.
//! - Draft persistence failures never surface to the editor.
//! - Fields of groups the subject does not offer stay at default and refuse
//!   edits.
//! - Follow-up fields whose controller excludes them are cleared on load,
//!   refuse values and are never submitted stale.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use wizard_core::{EditError, SchemaValidator, SectionState, SubmitError, ViolationKind};
use wizard_drafts::DraftStore;
use wizard_remote::{MemoryBackend, RemoteError};
use wizard_snapshot::{Source, SubjectId};
use wizard_test_utils::{
    controller, day_school, general_id, general_schema, partial, CountingDraftStore, GENERAL,
};

const SCHOOL: SubjectId = SubjectId(7);

/// Network failure on every read: the draft still loads over defaults.
#[tokio::test]
async fn remote_failure_degrades_to_draft_and_defaults() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed_record(SCHOOL, &general_id(), json!({ "total_alunos": 99 }));
    backend.fail_reads(RemoteError::Network("connection refused".into()));

    let drafts = Arc::new(CountingDraftStore::new());
    let c = controller(backend, drafts.clone());
    drafts.write(
        &c.draft_key(SCHOOL, &general_id()),
        &partial(&[("alunos_rural", json!(4))]),
    );

    let mut section = c.activate(SCHOOL, GENERAL).await.unwrap();
    assert_eq!(section.value("total_alunos"), Some(&json!(0)));
    assert_eq!(section.value("alunos_rural"), Some(&json!(4)));
    assert_eq!(section.provenance().get("alunos_rural"), Some(&Source::Draft));

    // Metadata failed as well, so every group applies.
    assert!(section.edit("turmas_noite", json!(2)).is_ok());
}

/// A backend slower than the fetch bound is treated as absent.
#[tokio::test(start_paused = true)]
async fn remote_timeout_degrades_to_defaults() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed_record(SCHOOL, &general_id(), json!({ "total_alunos": 99 }));
    backend.set_latency(Duration::from_secs(60));

    let c = controller(backend, Arc::new(CountingDraftStore::new()));
    let section = c.activate(SCHOOL, GENERAL).await.unwrap();
    assert_eq!(section.snapshot(), &general_schema().defaults());
}

/// A double-encoded remote payload is unwrapped before merging.
#[tokio::test]
async fn string_encoded_remote_payload_is_decoded() {
    let backend = Arc::new(MemoryBackend::new());
    let encoded = json!({ "total_alunos": 25, "alunos_urbana": 25 }).to_string();
    backend.seed_record(SCHOOL, &general_id(), json!(encoded));

    let c = controller(backend, Arc::new(CountingDraftStore::new()));
    let section = c.activate(SCHOOL, GENERAL).await.unwrap();
    assert_eq!(section.value("total_alunos"), Some(&json!(25)));
    assert_eq!(section.value("alunos_urbana"), Some(&json!(25)));
}

/// Garbage in the draft store reads as no draft.
#[tokio::test]
async fn corrupt_draft_is_ignored() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed_record(SCHOOL, &general_id(), json!({ "total_alunos": 12 }));
    let drafts = Arc::new(CountingDraftStore::new());
    let c = controller(backend, drafts.clone());
    drafts
        .inner()
        .insert_raw(&c.draft_key(SCHOOL, &general_id()), "{\"fields\": [");

    let section = c.activate(SCHOOL, GENERAL).await.unwrap();
    assert_eq!(section.value("total_alunos"), Some(&json!(12)));
    assert!(section.provenance().values().all(|s| *s != Source::Draft));
}

/// Draft keys the section no longer declares are dropped before merging.
#[tokio::test]
async fn undeclared_draft_keys_are_ignored() {
    let drafts = Arc::new(CountingDraftStore::new());
    let c = controller(Arc::new(MemoryBackend::new()), drafts.clone());
    drafts.write(
        &c.draft_key(SCHOOL, &general_id()),
        &partial(&[("campo_removido", json!(1)), ("total_alunos", json!(8))]),
    );

    let mut section = c.activate(SCHOOL, GENERAL).await.unwrap();
    assert!(section.snapshot().get("campo_removido").is_none());
    section.edit("possui_anexos", json!("Não")).unwrap();

    let draft = drafts.read(&c.draft_key(SCHOOL, &general_id())).unwrap();
    assert!(!draft.contains_key("campo_removido"));
    assert_eq!(draft.get("total_alunos"), Some(&json!(8)));
}

/// A refused submission keeps everything; after the backend recovers the
/// same section submits and the draft is cleared.
#[tokio::test]
async fn failed_submit_retains_draft_then_retry_succeeds() {
    let backend = Arc::new(MemoryBackend::new());
    let drafts = Arc::new(CountingDraftStore::new());
    let c = controller(backend.clone(), drafts.clone());
    let key = c.draft_key(SCHOOL, &general_id());

    let mut section = c.activate(SCHOOL, GENERAL).await.unwrap();
    section.edit("total_alunos", json!(30)).unwrap();
    section.edit("possui_anexos", json!("Não")).unwrap();

    backend.fail_writes(RemoteError::status(503, "memory://census"));
    let err = section.submit(&SchemaValidator::new()).await.unwrap_err();
    assert!(matches!(err, SubmitError::Backend(_)));
    assert!(err.is_retryable());
    assert_eq!(section.state(), SectionState::Editing);
    assert_eq!(section.value("alunos_urbana"), Some(&json!(30)));
    assert!(drafts.read(&key).is_some());
    assert_eq!(drafts.clears(), 0);

    backend.heal();
    section.submit(&SchemaValidator::new()).await.unwrap();
    assert!(drafts.read(&key).is_none());
    assert_eq!(backend.submissions().len(), 1);
}

/// A backend that never confirms is bounded by the submit timeout.
#[tokio::test(start_paused = true)]
async fn submit_timeout_retains_draft() {
    let backend = Arc::new(MemoryBackend::new());
    let drafts = Arc::new(CountingDraftStore::new());
    let c = controller(backend.clone(), drafts.clone());

    let mut section = c.activate(SCHOOL, GENERAL).await.unwrap();
    section.edit("total_alunos", json!(30)).unwrap();
    section.edit("possui_anexos", json!("Não")).unwrap();

    backend.set_latency(Duration::from_secs(120));
    let err = section.submit(&SchemaValidator::new()).await.unwrap_err();
    assert!(matches!(err, SubmitError::Timeout { secs: 30 }));
    assert!(drafts.read(&c.draft_key(SCHOOL, &general_id())).is_some());
    assert!(backend.submissions().is_empty());
}

/// Validation failures never reach the backend.
#[tokio::test]
async fn invalid_snapshot_is_not_sent() {
    let backend = Arc::new(MemoryBackend::new());
    let drafts = Arc::new(CountingDraftStore::new());
    let c = controller(backend.clone(), drafts.clone());

    let mut section = c.activate(SCHOOL, GENERAL).await.unwrap();
    section.edit("total_alunos", json!(30)).unwrap();
    section.edit("alunos_rural", json!(45)).unwrap();

    let Err(SubmitError::Invalid(report)) = section.submit(&SchemaValidator::new()).await else {
        panic!("expected validation failure");
    };
    assert!(report
        .for_field("possui_anexos")
        .any(|v| v.kind == ViolationKind::Required));
    assert!(report
        .for_field("alunos_rural")
        .any(|v| matches!(v.kind, ViolationKind::Rule { .. })));
    assert!(backend.submissions().is_empty());
    assert!(drafts.read(&c.draft_key(SCHOOL, &general_id())).is_some());
}

/// Draft persistence failures are logged, never returned.
#[tokio::test]
async fn draft_write_failure_does_not_block_edits() {
    let drafts = Arc::new(CountingDraftStore::new());
    drafts.fail_writes(true);
    let c = controller(Arc::new(MemoryBackend::new()), drafts.clone());

    let mut section = c.activate(SCHOOL, GENERAL).await.unwrap();
    let changes = section.edit("total_alunos", json!(30)).unwrap();
    assert_eq!(changes.derived_count(), 1);
    assert_eq!(drafts.writes(), 1);
    assert!(drafts.read(&c.draft_key(SCHOOL, &general_id())).is_none());
}

/// Night-shift fields of a day school stay at default, even when the remote
/// record or the draft holds a value, and refuse edits.
#[tokio::test]
async fn inapplicable_group_pinned_and_refused() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed_subject(day_school(SCHOOL));
    backend.seed_record(SCHOOL, &general_id(), json!({ "turmas_noite": 3 }));
    let c = controller(backend, Arc::new(CountingDraftStore::new()));

    let mut section = c.activate(SCHOOL, GENERAL).await.unwrap();
    assert_eq!(section.value("turmas_noite"), Some(&json!(0)));
    assert!(!section.applicability().applies("turmas_noite"));

    assert_eq!(
        section.edit("turmas_noite", json!(2)),
        Err(EditError::NotApplicable("turmas_noite".into()))
    );
    assert_eq!(
        section.edit("piscina", json!(true)),
        Err(EditError::UnknownField("piscina".into()))
    );
}

const ANNEX_RULE: &str = "clear(possui_anexos->qtd_anexos,tipo_predio_anexo)";

/// Follow-ups of an unanswered or negative controller refuse values, stay
/// out of the draft and submit at their defaults.
#[tokio::test]
async fn gated_field_refuses_edits_while_controller_excludes_it() {
    let backend = Arc::new(MemoryBackend::new());
    let drafts = Arc::new(CountingDraftStore::new());
    let c = controller(backend.clone(), drafts.clone());
    let locked = || {
        Err::<wizard_reconcile::ChangeSet, _>(EditError::Locked {
            field: "qtd_anexos".into(),
            rule: ANNEX_RULE.into(),
        })
    };

    let mut section = c.activate(SCHOOL, GENERAL).await.unwrap();
    assert_eq!(section.edit("qtd_anexos", json!(5)), locked());
    assert_eq!(drafts.writes(), 0);

    section.edit("possui_anexos", json!("Não")).unwrap();
    assert_eq!(section.edit("qtd_anexos", json!(5)), locked());
    assert_eq!(section.value("qtd_anexos"), Some(&json!(0)));
    assert_eq!(drafts.writes(), 1);
    let draft = drafts.read(&c.draft_key(SCHOOL, &general_id())).unwrap();
    assert!(!draft.contains_key("qtd_anexos"));

    section.edit("total_alunos", json!(30)).unwrap();
    section.submit(&SchemaValidator::new()).await.unwrap();
    assert_eq!(backend.submissions()[0].data.get("qtd_anexos"), Some(&json!(0)));
}

/// A remote record holding follow-ups under a negative controller loads
/// with them cleared, without writing a draft.
#[tokio::test]
async fn stale_remote_follow_ups_cleared_on_activation() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed_record(
        SCHOOL,
        &general_id(),
        json!({ "possui_anexos": "Não", "qtd_anexos": 3, "tipo_predio_anexo": "Alugado", "total_alunos": 10 }),
    );
    let drafts = Arc::new(CountingDraftStore::new());
    let c = controller(backend, drafts.clone());

    let section = c.activate(SCHOOL, GENERAL).await.unwrap();
    assert_eq!(section.value("qtd_anexos"), Some(&json!(0)));
    assert_eq!(section.value("tipo_predio_anexo"), Some(&json!(null)));
    assert_eq!(section.value("total_alunos"), Some(&json!(10)));
    assert_eq!(section.provenance().get("qtd_anexos"), Some(&Source::Default));
    assert_eq!(section.provenance().get("possui_anexos"), Some(&Source::Remote));
    assert!(section.definition().reconciler().pending(section.snapshot()).is_empty());
    assert_eq!(drafts.writes(), 0);
}
