//! Functional tests for edit propagation and draft write-through.
//!
//! Guarantees exercised here:
//! - One user edit produces exactly one draft write and one observer
//!   notification, however many derived writes it caused.
//! - Observers only ever see the settled snapshot.
//! - Conditional clearing is stable: reapplying the same edit changes
//!   nothing and writes nothing.
//! - The complementary sum holds after every feasible edit sequence.
//! - After every edit of a census section no rule is left due, other than a
//!   complementary sum whose repair would go negative.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

use wizard_core::{EditError, SectionCatalog, SectionController, WizardConfig};
use wizard_drafts::DraftStore;
use wizard_remote::MemoryBackend;
use wizard_snapshot::{value::read_number, SubjectId};
use wizard_test_utils::{controller, general_id, CountingDraftStore, RecordingObserver, GENERAL};

const SCHOOL: SubjectId = SubjectId(3);

/// A derived cascade still yields a single draft write per edit.
#[tokio::test]
async fn one_draft_write_per_edit() {
    let drafts = Arc::new(CountingDraftStore::new());
    let c = controller(Arc::new(MemoryBackend::new()), drafts.clone());
    let mut section = c.activate(SCHOOL, GENERAL).await.unwrap();

    let changes = section.edit("total_alunos", json!(30)).unwrap();
    assert_eq!(changes.writes.len(), 2);
    assert_eq!(drafts.writes(), 1);

    section.edit("alunos_rural", json!(12)).unwrap();
    assert_eq!(section.value("alunos_urbana"), Some(&json!(18)));
    assert_eq!(drafts.writes(), 2);

    section.edit("alunos_urbana", json!(10)).unwrap();
    assert_eq!(section.value("alunos_rural"), Some(&json!(20)));
    assert_eq!(drafts.writes(), 3);
}

/// Observers are notified once per edit, with the settled snapshot.
#[tokio::test]
async fn observers_see_settled_snapshot() {
    let c = controller(Arc::new(MemoryBackend::new()), Arc::new(CountingDraftStore::new()));
    let mut section = c.activate(SCHOOL, GENERAL).await.unwrap();
    let observer = RecordingObserver::new();
    section.subscribe(observer.clone());

    section.edit("total_alunos", json!(30)).unwrap();
    section.edit("alunos_rural", json!(12)).unwrap();

    assert_eq!(observer.count(), 2);
    let snapshot = observer.last_snapshot().unwrap();
    assert_eq!(snapshot.get("alunos_urbana"), Some(&json!(18)));
    assert_eq!(&snapshot, section.snapshot());

    let changes = observer.changes();
    assert_eq!(changes[1].edited, "alunos_rural");
    assert_eq!(changes[1].derived_count(), 1);
}

/// Answering "Não" resets the follow-ups; answering it again is a no-op.
#[tokio::test]
async fn conditional_clear_is_stable() {
    let drafts = Arc::new(CountingDraftStore::new());
    let c = controller(Arc::new(MemoryBackend::new()), drafts.clone());
    let mut section = c.activate(SCHOOL, GENERAL).await.unwrap();

    section.edit("possui_anexos", json!("Sim")).unwrap();
    section.edit("qtd_anexos", json!(2)).unwrap();
    section.edit("tipo_predio_anexo", json!("Alugado")).unwrap();

    let changes = section.edit("possui_anexos", json!("Não")).unwrap();
    assert_eq!(changes.derived_count(), 2);
    assert_eq!(section.value("qtd_anexos"), Some(&json!(0)));
    assert_eq!(section.value("tipo_predio_anexo"), Some(&json!(null)));

    let writes = drafts.writes();
    let again = section.edit("possui_anexos", json!("Não")).unwrap();
    assert!(!again.changed());
    assert_eq!(drafts.writes(), writes);

    let draft = drafts.read(&c.draft_key(SCHOOL, &general_id())).unwrap();
    assert_eq!(draft.get("qtd_anexos"), Some(&json!(0)));
    assert_eq!(draft.get("tipo_predio_anexo"), Some(&json!(null)));
}

#[derive(Debug, Clone)]
enum Edit {
    Total(u32),
    Rural(u32),
    Urban(u32),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0u32..500).prop_map(Edit::Total),
        (0u32..500).prop_map(Edit::Rural),
        (0u32..500).prop_map(Edit::Urban),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Whenever an edit's complement is non-negative, the sum holds after it.
    #[test]
    fn complementary_sum_holds(edits in prop::collection::vec(edit(), 1..12)) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let c = controller(Arc::new(MemoryBackend::new()), Arc::new(CountingDraftStore::new()));
        let mut section = rt.block_on(c.activate(SCHOOL, GENERAL)).unwrap();
        let read = |s: &wizard_core::ActiveSection, f: &str| {
            read_number(s.value(f).unwrap()).unwrap()
        };

        for edit in edits {
            let (field, value) = match edit {
                Edit::Total(v) => ("total_alunos", v),
                Edit::Rural(v) => ("alunos_rural", v),
                Edit::Urban(v) => ("alunos_urbana", v),
            };
            let before_total = read(&section, "total_alunos");
            let before_rural = read(&section, "alunos_rural");
            section.edit(field, json!(value)).unwrap();

            let feasible = match field {
                "total_alunos" => f64::from(value) >= before_rural,
                _ => f64::from(value) <= before_total,
            };
            if feasible {
                let sum = read(&section, "alunos_rural") + read(&section, "alunos_urbana");
                prop_assert!((sum - read(&section, "total_alunos")).abs() < f64::EPSILON);
            }
        }
    }
}

fn census_controller() -> SectionController {
    SectionController::new(
        Arc::new(SectionCatalog::census().unwrap()),
        Arc::new(MemoryBackend::new()),
        Arc::new(CountingDraftStore::new()),
        WizardConfig::default(),
    )
    .unwrap()
}

fn general_edits() -> Vec<(&'static str, serde_json::Value)> {
    vec![
        ("possui_anexos", json!("Sim")),
        ("possui_anexos", json!("Não")),
        ("possui_anexos", json!(null)),
        ("qtd_anexos", json!(0)),
        ("qtd_anexos", json!(3)),
        ("tipo_predio_anexo", json!("Próprio")),
        ("tipo_predio_anexo", json!(null)),
        ("ambientes", json!([])),
        ("ambientes", json!(["Quadra Esportiva"])),
        ("ambientes", json!(["Biblioteca", "Quadra Esportiva"])),
        ("ambientes", json!(["Biblioteca"])),
        ("quadra_coberta", json!("Sim")),
        ("qtd_quadras", json!(2)),
        ("qtd_quadras", json!(0)),
        ("total_alunos", json!(40)),
        ("alunos_rural", json!(15)),
        ("alunos_urbana", json!(60)),
    ]
}

fn management_edits() -> Vec<(&'static str, serde_json::Value)> {
    vec![
        ("conselho_escolar", json!("Sim")),
        ("conselho_escolar", json!("Não")),
        ("conselho_ativo", json!("Parcialmente")),
        ("recursos_prodep", json!("Sim")),
        ("recursos_prodep", json!("Não sabe informar")),
        ("valor_prodep", json!(1500)),
        ("execucao_prodep", json!("Parcialmente")),
        ("pendencias_prodep", json!(null)),
        ("recursos_federais", json!("Sim")),
        ("recursos_federais", json!("Não")),
        ("valor_federais", json!(800)),
        ("valor_federais", json!(0)),
        ("pendencias_federais", json!("Sim, em regularização")),
    ]
}

/// Apply `edits` to `section`, checking after each one that nothing is due
fn settled_after_each_edit(
    section: &str,
    edits: Vec<(&'static str, serde_json::Value)>,
) -> Result<(), TestCaseError> {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
    let c = census_controller();
    let mut active = rt.block_on(c.activate(SCHOOL, section)).unwrap();

    for (field, value) in edits {
        let before = active.snapshot().clone();
        match active.edit(field, value) {
            Ok(_) => {}
            Err(EditError::Locked { .. }) => prop_assert_eq!(active.snapshot(), &before),
            Err(e) => prop_assert!(false, "unexpected edit error: {e}"),
        }

        let due: Vec<String> = active
            .definition()
            .reconciler()
            .pending(active.snapshot())
            .into_iter()
            .filter(|rule| !rule.starts_with("complementary("))
            .collect();
        prop_assert!(due.is_empty(), "rules still due after {field}: {due:?}");
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Gated fields never keep a value their controller excludes.
    #[test]
    fn general_section_stays_settled(
        edits in prop::collection::vec(prop::sample::select(general_edits()), 1..16)
    ) {
        settled_after_each_edit("general", edits)?;
    }

    #[test]
    fn management_section_stays_settled(
        edits in prop::collection::vec(prop::sample::select(management_edits()), 1..16)
    ) {
        settled_after_each_edit("management", edits)?;
    }
}
