//! Transactional reconciler
//!
//! One user edit opens a transaction. The edited value is written and
//! pinned, then every rule triggered by a changed field is evaluated in
//! table order and its proposals applied. Fields written by a rule are
//! queued so their own rules run in turn.
//!
//! # Conflict resolution
//!
//! - The user's edit always wins: proposals targeting the edited field are
//!   dropped.
//! - Each field is derived at most once per transaction: the first rule to
//!   write it wins and later proposals are dropped.
//!
//! Since every field can be written at most once, a transaction performs at
//! most one write per declared field and always terminates, whatever rules
//! the table holds.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashSet, VecDeque};

use wizard_snapshot::{FormSnapshot, SectionSchema};

use crate::changeset::{AppliedWrite, ChangeSet, SkipReason, SkippedWrite, WriteOrigin};
use crate::error::ReconcileError;
use crate::rule::RuleContext;
use crate::table::RuleTable;

/// A user edit of one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEdit {
    /// Field being edited
    pub field: String,
    /// New value
    pub value: Value,
}

impl FieldEdit {
    /// Create edit
    #[inline]
    #[must_use]
    pub fn new(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }
}

/// Applies user edits and their derived cascade to a snapshot
#[derive(Debug, Clone)]
pub struct Reconciler {
    table: RuleTable,
    defaults: FormSnapshot,
}

impl Reconciler {
    /// Create reconciler from a rule table and section defaults
    #[must_use]
    pub fn new(table: RuleTable, defaults: FormSnapshot) -> Self {
        Self { table, defaults }
    }

    /// Create reconciler for a section, checking the table against its schema
    ///
    /// # Errors
    /// [`ReconcileError::InvalidRule`] if a rule mentions an undeclared field
    pub fn for_schema(schema: &SectionSchema, table: RuleTable) -> Result<Self, ReconcileError> {
        table.validate_against(schema)?;
        Ok(Self::new(table, schema.defaults()))
    }

    /// Rule table
    #[inline]
    #[must_use]
    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Section defaults used as reset targets
    #[inline]
    #[must_use]
    pub fn defaults(&self) -> &FormSnapshot {
        &self.defaults
    }

    /// Apply a user edit and every derivation it triggers
    ///
    /// Rules run even when the edit does not change the stored value, so a
    /// snapshot loaded in an inconsistent state is repaired on the next
    /// touch of a trigger field.
    ///
    /// # Errors
    /// - [`ReconcileError::UnknownField`] if the edited field is not part of
    ///   the snapshot
    /// - [`ReconcileError::Locked`] if a rule holds the field at its default
    ///   and the edit would move it away
    ///
    /// The snapshot is left untouched on error.
    pub fn apply(
        &self,
        snapshot: &mut FormSnapshot,
        edit: FieldEdit,
    ) -> Result<ChangeSet, ReconcileError> {
        let FieldEdit { field, value } = edit;
        if !snapshot.contains(&field) {
            return Err(ReconcileError::UnknownField(field));
        }
        if let Some(rule) = self.table.locking(&field, snapshot) {
            if self.defaults.get(&field) != Some(&value) {
                return Err(ReconcileError::Locked {
                    field,
                    rule: rule.name().to_string(),
                });
            }
        }

        let previous = snapshot
            .set(&field, value.clone())
            .map_err(|_| ReconcileError::UnknownField(field.clone()))?;

        let mut tx = Transaction::new(&field);
        if previous != value {
            tx.changes.writes.push(AppliedWrite {
                field: field.clone(),
                previous,
                value,
                origin: WriteOrigin::User,
            });
        }

        self.propagate(snapshot, &mut tx, VecDeque::from([field]));

        tracing::debug!(
            field = %tx.changes.edited,
            writes = tx.changes.writes.len(),
            skipped = tx.changes.skipped.len(),
            "edit reconciled"
        );
        Ok(tx.changes)
    }

    /// Apply every rule that settles on load to a freshly merged snapshot
    ///
    /// Returns the derived writes. Nothing is pinned, so each field is still
    /// written at most once.
    pub fn settle(&self, snapshot: &mut FormSnapshot) -> Vec<AppliedWrite> {
        let mut tx = Transaction::new("");
        let queue: VecDeque<String> = self
            .table
            .iter()
            .filter(|rule| rule.settles_on_load())
            .flat_map(|rule| rule.triggers().iter().cloned())
            .collect();
        self.propagate(snapshot, &mut tx, queue);
        tx.changes.writes
    }

    /// Run the rules triggered by each queued field until nothing changes
    fn propagate(
        &self,
        snapshot: &mut FormSnapshot,
        tx: &mut Transaction,
        mut queue: VecDeque<String>,
    ) {
        while let Some(trigger) = queue.pop_front() {
            for rule in self.table.rules_for(&trigger) {
                let proposals = rule.derive(&RuleContext {
                    trigger: &trigger,
                    snapshot: &*snapshot,
                    defaults: &self.defaults,
                });

                for proposal in proposals {
                    if let Some(reason) = tx.conflict(&proposal.field) {
                        if snapshot.get(&proposal.field) != Some(&proposal.value) {
                            tracing::trace!(
                                rule = rule.name(),
                                field = %proposal.field,
                                ?reason,
                                "derived write dropped"
                            );
                            tx.changes.skipped.push(SkippedWrite {
                                rule: rule.name().to_string(),
                                field: proposal.field,
                                value: proposal.value,
                                reason,
                            });
                        }
                        continue;
                    }

                    let previous = match snapshot.set(&proposal.field, proposal.value.clone()) {
                        Ok(previous) => previous,
                        Err(e) => {
                            tracing::warn!(rule = rule.name(), error = %e, "rule wrote undeclared field");
                            continue;
                        }
                    };
                    if previous == proposal.value {
                        continue;
                    }

                    tracing::trace!(
                        rule = rule.name(),
                        field = %proposal.field,
                        value = %proposal.value,
                        "derived write"
                    );
                    tx.derived.insert(proposal.field.clone());
                    queue.push_back(proposal.field.clone());
                    tx.changes.writes.push(AppliedWrite {
                        field: proposal.field,
                        previous,
                        value: proposal.value,
                        origin: WriteOrigin::Derived {
                            rule: rule.name().to_string(),
                        },
                    });
                }
            }
        }
    }

    /// Rules that would propose writes if any of their triggers changed now
    ///
    /// A settled snapshot has no pending rules, except complementary sums
    /// whose repair would go negative.
    #[must_use]
    pub fn pending(&self, snapshot: &FormSnapshot) -> Vec<String> {
        self.table
            .iter()
            .filter(|rule| {
                rule.triggers().iter().any(|trigger| {
                    !rule
                        .derive(&RuleContext {
                            trigger,
                            snapshot,
                            defaults: &self.defaults,
                        })
                        .is_empty()
                })
            })
            .map(|rule| rule.name().to_string())
            .collect()
    }

    /// Inconsistencies the rules left in `snapshot`, as (rule, message)
    #[must_use]
    pub fn violations(&self, snapshot: &FormSnapshot) -> Vec<(String, String)> {
        self.table
            .iter()
            .filter_map(|rule| {
                rule.violation(snapshot, &self.defaults)
                    .map(|message| (rule.name().to_string(), message))
            })
            .collect()
    }
}

/// Per-edit bookkeeping
struct Transaction {
    changes: ChangeSet,
    derived: HashSet<String>,
}

impl Transaction {
    fn new(field: &str) -> Self {
        Self {
            changes: ChangeSet::new(field),
            derived: HashSet::new(),
        }
    }

    fn conflict(&self, field: &str) -> Option<SkipReason> {
        if field == self.changes.edited {
            Some(SkipReason::UserEditWins)
        } else if self.derived.contains(field) {
            Some(SkipReason::AlreadyDerived)
        } else {
            None
        }
    }
}
