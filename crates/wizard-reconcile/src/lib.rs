//! Census wizard field reconciler
//!
//! Keeps interdependent fields of an active section consistent while the
//! user edits it.
//!
//! # Core Concepts
//!
//! - [`DependencyRule`]: static relation between fields, evaluated when one
//!   of its trigger fields changes
//! - [`ComplementaryRule`]: `first + second = total`, recomputing the part
//!   the user did not edit
//! - [`ClearRule`]: resets dependents to defaults when a controller stops
//!   satisfying its [`Predicate`], and locks them there until it does again
//! - [`RuleTable`]: rules indexed by trigger field
//! - [`Reconciler`]: applies one edit and its cascade as a transaction,
//!   returning a [`ChangeSet`]
//! - [`ChangeObserver`]: notified once per settled edit
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use wizard_reconcile::{ComplementaryRule, FieldEdit, Reconciler, RuleTable};
//! use wizard_snapshot::FormSnapshot;
//!
//! let defaults = FormSnapshot::from_pairs(
//!     ["total_alunos", "alunos_rural", "alunos_urbana"].map(|f| (f.to_string(), json!(0))),
//! );
//! let table = RuleTable::new()
//!     .with(ComplementaryRule::new("alunos_rural", "alunos_urbana", "total_alunos"));
//! let reconciler = Reconciler::new(table, defaults.clone());
//!
//! let mut snapshot = defaults;
//! reconciler
//!     .apply(&mut snapshot, FieldEdit::new("total_alunos", json!(30)))
//!     .unwrap();
//! assert_eq!(snapshot.get("alunos_urbana"), Some(&json!(30)));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod changeset;
mod clear;
mod complementary;
mod error;
mod observer;
mod reconciler;
mod rule;
mod table;

pub use changeset::{AppliedWrite, ChangeSet, SkipReason, SkippedWrite, WriteOrigin};
pub use clear::{ClearRule, Predicate};
pub use complementary::ComplementaryRule;
pub use error::ReconcileError;
pub use observer::{ChangeObserver, ObserverSet};
pub use reconciler::{FieldEdit, Reconciler};
pub use rule::{DependencyRule, Derivation, DerivedWrite, RuleContext};
pub use table::RuleTable;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
