//! Dependency rule trait and core types
//!
//! A rule names the fields that trigger it, the fields it may write, and a
//! derivation that inspects the live snapshot and proposes writes. Rules are
//! static per section, hold no state, and never mutate the snapshot
//! themselves: the [`Reconciler`](crate::Reconciler) applies what they
//! propose.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;
use wizard_snapshot::FormSnapshot;

/// Proposed writes of one rule evaluation
pub type Derivation = SmallVec<[DerivedWrite; 4]>;

/// Read-only view handed to a rule
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Field whose change is being propagated
    pub trigger: &'a str,
    /// Live snapshot
    pub snapshot: &'a FormSnapshot,
    /// Section defaults (reset targets)
    pub defaults: &'a FormSnapshot,
}

impl<'a> RuleContext<'a> {
    /// Current value of a field
    #[inline]
    #[must_use]
    pub fn value(&self, field: &str) -> Option<&'a Value> {
        self.snapshot.get(field)
    }

    /// Default value of a field (`null` if undeclared)
    #[must_use]
    pub fn default_of(&self, field: &str) -> Value {
        self.defaults.get(field).cloned().unwrap_or(Value::Null)
    }
}

/// Write proposed by a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedWrite {
    /// Target field
    pub field: String,
    /// New value
    pub value: Value,
}

impl DerivedWrite {
    /// Create derived write
    #[inline]
    #[must_use]
    pub fn new(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }
}

/// Static rule relating a section's fields
///
/// # Contract
/// `derive` must only propose writes to fields listed by `affected`, and
/// must propose nothing when the snapshot already satisfies the rule.
pub trait DependencyRule: Send + Sync + std::fmt::Debug {
    /// Stable rule name (for logs and change records)
    fn name(&self) -> &str;

    /// Fields whose changes evaluate this rule
    fn triggers(&self) -> &[String];

    /// Fields this rule may write
    fn affected(&self) -> &[String];

    /// Propose writes for a change of `ctx.trigger`
    fn derive(&self, ctx: &RuleContext<'_>) -> Derivation;

    /// Describe the inconsistency `snapshot` holds for this rule, if any
    ///
    /// `defaults` are the section defaults, as in [`RuleContext`].
    fn violation(&self, _snapshot: &FormSnapshot, _defaults: &FormSnapshot) -> Option<String> {
        None
    }

    /// Whether the rule currently holds `field` at its reset value
    ///
    /// A locked field only accepts its default; any other user edit is
    /// refused instead of being left for the rule to undo.
    fn locks(&self, _field: &str, _snapshot: &FormSnapshot) -> bool {
        false
    }

    /// Whether the rule is applied to a freshly merged snapshot
    fn settles_on_load(&self) -> bool {
        false
    }
}
