//! Complementary derivation rule
//!
//! Two non-negative parts must add up to a total (`rural + urban = total`).
//! Editing the total or the first part recomputes the second part; editing
//! the second part recomputes the first. A recomputation that would go
//! negative is not applied: the inconsistency is left for validation to
//! flag rather than silently clamped.

use serde_json::Value;
use wizard_snapshot::value::{number_value, read_number};
use wizard_snapshot::FormSnapshot;

use crate::rule::{DependencyRule, Derivation, DerivedWrite, RuleContext};

/// `first + second = total`
#[derive(Debug, Clone)]
pub struct ComplementaryRule {
    name: String,
    first: String,
    second: String,
    total: String,
    triggers: Vec<String>,
    affected: Vec<String>,
}

impl ComplementaryRule {
    /// Create rule over `first + second = total`
    #[must_use]
    pub fn new(first: &str, second: &str, total: &str) -> Self {
        Self {
            name: format!("complementary({first}+{second}={total})"),
            first: first.to_string(),
            second: second.to_string(),
            total: total.to_string(),
            triggers: vec![total.to_string(), first.to_string(), second.to_string()],
            affected: vec![first.to_string(), second.to_string()],
        }
    }

    /// First part
    #[inline]
    #[must_use]
    pub fn first(&self) -> &str {
        &self.first
    }

    /// Second part
    #[inline]
    #[must_use]
    pub fn second(&self) -> &str {
        &self.second
    }

    /// Total
    #[inline]
    #[must_use]
    pub fn total(&self) -> &str {
        &self.total
    }

    /// Whether `first + second == total` holds on the given values
    ///
    /// Unset values count as zero; non-numeric values never satisfy the sum.
    #[must_use]
    pub fn holds(&self, first: &Value, second: &Value, total: &Value) -> bool {
        match (count(first), count(second), count(total)) {
            (Some(a), Some(b), Some(t)) => (a + b - t).abs() < f64::EPSILON,
            _ => false,
        }
    }
}

/// Numeric reading where an unset count is zero
fn count(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        other => read_number(other),
    }
}

impl DependencyRule for ComplementaryRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn triggers(&self) -> &[String] {
        &self.triggers
    }

    fn affected(&self) -> &[String] {
        &self.affected
    }

    fn derive(&self, ctx: &RuleContext<'_>) -> Derivation {
        let mut out = Derivation::new();

        let read = |field: &str| ctx.value(field).and_then(count);
        let (Some(first), Some(second), Some(total)) =
            (read(&self.first), read(&self.second), read(&self.total))
        else {
            tracing::trace!(rule = %self.name, "non-numeric operand, skipping");
            return out;
        };

        let (target, current, derived) = if ctx.trigger == self.second {
            (&self.first, first, total - second)
        } else if ctx.trigger == self.first || ctx.trigger == self.total {
            (&self.second, second, total - first)
        } else {
            return out;
        };

        if derived < 0.0 {
            tracing::trace!(
                rule = %self.name,
                target = %target,
                derived,
                "negative complement left for validation"
            );
            return out;
        }

        if (derived - current).abs() >= f64::EPSILON {
            out.push(DerivedWrite::new(target.clone(), number_value(derived)));
        }

        out
    }

    fn violation(&self, snapshot: &FormSnapshot, _defaults: &FormSnapshot) -> Option<String> {
        let read = |field: &str| snapshot.get(field).and_then(count);
        let (first, second, total) = (read(&self.first)?, read(&self.second)?, read(&self.total)?);
        ((first + second - total).abs() >= f64::EPSILON).then(|| {
            format!(
                "{} + {} must equal {} ({first} + {second} != {total})",
                self.first, self.second, self.total
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule() -> ComplementaryRule {
        ComplementaryRule::new("rural", "urban", "total")
    }

    fn snapshot(rural: Value, urban: Value, total: Value) -> FormSnapshot {
        FormSnapshot::from_pairs([
            ("rural".to_string(), rural),
            ("urban".to_string(), urban),
            ("total".to_string(), total),
        ])
    }

    fn derive(snap: &FormSnapshot, trigger: &str) -> Derivation {
        let defaults = snapshot(json!(0), json!(0), json!(0));
        rule().derive(&RuleContext {
            trigger,
            snapshot: snap,
            defaults: &defaults,
        })
    }

    #[test]
    fn total_edit_recomputes_second() {
        let snap = snapshot(json!(0), json!(0), json!(30));
        let writes = derive(&snap, "total");
        assert_eq!(writes.as_slice(), &[DerivedWrite::new("urban", json!(30))]);
    }

    #[test]
    fn first_edit_recomputes_second() {
        let snap = snapshot(json!(12), json!(30), json!(30));
        let writes = derive(&snap, "rural");
        assert_eq!(writes.as_slice(), &[DerivedWrite::new("urban", json!(18))]);
    }

    #[test]
    fn second_edit_recomputes_first() {
        let snap = snapshot(json!(12), json!(10), json!(30));
        let writes = derive(&snap, "urban");
        assert_eq!(writes.as_slice(), &[DerivedWrite::new("rural", json!(20))]);
    }

    #[test]
    fn consistent_snapshot_proposes_nothing() {
        let snap = snapshot(json!(12), json!(18), json!(30));
        for trigger in ["rural", "urban", "total"] {
            assert!(derive(&snap, trigger).is_empty(), "trigger {trigger}");
        }
    }

    #[test]
    fn negative_complement_not_applied() {
        let snap = snapshot(json!(40), json!(0), json!(30));
        assert!(derive(&snap, "rural").is_empty());
    }

    #[test]
    fn numeric_text_is_coerced() {
        let snap = snapshot(json!("12"), json!("18"), json!("30"));
        assert!(derive(&snap, "total").is_empty());

        let snap = snapshot(json!(null), json!(0), json!("30"));
        let writes = derive(&snap, "total");
        assert_eq!(writes.as_slice(), &[DerivedWrite::new("urban", json!(30))]);
    }

    #[test]
    fn non_numeric_operand_skips() {
        let snap = snapshot(json!("abc"), json!(0), json!(30));
        assert!(derive(&snap, "total").is_empty());
    }

    #[test]
    fn holds_treats_null_as_zero() {
        let r = rule();
        assert!(r.holds(&json!(null), &json!(30), &json!(30)));
        assert!(!r.holds(&json!(1), &json!(30), &json!(30)));
        assert!(!r.holds(&json!("x"), &json!(30), &json!(30)));
    }

    #[test]
    fn violation_reported_only_for_numeric_mismatch() {
        let r = rule();
        let defaults = snapshot(json!(0), json!(0), json!(0));
        let check = |snap: FormSnapshot| r.violation(&snap, &defaults);
        assert!(check(snapshot(json!(12), json!(18), json!(30))).is_none());
        assert!(check(snapshot(json!("x"), json!(0), json!(30))).is_none());

        let msg = check(snapshot(json!(40), json!(0), json!(30))).unwrap();
        assert!(msg.starts_with("rural + urban must equal total"));
    }
}
