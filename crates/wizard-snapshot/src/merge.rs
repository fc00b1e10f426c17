//! Precedence merge of defaults, remote record and local draft
//!
//! Precedence, low to high: defaults < remote < draft. For every field the
//! defaults declare, the draft's value wins if the draft defines the key,
//! else the remote's value if the remote defines it, else the default.
//! Composite values (arrays, objects) are taken wholesale from the winning
//! source; nothing is merged element-wise. Keys the defaults do not declare
//! are ignored.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::snapshot::{FormSnapshot, PartialSnapshot};

/// Source a merged field value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Section default
    Default,
    /// Last committed backend record
    Remote,
    /// Local unsubmitted draft
    Draft,
}

/// Inputs of one merge
#[derive(Debug, Clone, Copy)]
pub struct MergeSources<'a> {
    /// Default snapshot (defines the field set)
    pub defaults: &'a FormSnapshot,
    /// Remote record, if any
    pub remote: Option<&'a PartialSnapshot>,
    /// Local draft, if any
    pub draft: Option<&'a PartialSnapshot>,
}

impl<'a> MergeSources<'a> {
    /// Merge inputs with only defaults present
    #[inline]
    #[must_use]
    pub fn defaults_only(defaults: &'a FormSnapshot) -> Self {
        Self {
            defaults,
            remote: None,
            draft: None,
        }
    }

    /// Set remote record
    #[inline]
    #[must_use]
    pub fn with_remote(mut self, remote: Option<&'a PartialSnapshot>) -> Self {
        self.remote = remote;
        self
    }

    /// Set local draft
    #[inline]
    #[must_use]
    pub fn with_draft(mut self, draft: Option<&'a PartialSnapshot>) -> Self {
        self.draft = draft;
        self
    }
}

/// Merge output with per-field provenance
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    /// Materialized snapshot
    pub snapshot: FormSnapshot,
    /// Winning source per field, in declaration order
    pub provenance: IndexMap<String, Source>,
}

impl Merged {
    /// Number of fields taken from `source`
    #[must_use]
    pub fn count_from(&self, source: Source) -> usize {
        self.provenance.values().filter(|s| **s == source).count()
    }

    /// Winning source of a field
    #[inline]
    #[must_use]
    pub fn source_of(&self, field: &str) -> Option<Source> {
        self.provenance.get(field).copied()
    }
}

/// Fixed-precedence merge resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeResolver;

impl MergeResolver {
    /// Create resolver
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Merge the three sources
    ///
    /// Total: every field of `sources.defaults` appears in the result.
    #[must_use]
    pub fn resolve(&self, sources: MergeSources<'_>) -> Merged {
        let mut pairs = Vec::with_capacity(sources.defaults.len());
        let mut provenance = IndexMap::with_capacity(sources.defaults.len());

        for (name, default) in sources.defaults.iter() {
            let (value, source) = if let Some(v) = sources.draft.and_then(|d| d.get(name)) {
                (v, Source::Draft)
            } else if let Some(v) = sources.remote.and_then(|r| r.get(name)) {
                (v, Source::Remote)
            } else {
                (default, Source::Default)
            };
            pairs.push((name.to_string(), value.clone()));
            provenance.insert(name.to_string(), source);
        }

        let merged = Merged {
            snapshot: FormSnapshot::from_pairs(pairs),
            provenance,
        };

        tracing::debug!(
            fields = merged.snapshot.len(),
            from_draft = merged.count_from(Source::Draft),
            from_remote = merged.count_from(Source::Remote),
            "merged section snapshot"
        );

        merged
    }
}

/// Merge defaults, remote record and draft into one snapshot
#[must_use]
pub fn merge(
    defaults: &FormSnapshot,
    remote: Option<&PartialSnapshot>,
    draft: Option<&PartialSnapshot>,
) -> FormSnapshot {
    MergeResolver::new()
        .resolve(
            MergeSources::defaults_only(defaults)
                .with_remote(remote)
                .with_draft(draft),
        )
        .snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    fn defaults() -> FormSnapshot {
        FormSnapshot::from_pairs([
            ("total_alunos".to_string(), json!(0)),
            ("alunos_rural".to_string(), json!(0)),
            ("ambientes".to_string(), json!([])),
            ("possui_anexos".to_string(), json!(null)),
        ])
    }

    fn partial(pairs: &[(&str, Value)]) -> PartialSnapshot {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn draft_beats_remote_beats_default() {
        let remote = partial(&[("total_alunos", json!(40)), ("alunos_rural", json!(10))]);
        let draft = partial(&[("total_alunos", json!(30))]);

        let merged = MergeResolver::new().resolve(
            MergeSources::defaults_only(&defaults())
                .with_remote(Some(&remote))
                .with_draft(Some(&draft)),
        );

        assert_eq!(merged.snapshot.get("total_alunos"), Some(&json!(30)));
        assert_eq!(merged.snapshot.get("alunos_rural"), Some(&json!(10)));
        assert_eq!(merged.snapshot.get("ambientes"), Some(&json!([])));
        assert_eq!(merged.source_of("total_alunos"), Some(Source::Draft));
        assert_eq!(merged.source_of("alunos_rural"), Some(Source::Remote));
        assert_eq!(merged.source_of("ambientes"), Some(Source::Default));
    }

    #[test]
    fn arrays_replaced_wholesale() {
        let remote = partial(&[("ambientes", json!(["Biblioteca", "Quadra Esportiva"]))]);
        let draft = partial(&[("ambientes", json!(["Auditório"]))]);

        let snap = merge(&defaults(), Some(&remote), Some(&draft));
        assert_eq!(snap.get("ambientes"), Some(&json!(["Auditório"])));
    }

    #[test]
    fn draft_null_overrides_remote() {
        let remote = partial(&[("possui_anexos", json!("Sim"))]);
        let draft = partial(&[("possui_anexos", json!(null))]);

        let snap = merge(&defaults(), Some(&remote), Some(&draft));
        assert_eq!(snap.get("possui_anexos"), Some(&json!(null)));
    }

    #[test]
    fn undeclared_keys_ignored() {
        let remote = partial(&[("nome_escola", json!("E.E. Augusto Meira"))]);
        let snap = merge(&defaults(), Some(&remote), None);
        assert_eq!(snap.len(), 4);
        assert!(!snap.contains("nome_escola"));
    }

    #[test]
    fn no_sources_yields_defaults() {
        assert_eq!(merge(&defaults(), None, None), defaults());
    }

    fn key() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("a".to_string()),
            Just("b".to_string()),
            Just("c".to_string()),
            Just("d".to_string()),
            Just("foreign".to_string()),
        ]
    }

    fn layer() -> impl Strategy<Value = BTreeMap<String, i64>> {
        prop::collection::btree_map(key(), any::<i64>(), 0..5)
    }

    fn to_partial(layer: &BTreeMap<String, i64>) -> PartialSnapshot {
        layer.iter().map(|(k, v)| (k.clone(), json!(v))).collect()
    }

    fn to_defaults(layer: &BTreeMap<String, i64>) -> FormSnapshot {
        FormSnapshot::from_pairs(
            layer
                .iter()
                .filter(|(k, _)| k.as_str() != "foreign")
                .map(|(k, v)| (k.clone(), json!(v))),
        )
    }

    proptest! {
        #[test]
        fn prop_precedence(d in layer(), r in layer(), l in layer()) {
            let defaults = to_defaults(&d);
            let remote = to_partial(&r);
            let draft = to_partial(&l);
            let merged = merge(&defaults, Some(&remote), Some(&draft));

            for (k, default) in defaults.iter() {
                let expected = draft.get(k).or_else(|| remote.get(k)).unwrap_or(default);
                prop_assert_eq!(merged.get(k), Some(expected));
            }
        }

        #[test]
        fn prop_total(d in layer(), r in layer(), l in layer()) {
            let defaults = to_defaults(&d);
            let merged = merge(&defaults, Some(&to_partial(&r)), Some(&to_partial(&l)));
            prop_assert_eq!(merged.len(), defaults.len());
            for name in defaults.field_names() {
                prop_assert!(merged.contains(name));
            }
        }

        #[test]
        fn prop_empty_draft_is_remote_over_defaults(d in layer(), r in layer()) {
            let defaults = to_defaults(&d);
            let remote = to_partial(&r);
            let without = merge(&defaults, Some(&remote), None);
            let empty = merge(&defaults, Some(&remote), Some(&PartialSnapshot::new()));
            prop_assert_eq!(&without, &empty);

            for (k, default) in defaults.iter() {
                prop_assert_eq!(without.get(k), Some(remote.get(k).unwrap_or(default)));
            }
        }
    }
}
