//! Draft key scheme
//!
//! Keys are `{namespace}_{section}_{subject}_v{version}`, e.g.
//! `censo_draft_general_42_v1`. Every component is restricted to ASCII
//! alphanumerics, `-` and `_`, so the key doubles as a file stem.

use std::fmt;

use wizard_snapshot::{SchemaVersion, SectionKey};

use crate::error::DraftError;

/// Default key namespace
pub const DEFAULT_NAMESPACE: &str = "censo_draft";

/// Validated key namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DraftNamespace(String);

impl DraftNamespace {
    /// Validate a namespace
    ///
    /// # Errors
    /// [`DraftError::InvalidNamespace`] if the namespace is empty or contains
    /// characters other than ASCII alphanumerics, `-` and `_`
    pub fn new(namespace: impl Into<String>) -> Result<Self, DraftError> {
        let namespace = namespace.into();
        let valid = !namespace.is_empty()
            && namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(namespace))
        } else {
            Err(DraftError::InvalidNamespace(namespace))
        }
    }

    /// Namespace as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key for `section` under this namespace
    #[must_use]
    pub fn key(&self, section: SectionKey) -> DraftKey {
        DraftKey {
            namespace: self.0.clone(),
            section,
        }
    }
}

impl Default for DraftNamespace {
    fn default() -> Self {
        Self(DEFAULT_NAMESPACE.to_string())
    }
}

/// Fully namespaced draft key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DraftKey {
    namespace: String,
    section: SectionKey,
}

impl DraftKey {
    /// Create key under `namespace`
    ///
    /// # Errors
    /// [`DraftError::InvalidNamespace`] if the namespace is invalid
    pub fn new(namespace: impl Into<String>, section: SectionKey) -> Result<Self, DraftError> {
        Ok(DraftNamespace::new(namespace)?.key(section))
    }

    /// Create key under [`DEFAULT_NAMESPACE`]
    #[must_use]
    pub fn with_default_namespace(section: SectionKey) -> Self {
        DraftNamespace::default().key(section)
    }

    /// Namespace
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Section key this draft belongs to
    #[inline]
    #[must_use]
    pub fn section(&self) -> &SectionKey {
        &self.section
    }

    /// Schema version
    #[inline]
    #[must_use]
    pub fn version(&self) -> SchemaVersion {
        self.section.version
    }

    /// Flat storage key
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.namespace, self.section.section, self.section.subject, self.section.version
        )
    }
}

impl fmt::Display for DraftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}
