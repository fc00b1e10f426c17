//! Wizard configuration
//!
//! Loaded from TOML, then overridden from the environment:
//!
//! | Variable | Field |
//! |---|---|
//! | `CENSUS_API_URL` | `api_base_url` |
//! | `CENSUS_YEAR` | `census_year` |
//! | `CENSUS_DRAFT_DIR` | `draft.directory` |
//!
//! Invalid environment values are logged and ignored.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use wizard_drafts::{DraftNamespace, DEFAULT_NAMESPACE};
use wizard_snapshot::SchemaVersion;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong
        reason: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Draft persistence settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftConfig {
    /// Key namespace
    pub namespace: String,
    /// Schema version baked into every draft key
    pub schema_version: u32,
    /// Directory of the file-backed store
    pub directory: PathBuf,
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            schema_version: 1,
            directory: PathBuf::from(".census-drafts"),
        }
    }
}

/// Census wizard configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Root URL of the census API
    pub api_base_url: String,
    /// Census year stamped on submissions
    pub census_year: u16,
    /// Bound on remote reads, in seconds
    pub fetch_timeout_secs: u64,
    /// Bound on submissions, in seconds
    pub submit_timeout_secs: u64,
    /// Draft persistence
    pub draft: DraftConfig,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            census_year: 2026,
            fetch_timeout_secs: 10,
            submit_timeout_secs: 30,
            draft: DraftConfig::default(),
        }
    }
}

impl WizardConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With API root
    #[inline]
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// With census year
    #[inline]
    #[must_use]
    pub fn with_census_year(mut self, year: u16) -> Self {
        self.census_year = year;
        self
    }

    /// With fetch timeout
    #[inline]
    #[must_use]
    pub fn with_fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }

    /// With submit timeout
    #[inline]
    #[must_use]
    pub fn with_submit_timeout_secs(mut self, secs: u64) -> Self {
        self.submit_timeout_secs = secs;
        self
    }

    /// With draft schema version
    #[inline]
    #[must_use]
    pub fn with_schema_version(mut self, version: u32) -> Self {
        self.draft.schema_version = version;
        self
    }

    /// With draft directory
    #[inline]
    #[must_use]
    pub fn with_draft_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.draft.directory = dir.into();
        self
    }

    /// Parse from TOML text (missing keys take defaults)
    ///
    /// # Errors
    /// [`ConfigError::Parse`] on malformed TOML or mistyped values
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load from a TOML file, apply environment overrides and validate
    ///
    /// # Errors
    /// [`ConfigError`] if the file cannot be read, parsed or validated
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        if let Some(url) = read("CENSUS_API_URL") {
            self.api_base_url = url;
        }

        if let Some(raw) = read("CENSUS_YEAR") {
            match raw.parse::<u16>() {
                Ok(year) => self.census_year = year,
                Err(err) => tracing::warn!("invalid CENSUS_YEAR, ignoring: {err}"),
            }
        }

        if let Some(dir) = read("CENSUS_DRAFT_DIR") {
            self.draft.directory = PathBuf::from(dir);
        }
    }

    /// Check value ranges
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] naming the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::invalid("api_base_url", "must not be empty"));
        }
        self.draft_namespace()?;
        if self.draft.schema_version == 0 {
            return Err(ConfigError::invalid("draft.schema_version", "must be at least 1"));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::invalid("fetch_timeout_secs", "must be positive"));
        }
        if self.submit_timeout_secs == 0 {
            return Err(ConfigError::invalid("submit_timeout_secs", "must be positive"));
        }
        Ok(())
    }

    /// Validated draft namespace
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] if the namespace is empty or holds
    /// characters unfit for a file name
    pub fn draft_namespace(&self) -> Result<DraftNamespace, ConfigError> {
        DraftNamespace::new(self.draft.namespace.as_str())
            .map_err(|e| ConfigError::invalid("draft.namespace", e.to_string()))
    }

    /// Draft schema version
    #[inline]
    #[must_use]
    pub fn schema_version(&self) -> SchemaVersion {
        SchemaVersion(self.draft.schema_version)
    }

    /// Fetch bound
    #[inline]
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Submit bound
    #[inline]
    #[must_use]
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = WizardConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.census_year, 2026);
        assert_eq!(config.draft.namespace, "censo_draft");
        assert_eq!(config.schema_version(), SchemaVersion(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = WizardConfig::from_toml_str(
            r#"
            census_year = 2027

            [draft]
            schema_version = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.census_year, 2027);
        assert_eq!(config.draft.schema_version, 3);
        assert_eq!(config.draft.namespace, "censo_draft");
        assert_eq!(config.fetch_timeout_secs, 10);
    }

    #[test]
    fn mistyped_toml_is_rejected() {
        let err = WizardConfig::from_toml_str("census_year = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides_apply_and_invalid_values_are_ignored() {
        let vars: HashMap<&str, &str> = [
            ("CENSUS_API_URL", " https://censo.example.org "),
            ("CENSUS_YEAR", "next year"),
            ("CENSUS_DRAFT_DIR", "/tmp/drafts"),
        ]
        .into_iter()
        .collect();

        let mut config = WizardConfig::default();
        config.apply_overrides_from(|name| vars.get(name).map(ToString::to_string));

        assert_eq!(config.api_base_url, "https://censo.example.org");
        assert_eq!(config.census_year, 2026);
        assert_eq!(config.draft.directory, PathBuf::from("/tmp/drafts"));
    }

    #[test]
    fn validation_rejects_zero_version_and_timeouts() {
        let err = WizardConfig::default().with_schema_version(0).validate().unwrap_err();
        assert!(err.to_string().contains("draft.schema_version"));

        let err = WizardConfig::default().with_submit_timeout_secs(0).validate().unwrap_err();
        assert!(err.to_string().contains("submit_timeout_secs"));

        let mut config = WizardConfig::default();
        config.draft.namespace = "../drafts".to_string();
        assert!(config.validate().is_err());
        assert!(config.draft_namespace().is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wizard.toml");
        std::fs::write(&path, "fetch_timeout_secs = 5\n").unwrap();

        let config = WizardConfig::load(&path).unwrap();
        assert_eq!(config.fetch_timeout(), Duration::from_secs(5));

        assert!(matches!(
            WizardConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
