//! Error types for snapshot handling

/// Errors raised while building schemas or decoding snapshots
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Identifier is empty or contains forbidden characters
    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    /// Field declared twice in one section
    #[error("duplicate field in section {section}: {field}")]
    DuplicateField {
        /// Section being built
        section: String,
        /// Offending field
        field: String,
    },

    /// Field referenced but not declared by the section
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Payload could not be decoded into a field mapping
    #[error("payload decode failed: {0}")]
    Decode(String),

    /// JSON (de)serialization failure
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SnapshotError {
    /// Create duplicate field error
    #[inline]
    pub fn duplicate_field(section: impl Into<String>, field: impl Into<String>) -> Self {
        Self::DuplicateField {
            section: section.into(),
            field: field.into(),
        }
    }
}
