//! Error types for draft persistence
//!
//! None of these reach the wizard user: the [`DraftStore`](crate::DraftStore)
//! contract logs and swallows them.

use std::path::PathBuf;

/// Draft persistence failure
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    /// Namespace contains forbidden characters
    #[error("invalid draft namespace: '{0}'")]
    InvalidNamespace(String),

    /// Filesystem failure
    #[error("io error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Stored draft could not be decoded
    #[error("corrupt draft {key}: {reason}")]
    Corrupt {
        /// Storage key
        key: String,
        /// Decode failure
        reason: String,
    },

    /// Stored draft belongs to another key or schema version
    #[error("draft key mismatch: expected {expected}, found {found}")]
    KeyMismatch {
        /// Key requested
        expected: String,
        /// Key recorded in the stored draft
        found: String,
    },

    /// Draft could not be encoded
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl DraftError {
    /// Create IO error for path
    #[inline]
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create corrupt draft error
    #[inline]
    pub fn corrupt(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
