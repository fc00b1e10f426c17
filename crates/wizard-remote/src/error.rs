//! Error types for the backend collaborator

use wizard_snapshot::SnapshotError;

/// Errors raised while talking to the census backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Transport failure (connection refused, reset, DNS)
    #[error("network error: {0}")]
    Network(String),

    /// Backend answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Response body could not be decoded
    #[error("invalid response: {0}")]
    Decode(String),

    /// Operation did not finish in time
    #[error("{operation} timed out after {secs}s")]
    Timeout {
        /// Operation name
        operation: &'static str,
        /// Configured bound
        secs: u64,
    },

    /// Client could not be constructed
    #[error("client setup failed: {0}")]
    Setup(String),
}

impl RemoteError {
    /// Create status error
    #[inline]
    pub fn status(status: u16, url: impl Into<String>) -> Self {
        Self::Status {
            status,
            url: url.into(),
        }
    }

    /// Whether retrying the same request may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Decode(_) | Self::Setup(_) => false,
        }
    }
}

impl From<SnapshotError> for RemoteError {
    fn from(e: SnapshotError) -> Self {
        Self::Decode(e.to_string())
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(RemoteError::Network("reset".into()).is_retryable());
        assert!(RemoteError::Timeout { operation: "submit", secs: 30 }.is_retryable());
        assert!(RemoteError::status(503, "http://x").is_retryable());
        assert!(!RemoteError::status(422, "http://x").is_retryable());
        assert!(!RemoteError::Decode("bad".into()).is_retryable());
    }

    #[test]
    fn status_display() {
        let err = RemoteError::status(500, "http://localhost:8000/v1/census");
        assert_eq!(err.to_string(), "http://localhost:8000/v1/census returned HTTP 500");
    }
}
