//! Remote state fetcher
//!
//! Wraps a [`RecordBackend`] so reads never fail the caller: network
//! errors, non-success statuses, decode failures and timeouts all resolve
//! to "absent" with a warning.

use std::sync::Arc;
use std::time::Duration;

use wizard_snapshot::{PartialSnapshot, SectionSchema, SubjectId};

use crate::backend::RecordBackend;
use crate::error::RemoteError;
use crate::wire::SubjectMetadata;

/// Default bound on a single read
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Infallible reader over a backend
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    backend: Arc<dyn RecordBackend>,
    timeout: Duration,
}

impl RemoteFetcher {
    /// Create fetcher with the default timeout
    #[must_use]
    pub fn new(backend: Arc<dyn RecordBackend>) -> Self {
        Self {
            backend,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Set the read timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Committed record of a section, restricted to its declared fields
    ///
    /// # Errors
    /// Any backend failure, or [`RemoteError::Timeout`]
    pub async fn try_fetch(
        &self,
        subject: SubjectId,
        schema: &SectionSchema,
    ) -> Result<Option<PartialSnapshot>, RemoteError> {
        let read = self.backend.fetch_record(subject, schema.id());
        let record = tokio::time::timeout(self.timeout, read)
            .await
            .map_err(|_| RemoteError::Timeout {
                operation: "fetch_record",
                secs: self.timeout.as_secs(),
            })??;

        Ok(record.map(|mut record| {
            let dropped = record.retain_declared(schema);
            if !dropped.is_empty() {
                tracing::debug!(
                    subject = %subject,
                    section = %schema.id(),
                    ?dropped,
                    "ignored undeclared remote fields"
                );
            }
            record
        }))
    }

    /// Committed record of a section, or `None` on any failure
    pub async fn fetch(&self, subject: SubjectId, schema: &SectionSchema) -> Option<PartialSnapshot> {
        match self.try_fetch(subject, schema).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    subject = %subject,
                    section = %schema.id(),
                    error = %e,
                    "remote fetch failed, continuing without remote data"
                );
                None
            }
        }
    }

    /// Subject metadata, or `None` on any failure
    pub async fn subject(&self, subject: SubjectId) -> Option<SubjectMetadata> {
        let read = self.backend.fetch_subject(subject);
        match tokio::time::timeout(self.timeout, read).await {
            Ok(Ok(meta)) => Some(meta),
            Ok(Err(e)) => {
                tracing::warn!(subject = %subject, error = %e, "subject metadata unavailable");
                None
            }
            Err(_) => {
                tracing::warn!(subject = %subject, "subject metadata timed out");
                None
            }
        }
    }

    /// Underlying backend
    #[inline]
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn RecordBackend> {
        &self.backend
    }
}
