//! Backend collaborator contract

use async_trait::async_trait;

use wizard_snapshot::{PartialSnapshot, SectionId, SubjectId};

use crate::error::RemoteError;
use crate::wire::{SubjectMetadata, SubmissionPayload};

/// Census backend holding committed section records
///
/// Implementations report every failure; callers that must not fail wrap
/// the backend in a [`RemoteFetcher`](crate::RemoteFetcher).
#[async_trait]
pub trait RecordBackend: Send + Sync + std::fmt::Debug {
    /// Previously committed record of one section
    ///
    /// # Returns
    /// `Ok(None)` if the section was never submitted
    async fn fetch_record(
        &self,
        subject: SubjectId,
        section: &SectionId,
    ) -> Result<Option<PartialSnapshot>, RemoteError>;

    /// Commit a section record
    async fn write_record(&self, payload: &SubmissionPayload) -> Result<(), RemoteError>;

    /// Subject metadata (offered shifts)
    async fn fetch_subject(&self, subject: SubjectId) -> Result<SubjectMetadata, RemoteError>;
}
