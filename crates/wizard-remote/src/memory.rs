//! In-memory backend
//!
//! Holds record payloads exactly as the HTTP backend would receive them
//! (string-encoded payloads included) and supports failure and latency
//! injection for tests and offline use.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use wizard_snapshot::{decode_payload, PartialSnapshot, SectionId, SubjectId};

use crate::backend::RecordBackend;
use crate::error::RemoteError;
use crate::wire::{SubjectMetadata, SubmissionPayload};

#[derive(Debug, Default)]
struct State {
    records: HashMap<(SubjectId, SectionId), Value>,
    subjects: HashMap<SubjectId, SubjectMetadata>,
    submissions: Vec<SubmissionPayload>,
    read_failure: Option<RemoteError>,
    write_failure: Option<RemoteError>,
    latency: Duration,
}

/// Backend kept in process memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
    reads: AtomicUsize,
}

impl MemoryBackend {
    /// Create empty backend
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw record payload (object, `null` or encoded string)
    pub fn seed_record(&self, subject: SubjectId, section: &SectionId, payload: Value) {
        self.state
            .lock()
            .records
            .insert((subject, section.clone()), payload);
    }

    /// Store subject metadata
    pub fn seed_subject(&self, meta: SubjectMetadata) {
        self.state.lock().subjects.insert(meta.subject, meta);
    }

    /// Make every read fail with `error`
    pub fn fail_reads(&self, error: RemoteError) {
        self.state.lock().read_failure = Some(error);
    }

    /// Make every write fail with `error`
    pub fn fail_writes(&self, error: RemoteError) {
        self.state.lock().write_failure = Some(error);
    }

    /// Remove injected failures
    pub fn heal(&self) {
        let mut state = self.state.lock();
        state.read_failure = None;
        state.write_failure = None;
    }

    /// Delay every operation by `latency`
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    /// Accepted submissions, oldest first
    #[must_use]
    pub fn submissions(&self) -> Vec<SubmissionPayload> {
        self.state.lock().submissions.clone()
    }

    /// Number of record reads served or attempted
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        let latency = self.state.lock().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl RecordBackend for MemoryBackend {
    async fn fetch_record(
        &self,
        subject: SubjectId,
        section: &SectionId,
    ) -> Result<Option<PartialSnapshot>, RemoteError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.delay().await;

        let payload = {
            let state = self.state.lock();
            if let Some(e) = &state.read_failure {
                return Err(e.clone());
            }
            state.records.get(&(subject, section.clone())).cloned()
        };

        match payload {
            Some(payload) => Ok(decode_payload(payload)?),
            None => Ok(None),
        }
    }

    async fn write_record(&self, payload: &SubmissionPayload) -> Result<(), RemoteError> {
        self.delay().await;

        let mut state = self.state.lock();
        if let Some(e) = &state.write_failure {
            return Err(e.clone());
        }
        state.records.insert(
            (payload.subject, payload.section.clone()),
            Value::Object(payload.data.clone()),
        );
        state.submissions.push(payload.clone());
        Ok(())
    }

    async fn fetch_subject(&self, subject: SubjectId) -> Result<SubjectMetadata, RemoteError> {
        self.delay().await;

        let state = self.state.lock();
        if let Some(e) = &state.read_failure {
            return Err(e.clone());
        }
        Ok(state
            .subjects
            .get(&subject)
            .cloned()
            .unwrap_or_else(|| SubjectMetadata::all_shifts(subject)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::SubmissionStatus;
    use serde_json::json;
    use wizard_snapshot::FormSnapshot;

    fn general() -> SectionId {
        SectionId::new("general").unwrap()
    }

    #[tokio::test]
    async fn double_encoded_payload_is_unwrapped() {
        let backend = MemoryBackend::new();
        let inner = json!({ "total_alunos": 12 }).to_string();
        backend.seed_record(SubjectId(3), &general(), Value::String(inner));

        let record = backend.fetch_record(SubjectId(3), &general()).await.unwrap().unwrap();
        assert_eq!(record.get("total_alunos"), Some(&json!(12)));
        assert_eq!(backend.read_count(), 1);
    }

    #[tokio::test]
    async fn write_then_read_back() {
        let backend = MemoryBackend::new();
        let snapshot = FormSnapshot::from_pairs([("total_alunos".to_string(), json!(30))]);
        let payload = SubmissionPayload::new(
            SubjectId(3),
            general(),
            2026,
            SubmissionStatus::Draft,
            &snapshot,
        );

        backend.write_record(&payload).await.unwrap();
        let record = backend.fetch_record(SubjectId(3), &general()).await.unwrap().unwrap();
        assert_eq!(record.get("total_alunos"), Some(&json!(30)));
        assert_eq!(backend.submissions(), vec![payload]);
    }

    #[tokio::test]
    async fn injected_write_failure_then_heal() {
        let backend = MemoryBackend::new();
        backend.fail_writes(RemoteError::status(500, "memory"));
        let payload = SubmissionPayload::new(
            SubjectId(3),
            general(),
            2026,
            SubmissionStatus::Draft,
            &FormSnapshot::default(),
        );

        assert!(backend.write_record(&payload).await.is_err());
        assert!(backend.submissions().is_empty());

        backend.heal();
        assert!(backend.write_record(&payload).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_subject_offers_every_shift() {
        let meta = MemoryBackend::new().fetch_subject(SubjectId(9)).await.unwrap();
        assert_eq!(meta, SubjectMetadata::all_shifts(SubjectId(9)));
    }
}
