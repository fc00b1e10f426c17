//! Draft store contract and stored record format

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wizard_snapshot::PartialSnapshot;

use crate::error::DraftError;
use crate::key::DraftKey;

/// Key/value persistence of in-progress section answers
///
/// Implementors provide the fallible `try_*` operations. The provided
/// `write`, `read` and `clear` never fail the caller: persistence errors are
/// logged and swallowed, and a draft that cannot be decoded reads as absent.
pub trait DraftStore: Send + Sync + std::fmt::Debug {
    /// Persist `draft` under `key`, replacing any prior value entirely
    ///
    /// # Errors
    /// Implementation specific persistence failure
    fn try_write(&self, key: &DraftKey, draft: &PartialSnapshot) -> Result<(), DraftError>;

    /// Load the last value written under `key`
    ///
    /// # Errors
    /// Persistence failure, or [`DraftError::Corrupt`] /
    /// [`DraftError::KeyMismatch`] for undecodable data
    fn try_read(&self, key: &DraftKey) -> Result<Option<PartialSnapshot>, DraftError>;

    /// Remove the value stored under `key`
    ///
    /// # Errors
    /// Implementation specific persistence failure
    fn try_clear(&self, key: &DraftKey) -> Result<(), DraftError>;

    /// Persist `draft`, logging failures
    fn write(&self, key: &DraftKey, draft: &PartialSnapshot) {
        match self.try_write(key, draft) {
            Ok(()) => tracing::trace!(key = %key, fields = draft.len(), "draft written"),
            Err(e) => tracing::warn!(key = %key, error = %e, "failed to persist draft"),
        }
    }

    /// Load draft; absent on any failure
    fn read(&self, key: &DraftKey) -> Option<PartialSnapshot> {
        match self.try_read(key) {
            Ok(draft) => draft,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "discarding unreadable draft");
                None
            }
        }
    }

    /// Remove draft, logging failures
    fn clear(&self, key: &DraftKey) {
        match self.try_clear(key) {
            Ok(()) => tracing::debug!(key = %key, "draft cleared"),
            Err(e) => tracing::warn!(key = %key, error = %e, "failed to clear draft"),
        }
    }
}

/// On-disk / in-memory representation of one draft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredDraft {
    /// Storage key the draft was written under
    pub(crate) key: String,
    /// Schema version of the field layout
    pub(crate) version: u32,
    /// Write timestamp
    pub(crate) saved_at: DateTime<Utc>,
    /// Field values
    pub(crate) fields: PartialSnapshot,
}

pub(crate) fn encode_draft(key: &DraftKey, draft: &PartialSnapshot) -> Result<String, DraftError> {
    let stored = StoredDraft {
        key: key.storage_key(),
        version: key.version().0,
        saved_at: Utc::now(),
        fields: draft.clone(),
    };
    Ok(serde_json::to_string(&stored)?)
}

pub(crate) fn decode_draft(key: &DraftKey, raw: &str) -> Result<StoredDraft, DraftError> {
    let stored: StoredDraft = serde_json::from_str(raw)
        .map_err(|e| DraftError::corrupt(key.storage_key(), e.to_string()))?;

    let expected = key.storage_key();
    if stored.key != expected || stored.version != key.version().0 {
        return Err(DraftError::KeyMismatch {
            expected,
            found: format!("{}@v{}", stored.key, stored.version),
        });
    }

    Ok(stored)
}
