//! In-memory draft store
//!
//! Holds encoded drafts in a map, so corrupt-data handling behaves exactly
//! like the file store. Used by tests and by hosts that persist elsewhere.

use parking_lot::RwLock;
use std::collections::HashMap;
use wizard_snapshot::PartialSnapshot;

use crate::error::DraftError;
use crate::key::DraftKey;
use crate::store::{decode_draft, encode_draft, DraftStore};

/// Draft store backed by a process-local map
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryDraftStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw text under a key, bypassing encoding
    pub fn insert_raw(&self, key: &DraftKey, raw: impl Into<String>) {
        self.entries.write().insert(key.storage_key(), raw.into());
    }

    /// Raw text stored under a key
    #[must_use]
    pub fn raw(&self, key: &DraftKey) -> Option<String> {
        self.entries.read().get(&key.storage_key()).cloned()
    }

    /// Whether a value is stored under `key`
    #[must_use]
    pub fn contains(&self, key: &DraftKey) -> bool {
        self.entries.read().contains_key(&key.storage_key())
    }

    /// Number of stored drafts
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no draft is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl DraftStore for MemoryDraftStore {
    fn try_write(&self, key: &DraftKey, draft: &PartialSnapshot) -> Result<(), DraftError> {
        let raw = encode_draft(key, draft)?;
        self.entries.write().insert(key.storage_key(), raw);
        Ok(())
    }

    fn try_read(&self, key: &DraftKey) -> Result<Option<PartialSnapshot>, DraftError> {
        let guard = self.entries.read();
        match guard.get(&key.storage_key()) {
            Some(raw) => decode_draft(key, raw).map(|stored| Some(stored.fields)),
            None => Ok(None),
        }
    }

    fn try_clear(&self, key: &DraftKey) -> Result<(), DraftError> {
        self.entries.write().remove(&key.storage_key());
        Ok(())
    }
}
