//! File-backed draft store
//!
//! One JSON file per draft key under a directory. Writes go to a temporary
//! sibling first and are renamed into place, so a crash mid-write never
//! leaves a torn draft behind.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use wizard_snapshot::{PartialSnapshot, SchemaVersion};

use crate::error::DraftError;
use crate::key::DraftKey;
use crate::store::{decode_draft, encode_draft, DraftStore, StoredDraft};

const EXTENSION: &str = "json";

/// Draft store persisting to a directory
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    root: PathBuf,
}

impl FileDraftStore {
    /// Create store rooted at `root`
    ///
    /// The directory is created on first write.
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `key`
    #[must_use]
    pub fn path_for(&self, key: &DraftKey) -> PathBuf {
        self.root.join(format!("{}.{EXTENSION}", key.storage_key()))
    }

    /// Delete drafts of `namespace` written under a schema version other than `current`
    ///
    /// # Returns
    /// Number of files removed
    ///
    /// # Errors
    /// [`DraftError::Io`] if the directory cannot be listed
    pub fn purge_orphans(
        &self,
        namespace: &str,
        current: SchemaVersion,
    ) -> Result<usize, DraftError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(DraftError::io_error(&self.root, e)),
        };

        let prefix = format!("{namespace}_");
        let mut removed = 0;

        for entry in entries {
            let path = entry.map_err(|e| DraftError::io_error(&self.root, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !stem.starts_with(&prefix) {
                continue;
            }

            let orphaned = match fs::read_to_string(&path)
                .ok()
                .and_then(|raw| serde_json::from_str::<StoredDraft>(&raw).ok())
            {
                Some(stored) => stored.version != current.0,
                // Undecodable drafts can never be read back either
                None => true,
            };

            if orphaned {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to purge draft"),
                }
            }
        }

        tracing::debug!(namespace, removed, "purged orphaned drafts");
        Ok(removed)
    }
}

impl DraftStore for FileDraftStore {
    fn try_write(&self, key: &DraftKey, draft: &PartialSnapshot) -> Result<(), DraftError> {
        fs::create_dir_all(&self.root).map_err(|e| DraftError::io_error(&self.root, e))?;

        let path = self.path_for(key);
        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));
        let raw = encode_draft(key, draft)?;

        fs::write(&tmp, raw).map_err(|e| DraftError::io_error(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| DraftError::io_error(&path, e))?;
        Ok(())
    }

    fn try_read(&self, key: &DraftKey) -> Result<Option<PartialSnapshot>, DraftError> {
        let path = self.path_for(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DraftError::io_error(&path, e)),
        };
        decode_draft(key, &raw).map(|stored| Some(stored.fields))
    }

    fn try_clear(&self, key: &DraftKey) -> Result<(), DraftError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DraftError::io_error(&path, e)),
        }
    }
}
