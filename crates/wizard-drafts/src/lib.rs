//! Census wizard draft store
//!
//! Persists a section's in-progress answers under a key scoped to
//! (namespace, section, subject, schema version).
//!
//! # Core Concepts
//!
//! - [`DraftKey`]: namespaced key; bumping the schema version orphans old drafts
//! - [`DraftStore`]: write/read/clear contract that never fails the caller
//! - [`FileDraftStore`]: one JSON file per key, survives process restarts
//! - [`MemoryDraftStore`]: process-local map with identical decoding rules

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod file;
mod key;
mod memory;
mod store;

pub use error::DraftError;
pub use file::FileDraftStore;
pub use key::{DraftKey, DraftNamespace, DEFAULT_NAMESPACE};
pub use memory::MemoryDraftStore;
pub use store::DraftStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
