//! Census wizard core
//!
//! Drives one wizard section from activation to submission:
//! - Loads defaults, the committed remote record and the local draft, and
//!   merges them with fixed precedence
//! - Routes user edits through the section's reconciler
//! - Writes every settled change through to the draft store
//! - Validates and submits, clearing the draft only on confirmed success
//!
//! # Core Concepts
//!
//! - [`SectionCatalog`]: ordered wizard steps, each a schema plus rule table
//! - [`SectionController`]: activation ordering and supersession
//! - [`ActiveSection`]: live snapshot, edits, observers, submit
//! - [`SectionValidator`]: pre-submission check; [`SchemaValidator`] built in
//! - [`WizardConfig`]: TOML configuration with environment overrides
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use serde_json::json;
//! use wizard_core::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WizardConfig::new();
//! let controller = SectionController::new(
//!     Arc::new(SectionCatalog::census()?),
//!     Arc::new(HttpBackend::new(&config.api_base_url)?),
//!     Arc::new(FileDraftStore::new(&config.draft.directory)),
//!     config,
//! )?;
//!
//! let mut section = controller.activate(SubjectId(42), "general").await?;
//! section.edit("total_alunos", json!(30))?;
//! section.submit(&SchemaValidator::new()).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod applicability;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod section;
pub mod validate;

mod binding;
mod census;

pub use applicability::Applicability;
pub use catalog::{CatalogError, SectionCatalog, SectionDefinition};
pub use config::{ConfigError, DraftConfig, WizardConfig};
pub use controller::SectionController;
pub use error::{EditError, LifecycleError, SubmitError, WizardError};
pub use section::{ActivationId, ActiveSection, SectionState};
pub use validate::{SchemaValidator, SectionValidator, ValidationReport, Violation, ViolationKind};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for hosts driving the wizard
    pub use crate::{
        ActiveSection, SchemaValidator, SectionCatalog, SectionController, SectionValidator,
        WizardConfig, WizardError,
    };
    pub use wizard_drafts::{DraftStore, FileDraftStore, MemoryDraftStore};
    pub use wizard_reconcile::{ChangeObserver, ChangeSet};
    pub use wizard_remote::{HttpBackend, MemoryBackend, RecordBackend};
    pub use wizard_snapshot::{FormSnapshot, SubjectId};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
