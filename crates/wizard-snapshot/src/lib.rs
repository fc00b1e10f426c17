//! Census wizard snapshots
//!
//! Static section schemas and the snapshots that flow through a section's
//! active session.
//!
//! # Core Concepts
//!
//! - [`SectionSchema`]: declared fields, kinds, defaults and optional groups
//! - [`FormSnapshot`]: complete field mapping bound to an active section
//! - [`PartialSnapshot`]: remote record or local draft (any field subset)
//! - [`MergeResolver`]: defaults < remote < draft precedence merge
//! - [`decode_payload`]: unwraps string-encoded record payloads
//!
//! # Example
//!
//! ```rust,ignore
//! use wizard_snapshot::{merge, FieldSpec, SectionId, SectionSchema};
//!
//! let schema = SectionSchema::builder(SectionId::new("general")?, "Dados Gerais")
//!     .field(FieldSpec::number("total_alunos"))
//!     .build()?;
//!
//! let snapshot = merge(&schema.defaults(), remote.as_ref(), draft.as_ref());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod ids;
mod merge;
mod payload;
mod schema;
mod snapshot;
pub mod value;

pub use error::SnapshotError;
pub use ids::{SchemaVersion, SectionId, SectionKey, SubjectId};
pub use merge::{merge, MergeResolver, MergeSources, Merged, Source};
pub use payload::{decode_envelope, decode_payload, RecordEnvelope, MAX_ENCODING_DEPTH};
pub use schema::{FieldGroup, FieldKind, FieldSpec, SectionSchema, SectionSchemaBuilder, Shift};
pub use snapshot::{FormSnapshot, PartialSnapshot};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
