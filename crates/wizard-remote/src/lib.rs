//! Census wizard backend collaborator
//!
//! # Core Concepts
//!
//! - [`RecordBackend`]: fallible contract for reading and committing
//!   section records and subject metadata
//! - [`RemoteFetcher`]: infallible, time-bounded reader that degrades every
//!   failure to "no remote data"
//! - [`HttpBackend`]: the census REST API over `reqwest`
//! - [`MemoryBackend`]: process-local backend with failure injection

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod backend;
mod error;
mod fetcher;
mod http;
mod memory;
mod wire;

pub use backend::RecordBackend;
pub use error::RemoteError;
pub use fetcher::{RemoteFetcher, DEFAULT_FETCH_TIMEOUT};
pub use http::HttpBackend;
pub use memory::MemoryBackend;
pub use wire::{SubjectMetadata, SubmissionPayload, SubmissionStatus};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
