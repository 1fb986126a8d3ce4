//! Core types and traits for Amphora
//!
//! This crate defines the foundational pieces used throughout the system:
//! - Uri model: composite string keys with embedded `@version` suffixes
//! - Document helpers: `_ref` placeholders and `_version` stamps
//! - BatchOperation: the atomic put/del unit, plus aggregated validation
//! - Schema and Locals: externally loaded structures the core reads
//! - Limits: resource knobs (key bytes, resolution depth, batch size)
//! - Error taxonomy: typed failures recovered at the HTTP boundary
//! - Traits: `KvStore` (swappable storage seam) and `ComponentModule`
//!   (per-component-type capability set)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod document;
pub mod error;
pub mod limits;
pub mod schema;
pub mod traits;
pub mod uri;

// Re-export commonly used types at the crate root
pub use batch::{assert_valid_batch_ops, validate_batch_op, BatchOperation, OpType};
pub use document::{
    data_version, is_placeholder, parse_document, ref_uri, serialize_document, REF_KEY,
    VERSION_KEY,
};
pub use error::{AmphoraError, Result};
pub use limits::Limits;
pub use schema::{Locals, Schema};
pub use traits::{ComponentModule, KvStore, ListEntry, ListOptions, ListStream, PutPlan};
pub use uri::ParsedUri;
