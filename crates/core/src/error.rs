//! Error types for the Amphora content core
//!
//! This module defines all error kinds used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! The HTTP layer (external) recovers everything here at the boundary:
//! `NotFound` maps to a 404-equivalent, everything else to a 500-equivalent.
//! The core itself never produces a user-facing response, only typed failures.

use thiserror::Error;

/// Result type alias for Amphora operations
pub type Result<T> = std::result::Result<T, AmphoraError>;

/// Error types for the content core
#[derive(Debug, Error)]
pub enum AmphoraError {
    /// Referenced key absent in the KV store
    ///
    /// This is the only storage error kind callers may depend on;
    /// backends map their own "missing key" failures to this variant.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed batch operation(s), detected before any write is attempted
    ///
    /// Aggregated: every violation across the whole batch is reported in
    /// one message, not just the first.
    #[error("Invalid batch operations: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// A put produced zero batch operations
    ///
    /// Always a defect in a component module's put logic, never "nothing to do".
    #[error("Component module PUT failed to create batch operations: {0}")]
    EmptyBatch(String),

    /// An upgrade transform threw; the whole chain aborts and the stored
    /// data is left untouched (no partial version stamp)
    #[error("Upgrade transform {version} failed for {uri}: {message}")]
    UpgradeTransform {
        /// Uri of the document being upgraded
        uri: String,
        /// Transform version key that failed
        version: String,
        /// Underlying failure description
        message: String,
    },

    /// A replacement storage or search backend is missing required
    /// capabilities; raised at registration time, never per-request
    #[error("Storage contract violation: {0}")]
    StorageContract(String),

    /// A `_ref` chain re-entered a uri already being resolved
    #[error("Reference cycle detected at {0}")]
    Cycle(String),

    /// A `_ref` chain exceeded the configured resolution depth
    #[error("Reference resolution exceeded maximum depth of {max}")]
    ResolutionDepth {
        /// Configured maximum depth
        max: usize,
    },

    /// JSON serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend storage failure other than a missing key
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AmphoraError {
    /// Construct a `NotFound` error for a key
    pub fn not_found(key: impl Into<String>) -> Self {
        AmphoraError::NotFound(key.into())
    }

    /// Construct a generic storage error
    pub fn storage(message: impl Into<String>) -> Self {
        AmphoraError::Storage(message.into())
    }

    /// True if this is the distinguishable missing-key kind
    pub fn is_not_found(&self) -> bool {
        matches!(self, AmphoraError::NotFound(_))
    }
}
