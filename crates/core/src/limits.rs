//! Resource limits
//!
//! Configuration knobs enforced at the storage and composition layers.
//! Defaults are generous; deployments tighten them per site.

/// Limits applied across the content core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum uri length in bytes accepted by the KV store
    pub max_key_bytes: usize,
    /// Maximum `_ref` chain depth during reference resolution
    ///
    /// Bounds runaway (non-cyclic) reference chains; cycles are caught
    /// separately by path tracking.
    pub max_resolution_depth: usize,
    /// Maximum operations accepted in one batch
    pub max_batch_ops: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_key_bytes: 1024,
            max_resolution_depth: 32,
            max_batch_ops: 1000,
        }
    }
}
