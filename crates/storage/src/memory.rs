//! MemoryStore: embedded ordered backend with atomic batch
//!
//! This module implements the `KvStore` trait using:
//! - `BTreeMap<String, String>` for ordered key storage
//! - `parking_lot::RwLock` for thread-safe access
//!
//! # Design Notes
//!
//! - **Atomic batch**: operations are validated up front, then the whole
//!   list is applied under one write lock, so partial application is never
//!   observable to readers.
//! - **Lexicographic scans**: `list` walks the ordered key space, which is
//!   exactly the ordering guarantee prefix-scan consumers rely on.
//! - **Per-call snapshot**: a scan materializes its matching range under the
//!   read lock and yields it lazily, so a slow consumer never holds the lock.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use tracing::debug;

use amphora_core::{
    assert_valid_batch_ops, AmphoraError, BatchOperation, KvStore, Limits, ListEntry, ListOptions,
    ListStream, OpType, Result,
};

/// Embedded ordered store for tests and small deployments
///
/// The production deployment swaps in a networked backend behind the same
/// `KvStore` interface; nothing above the trait may tell them apart beyond
/// the `NotFound` error kind.
#[derive(Debug)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<String, String>>,
    limits: Limits,
}

impl MemoryStore {
    /// Create an empty store with default limits
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    /// Create an empty store with custom limits
    pub fn with_limits(limits: Limits) -> Self {
        MemoryStore {
            data: RwLock::new(BTreeMap::new()),
            limits,
        }
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// True if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    fn check_key(&self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(AmphoraError::storage("key cannot be empty"));
        }
        if key.len() > self.limits.max_key_bytes {
            return Err(AmphoraError::storage(format!(
                "key length {} exceeds maximum {}",
                key.len(),
                self.limits.max_key_bytes
            )));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<String> {
        let data = self.data.read();
        data.get(key)
            .cloned()
            .ok_or_else(|| AmphoraError::not_found(key))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.check_key(key)?;
        let mut data = self.data.write();
        data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn del(&self, key: &str) -> Result<()> {
        let mut data = self.data.write();
        data.remove(key);
        Ok(())
    }

    fn batch(&self, ops: Vec<BatchOperation>) -> Result<()> {
        assert_valid_batch_ops(&ops)?;
        if ops.len() > self.limits.max_batch_ops {
            return Err(AmphoraError::storage(format!(
                "batch size {} exceeds maximum {}",
                ops.len(),
                self.limits.max_batch_ops
            )));
        }
        for op in &ops {
            self.check_key(&op.key)?;
        }

        // Everything is validated; apply under one write lock so the batch
        // is all-or-nothing from any reader's point of view.
        let mut data = self.data.write();
        debug!(ops = ops.len(), "applying batch");
        for op in ops {
            match op.op_type {
                OpType::Put => {
                    // Validation guarantees a value is present for puts.
                    if let Some(value) = op.value {
                        data.insert(op.key, value);
                    }
                }
                OpType::Del => {
                    data.remove(&op.key);
                }
            }
        }
        Ok(())
    }

    fn list(&self, options: ListOptions) -> Result<ListStream> {
        let data = self.data.read();
        let entries: Vec<ListEntry> = data
            .range(options.prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&options.prefix))
            .take(options.limit.unwrap_or(usize::MAX))
            .map(|(key, value)| ListEntry {
                key: options.keys.then(|| key.clone()),
                value: options.values.then(|| value.clone()),
            })
            .collect();
        Ok(Box::new(entries.into_iter()))
    }
}
