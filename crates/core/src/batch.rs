//! Batch operations and their validation
//!
//! A batch is a set of put/del operations submitted atomically to the KV
//! store: partial application must never be observable. Validation happens
//! before any operation reaches a backend, and every violation across the
//! whole batch is reported in one aggregated error — no partial batches are
//! attempted.

use crate::error::{AmphoraError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation type of a batch entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpType {
    /// Write a serialized value under a key
    Put,
    /// Remove a key
    Del,
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpType::Put => write!(f, "put"),
            OpType::Del => write!(f, "del"),
        }
    }
}

/// One put/del unit submitted atomically as part of a batch
///
/// `value` holds serialized JSON for puts and is absent for dels. A value
/// beginning with `"` is a JSON string literal, meaning the caller
/// double-encoded an already-serialized payload; validation flags that as
/// its own diagnosis, distinct from a missing value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOperation {
    /// Operation type
    #[serde(rename = "type")]
    pub op_type: OpType,
    /// Target uri (the KV key)
    pub key: String,
    /// Serialized JSON payload; required unless `op_type` is `Del`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl BatchOperation {
    /// Construct a put operation
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        BatchOperation {
            op_type: OpType::Put,
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// Construct a del operation
    pub fn del(key: impl Into<String>) -> Self {
        BatchOperation {
            op_type: OpType::Del,
            key: key.into(),
            value: None,
        }
    }
}

/// Validate one batch operation, reporting every violation
///
/// Rules are evaluated independently so all problems surface at once:
/// - `key` must be non-empty
/// - `value` must be present for non-del operations
/// - a value that looks like a JSON string literal (leading `"`) is flagged
///   as double-stringified instead of missing — mutually exclusive diagnoses
///
/// An empty list means the operation is valid. Type well-formedness is
/// enforced by [`OpType`] at construction time.
pub fn validate_batch_op(op: &BatchOperation) -> Vec<String> {
    let mut errors = Vec::new();

    if op.key.is_empty() {
        errors.push("Missing key in batch operation".to_string());
    }

    if op.op_type != OpType::Del {
        match &op.value {
            None => {
                errors.push(format!(
                    "Missing value in batch operation for type {}",
                    op.op_type
                ));
            }
            Some(value) if value.starts_with('"') => {
                errors.push("Double-stringified value in batch operation".to_string());
            }
            Some(_) => {}
        }
    }

    errors
}

/// Validate a whole batch, failing with one aggregated error
///
/// All per-op violations are collected into a single
/// [`AmphoraError::Validation`]; if any exist, no operation from the batch
/// should be attempted.
pub fn assert_valid_batch_ops(ops: &[BatchOperation]) -> Result<()> {
    let errors: Vec<String> = ops
        .iter()
        .enumerate()
        .flat_map(|(idx, op)| {
            validate_batch_op(op)
                .into_iter()
                .map(move |e| format!("op {idx} ({}): {e}", op.key))
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AmphoraError::Validation(errors))
    }
}
