//! Bulk operation shapes
//!
//! The search engine ingests writes as bulk requests: one action header
//! plus one document body per operation, submitted in a single call.
//! `BulkOp` is the logical form; [`to_request_body`] renders the wire
//! shape a candidate engine consumes.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// What a bulk entry does to the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    /// Index (create or replace) a document
    Index,
    /// Remove a document
    Delete,
}

/// One logical bulk operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkOp {
    /// Action to perform
    pub action: BulkAction,
    /// Target index name
    pub index: String,
    /// Document id within the index
    pub id: String,
    /// Document body; present for index actions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<Value>,
}

impl BulkOp {
    /// Construct an index operation
    pub fn index(index: impl Into<String>, id: impl Into<String>, doc: Value) -> Self {
        BulkOp {
            action: BulkAction::Index,
            index: index.into(),
            id: id.into(),
            doc: Some(doc),
        }
    }

    /// Construct a delete operation
    pub fn delete(index: impl Into<String>, id: impl Into<String>) -> Self {
        BulkOp {
            action: BulkAction::Delete,
            index: index.into(),
            id: id.into(),
            doc: None,
        }
    }
}

/// Render the engine's wire shape: an action header line per op, followed
/// by the document body for index actions
pub fn to_request_body(ops: &[BulkOp]) -> Vec<Value> {
    let mut lines = Vec::with_capacity(ops.len() * 2);
    for op in ops {
        match op.action {
            BulkAction::Index => {
                lines.push(json!({"index": {"_index": op.index, "_id": op.id}}));
                lines.push(op.doc.clone().unwrap_or(Value::Null));
            }
            BulkAction::Delete => {
                lines.push(json!({"delete": {"_index": op.index, "_id": op.id}}));
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_op_renders_header_and_body() {
        let ops = vec![BulkOp::index("pages", "site/pages/foo", json!({"url": "u"}))];
        let lines = to_request_body(&ops);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], json!({"index": {"_index": "pages", "_id": "site/pages/foo"}}));
        assert_eq!(lines[1], json!({"url": "u"}));
    }

    #[test]
    fn test_delete_op_renders_header_only() {
        let ops = vec![BulkOp::delete("pages", "site/pages/foo")];
        let lines = to_request_body(&ops);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["delete"]["_id"], json!("site/pages/foo"));
    }

    #[test]
    fn test_mixed_ops_preserve_order() {
        let ops = vec![
            BulkOp::index("pages", "a", json!({})),
            BulkOp::delete("pages", "b"),
            BulkOp::index("pages", "c", json!({})),
        ];
        let lines = to_request_body(&ops);
        assert_eq!(lines.len(), 5);
        assert!(lines[2].get("delete").is_some());
    }
}
