//! Search backend seam
//!
//! The content core talks to search through [`SearchBackend`]. The
//! in-memory implementation backs tests and small deployments; a real
//! engine plugs in behind the same trait. [`register_backend`] is the
//! startup gate: it verifies the mapping set and the backend's health
//! before the rest of the system wires index sync to write traffic.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use amphora_core::error::{AmphoraError, Result};
use dashmap::DashMap;
use serde_json::{Map, Value};
use tracing::info;

use crate::bulk::{BulkAction, BulkOp};
use crate::mapping::IndexMappings;

/// A pluggable search engine
pub trait SearchBackend: Send + Sync {
    /// Liveness check
    fn ping(&self) -> Result<()>;

    /// Apply a batch of index/delete operations in one call
    fn bulk(&self, ops: &[BulkOp]) -> Result<()>;

    /// Return the documents in an index whose fields all equal the
    /// given filter values
    fn search(&self, index: &str, filter: &Map<String, Value>) -> Result<Vec<Value>>;

    /// Whether a document exists
    fn exists_document(&self, index: &str, id: &str) -> Result<bool>;

    /// Fetch a document by id
    fn get_document(&self, index: &str, id: &str) -> Result<Value>;

    /// Merge fields into an existing document
    fn update_document(&self, index: &str, id: &str, fields: &Map<String, Value>) -> Result<()>;
}

/// In-memory search backend
#[derive(Debug, Default)]
pub struct MemorySearchBackend {
    indices: DashMap<String, BTreeMap<String, Value>>,
    bulk_calls: AtomicUsize,
}

impl MemorySearchBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bulk calls received so far
    pub fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }

    /// Number of documents in an index
    pub fn index_len(&self, index: &str) -> usize {
        self.indices.get(index).map(|ix| ix.len()).unwrap_or(0)
    }
}

impl SearchBackend for MemorySearchBackend {
    fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn bulk(&self, ops: &[BulkOp]) -> Result<()> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        for op in ops {
            let mut index = self.indices.entry(op.index.clone()).or_default();
            match op.action {
                BulkAction::Index => {
                    let doc = op.doc.clone().unwrap_or(Value::Null);
                    index.insert(op.id.clone(), doc);
                }
                BulkAction::Delete => {
                    index.remove(&op.id);
                }
            }
        }
        Ok(())
    }

    fn search(&self, index: &str, filter: &Map<String, Value>) -> Result<Vec<Value>> {
        let Some(ix) = self.indices.get(index) else {
            return Ok(Vec::new());
        };
        Ok(ix
            .values()
            .filter(|doc| {
                filter
                    .iter()
                    .all(|(k, v)| doc.get(k) == Some(v))
            })
            .cloned()
            .collect())
    }

    fn exists_document(&self, index: &str, id: &str) -> Result<bool> {
        Ok(self
            .indices
            .get(index)
            .map(|ix| ix.contains_key(id))
            .unwrap_or(false))
    }

    fn get_document(&self, index: &str, id: &str) -> Result<Value> {
        self.indices
            .get(index)
            .and_then(|ix| ix.get(id).cloned())
            .ok_or_else(|| AmphoraError::not_found(format!("{index}/{id}")))
    }

    fn update_document(&self, index: &str, id: &str, fields: &Map<String, Value>) -> Result<()> {
        let mut ix = self
            .indices
            .get_mut(index)
            .ok_or_else(|| AmphoraError::not_found(index))?;
        let doc = ix
            .get_mut(id)
            .ok_or_else(|| AmphoraError::not_found(format!("{index}/{id}")))?;
        if let Some(map) = doc.as_object_mut() {
            for (k, v) in fields {
                map.insert(k.clone(), v.clone());
            }
        }
        Ok(())
    }
}

/// Validate mappings and backend health at startup.
///
/// Fails fast: an empty mapping set, an index with no properties, or an
/// unreachable backend all abort registration.
pub fn register_backend(backend: &dyn SearchBackend, mappings: &IndexMappings) -> Result<()> {
    if mappings.is_empty() {
        return Err(AmphoraError::StorageContract(
            "search backend registered with no index mappings".to_string(),
        ));
    }
    for (index, mapping) in mappings {
        if mapping.properties.is_empty() {
            return Err(AmphoraError::StorageContract(format!(
                "index mapping for {index} has no properties"
            )));
        }
    }
    backend
        .ping()
        .map_err(|e| AmphoraError::StorageContract(format!("search backend unreachable: {e}")))?;
    info!(indices = mappings.len(), "search backend registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{FieldType, IndexMapping};
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_bulk_index_and_delete() {
        let backend = MemorySearchBackend::new();
        backend
            .bulk(&[
                BulkOp::index("pages", "a", json!({"url": "u"})),
                BulkOp::index("pages", "b", json!({"url": "v"})),
            ])
            .unwrap();
        assert_eq!(backend.index_len("pages"), 2);
        assert_eq!(backend.bulk_calls(), 1);

        backend.bulk(&[BulkOp::delete("pages", "a")]).unwrap();
        assert_eq!(backend.index_len("pages"), 1);
        assert!(!backend.exists_document("pages", "a").unwrap());
    }

    #[test]
    fn test_search_filters_on_field_equality() {
        let backend = MemorySearchBackend::new();
        backend
            .bulk(&[
                BulkOp::index("pages", "a", json!({"site": "s1", "published": true})),
                BulkOp::index("pages", "b", json!({"site": "s1", "published": false})),
                BulkOp::index("pages", "c", json!({"site": "s2", "published": true})),
            ])
            .unwrap();
        let hits = backend
            .search("pages", &obj(json!({"site": "s1", "published": true})))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["site"], json!("s1"));
    }

    #[test]
    fn test_update_document_merges_fields() {
        let backend = MemorySearchBackend::new();
        backend
            .bulk(&[BulkOp::index("pages", "a", json!({"url": "u"}))])
            .unwrap();
        backend
            .update_document("pages", "a", &obj(json!({"published": true})))
            .unwrap();
        let doc = backend.get_document("pages", "a").unwrap();
        assert_eq!(doc, json!({"url": "u", "published": true}));
    }

    #[test]
    fn test_get_missing_document_is_not_found() {
        let backend = MemorySearchBackend::new();
        let err = backend.get_document("pages", "nope").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_register_rejects_empty_mappings() {
        let backend = MemorySearchBackend::new();
        let err = register_backend(&backend, &IndexMappings::new()).unwrap_err();
        assert!(matches!(err, AmphoraError::StorageContract(_)));
    }

    #[test]
    fn test_register_rejects_propertyless_index() {
        let backend = MemorySearchBackend::new();
        let mut mappings = IndexMappings::new();
        mappings.insert("pages".to_string(), IndexMapping::default());
        let err = register_backend(&backend, &mappings).unwrap_err();
        assert!(matches!(err, AmphoraError::StorageContract(_)));
    }

    #[test]
    fn test_register_accepts_valid_mappings() {
        let backend = MemorySearchBackend::new();
        let mut mappings = IndexMappings::new();
        mappings.insert(
            "pages".to_string(),
            IndexMapping::from_fields(&[("url", FieldType::Keyword)]),
        );
        register_backend(&backend, &mappings).unwrap();
    }

    #[test]
    fn test_backend_is_object_safe() {
        fn takes_dyn(_: &dyn SearchBackend) {}
        takes_dyn(&MemorySearchBackend::new());
    }
}
