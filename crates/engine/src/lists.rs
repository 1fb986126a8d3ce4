//! List store helpers
//!
//! Lists are JSON-array documents under the `lists/` namespace: shared
//! collections (author lists, tag vocabularies) that many pages reference.
//! They live in the same KV store as everything else; these helpers add the
//! array-shaped contract and the patch operation the editing UI uses.

use amphora_core::{AmphoraError, KvStore, Result};
use serde_json::Value;
use std::sync::Arc;

/// Array-document operations over the lists namespace
pub struct Lists {
    store: Arc<dyn KvStore>,
}

impl Lists {
    /// Create list helpers over a store
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Lists { store }
    }

    /// Fetch a list document
    ///
    /// # Errors
    ///
    /// `NotFound` if absent; `Storage` if the stored document is not an
    /// array.
    pub fn get(&self, uri: &str) -> Result<Vec<Value>> {
        let raw = self.store.get(uri)?;
        let parsed: Value = serde_json::from_str(&raw)?;
        match parsed {
            Value::Array(items) => Ok(items),
            _ => Err(AmphoraError::storage(format!(
                "list document {uri} is not an array"
            ))),
        }
    }

    /// Replace a list document wholesale
    pub fn put(&self, uri: &str, items: Vec<Value>) -> Result<()> {
        let serialized = serde_json::to_string(&Value::Array(items))?;
        self.store.put(uri, &serialized)
    }

    /// Remove and append entries in one step, returning the final list
    ///
    /// Removals are applied first. Appended entries already present are
    /// skipped, so patching is idempotent. A missing list starts empty.
    pub fn patch(&self, uri: &str, additions: &[Value], removals: &[Value]) -> Result<Vec<Value>> {
        let mut items = match self.get(uri) {
            Ok(items) => items,
            Err(err) if err.is_not_found() => Vec::new(),
            Err(err) => return Err(err),
        };

        items.retain(|item| !removals.contains(item));
        for addition in additions {
            if !items.contains(addition) {
                items.push(addition.clone());
            }
        }

        self.put(uri, items.clone())?;
        Ok(items)
    }
}
