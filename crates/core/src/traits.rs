//! Core traits: the storage seam and the component-module seam
//!
//! `KvStore` is the swappable storage boundary: an embedded ordered store in
//! tests and small deployments, a networked store in production, replaceable
//! wholesale behind this exact interface. Callers may not depend on any
//! backend-specific error kind beyond `NotFound`.
//!
//! `ComponentModule` is the per-component-type capability set. Methods are
//! explicitly optional — defaults fall back to generic KV behavior — and a
//! module is resolved once per component type and cached, never re-probed
//! per call.

use crate::batch::BatchOperation;
use crate::error::Result;
use crate::schema::Locals;
use serde_json::Value;

/// Options for a prefix-scan list call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    /// Key prefix to scan
    pub prefix: String,
    /// Include keys in the yielded entries
    pub keys: bool,
    /// Include values in the yielded entries
    pub values: bool,
    /// Stop after this many entries
    pub limit: Option<usize>,
}

impl ListOptions {
    /// Scan a prefix, yielding both keys and values
    pub fn prefix(prefix: impl Into<String>) -> Self {
        ListOptions {
            prefix: prefix.into(),
            keys: true,
            values: true,
            limit: None,
        }
    }

    /// Yield keys only
    pub fn keys_only(mut self) -> Self {
        self.keys = true;
        self.values = false;
        self
    }

    /// Yield values only
    pub fn values_only(mut self) -> Self {
        self.keys = false;
        self.values = true;
        self
    }

    /// Cap the number of yielded entries
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One entry yielded by a list scan
///
/// Fields are present according to the `keys`/`values` toggles of the
/// originating [`ListOptions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// Key, when requested
    pub key: Option<String>,
    /// Serialized value, when requested
    pub value: Option<String>,
}

/// Lazy, pull-driven scan sequence
///
/// Restartable per call (issue `list` again), not restartable mid-stream.
/// Entries arrive in lexicographic key order; prefix-scan consumers
/// (sitemap generation among them) rely on that for deterministic,
/// boundable-length output.
pub type ListStream = Box<dyn Iterator<Item = ListEntry> + Send>;

/// Uniform get/put/del/batch/list interface over a pluggable backend
///
/// Values are serialized JSON strings. `batch` is the only atomicity unit:
/// all operations succeed or none are visibly applied. There is no
/// cross-batch transaction and no CAS; concurrent writers to the same key
/// race at the backend's own consistency level, last write wins.
pub trait KvStore: Send + Sync {
    /// Fetch the serialized value under a key
    ///
    /// # Errors
    ///
    /// `NotFound` if the key is absent; `Storage` for backend failures.
    fn get(&self, key: &str) -> Result<String>;

    /// Write a serialized value under a key
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key (absent keys are not an error)
    fn del(&self, key: &str) -> Result<()>;

    /// Apply a set of operations atomically
    ///
    /// Operations are validated before anything is attempted; a validation
    /// failure reports every violation and applies nothing.
    fn batch(&self, ops: Vec<BatchOperation>) -> Result<()>;

    /// Stream entries under a prefix in lexicographic key order
    fn list(&self, options: ListOptions) -> Result<ListStream>;
}

/// What a component module's put wants done with a document
#[derive(Debug, Clone, PartialEq)]
pub enum PutPlan {
    /// Hand the (possibly rewritten) document back to the default cascade:
    /// nested components are split out and the rest becomes a single put
    Document(Value),
    /// The module took full control and produced the batch itself
    Ops(Vec<BatchOperation>),
}

/// Per-component-type capability set
///
/// Every method has a fallback default, so a module only implements what it
/// customizes. `get`/`del` return `None` to mean "no opinion, use the KV
/// default"; `put` defaults to handing the document to the cascade.
pub trait ComponentModule: Send + Sync {
    /// Produce the write plan for a document
    fn put(&self, uri: &str, data: Value, locals: &Locals) -> Result<PutPlan> {
        let _ = (uri, locals);
        Ok(PutPlan::Document(data))
    }

    /// Custom read, or `None` to fall back to the KV store
    fn get(&self, uri: &str, locals: &Locals) -> Option<Result<Value>> {
        let _ = (uri, locals);
        None
    }

    /// Custom delete, or `None` to fall back to the KV store
    fn del(&self, uri: &str, locals: &Locals) -> Option<Result<Value>> {
        let _ = (uri, locals);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AmphoraError;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::RwLock;

    // ====================================================================
    // Minimal mock implementations for behavioral testing
    // ====================================================================

    /// A minimal in-memory KvStore for testing the trait contract.
    struct MockStore {
        data: RwLock<BTreeMap<String, String>>,
    }

    impl MockStore {
        fn new() -> Self {
            MockStore {
                data: RwLock::new(BTreeMap::new()),
            }
        }
    }

    impl KvStore for MockStore {
        fn get(&self, key: &str) -> Result<String> {
            let data = self.data.read().unwrap();
            data.get(key)
                .cloned()
                .ok_or_else(|| AmphoraError::not_found(key))
        }

        fn put(&self, key: &str, value: &str) -> Result<()> {
            let mut data = self.data.write().unwrap();
            data.insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn del(&self, key: &str) -> Result<()> {
            let mut data = self.data.write().unwrap();
            data.remove(key);
            Ok(())
        }

        fn batch(&self, ops: Vec<BatchOperation>) -> Result<()> {
            crate::batch::assert_valid_batch_ops(&ops)?;
            let mut data = self.data.write().unwrap();
            for op in ops {
                match op.op_type {
                    crate::batch::OpType::Put => {
                        data.insert(op.key, op.value.unwrap_or_default());
                    }
                    crate::batch::OpType::Del => {
                        data.remove(&op.key);
                    }
                }
            }
            Ok(())
        }

        fn list(&self, options: ListOptions) -> Result<ListStream> {
            let data = self.data.read().unwrap();
            let entries: Vec<ListEntry> = data
                .range(options.prefix.clone()..)
                .take_while(|(k, _)| k.starts_with(&options.prefix))
                .take(options.limit.unwrap_or(usize::MAX))
                .map(|(k, v)| ListEntry {
                    key: options.keys.then(|| k.clone()),
                    value: options.values.then(|| v.clone()),
                })
                .collect();
            Ok(Box::new(entries.into_iter()))
        }
    }

    // ====================================================================
    // Compile-time contract tests (object safety, Send+Sync)
    // ====================================================================

    #[test]
    fn kv_store_is_object_safe_and_send_sync() {
        fn accepts_store(_: &dyn KvStore) {}
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        let _ = accepts_store as fn(&dyn KvStore);
        assert_send::<Box<dyn KvStore>>();
        assert_sync::<Box<dyn KvStore>>();
    }

    #[test]
    fn component_module_is_object_safe() {
        struct Noop;
        impl ComponentModule for Noop {}
        fn accepts_module(_: &dyn ComponentModule) {}
        accepts_module(&Noop);
    }

    // ====================================================================
    // KvStore behavioral tests
    // ====================================================================

    #[test]
    fn store_get_missing_is_not_found() {
        let store = MockStore::new();
        let err = store.get("nope").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn store_put_then_get_round_trips() {
        let store = MockStore::new();
        store.put("a/components/x", "{\"n\":1}").unwrap();
        assert_eq!(store.get("a/components/x").unwrap(), "{\"n\":1}");
    }

    #[test]
    fn store_del_is_lenient() {
        let store = MockStore::new();
        assert!(store.del("never-existed").is_ok());
    }

    #[test]
    fn store_list_is_lexicographic() {
        let store = MockStore::new();
        store.put("p/pages/b", "2").unwrap();
        store.put("p/pages/a", "1").unwrap();
        store.put("q/pages/z", "3").unwrap();

        let keys: Vec<String> = store
            .list(ListOptions::prefix("p/pages/").keys_only())
            .unwrap()
            .filter_map(|e| e.key)
            .collect();
        assert_eq!(keys, vec!["p/pages/a", "p/pages/b"]);
    }

    #[test]
    fn store_batch_validation_applies_nothing() {
        let store = MockStore::new();
        let ops = vec![
            BatchOperation::put("good", "{}"),
            BatchOperation {
                op_type: crate::batch::OpType::Put,
                key: "bad".to_string(),
                value: None,
            },
        ];
        assert!(store.batch(ops).is_err());
        assert!(store.get("good").unwrap_err().is_not_found());
    }

    // ====================================================================
    // ComponentModule defaults
    // ====================================================================

    #[test]
    fn default_module_put_hands_document_to_cascade() {
        struct Plain;
        impl ComponentModule for Plain {}

        let data = json!({"title": "hi"});
        let plan = Plain.put("p/components/c", data.clone(), &Locals::default()).unwrap();
        assert_eq!(plan, PutPlan::Document(data));
    }

    #[test]
    fn default_module_get_and_del_have_no_opinion() {
        struct Plain;
        impl ComponentModule for Plain {}

        assert!(Plain.get("p/components/c", &Locals::default()).is_none());
        assert!(Plain.del("p/components/c", &Locals::default()).is_none());
    }

    #[test]
    fn module_can_take_full_control_of_put() {
        struct Custom;
        impl ComponentModule for Custom {
            fn put(&self, uri: &str, _data: Value, _locals: &Locals) -> Result<PutPlan> {
                Ok(PutPlan::Ops(vec![BatchOperation::put(uri, "{}")]))
            }
        }

        let plan = Custom
            .put("p/components/c", json!({}), &Locals::default())
            .unwrap();
        match plan {
            PutPlan::Ops(ops) => assert_eq!(ops.len(), 1),
            other => panic!("expected ops, got {other:?}"),
        }
    }
}
