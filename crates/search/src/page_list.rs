//! Page list index sync
//!
//! Keeps the `pages` index in step with write traffic. Subscribed to
//! the composer's batch stream, it picks the page operations out of
//! each batch, shapes an index document per page, and submits them all
//! in one bulk call. Per-page failures are logged and skipped so one
//! bad document never blocks the rest of the batch.

use std::sync::Arc;

use amphora_core::batch::{BatchOperation, OpType};
use amphora_core::error::Result;
use amphora_core::traits::KvStore;
use amphora_core::uri;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::backend::SearchBackend;
use crate::bulk::BulkOp;
use crate::mapping::{normalize_document, IndexMappings};
use crate::sites::SiteResolver;

/// Name of the page list index
pub const PAGES_INDEX: &str = "pages";

/// Subscriber callback shape accepted by the composer
pub type Subscriber = Arc<dyn Fn(&[BatchOperation]) + Send + Sync>;

/// Syncs page writes into the page list index
pub struct PageListSync {
    store: Arc<dyn KvStore>,
    backend: Arc<dyn SearchBackend>,
    mappings: IndexMappings,
    sites: SiteResolver,
}

impl PageListSync {
    /// Create a sync over a store, a backend, the configured mappings,
    /// and the site set
    pub fn new(
        store: Arc<dyn KvStore>,
        backend: Arc<dyn SearchBackend>,
        mappings: IndexMappings,
        sites: SiteResolver,
    ) -> Self {
        PageListSync {
            store,
            backend,
            mappings,
            sites,
        }
    }

    /// Shape and submit index documents for the page puts in a batch.
    ///
    /// Non-page operations and deletes are ignored. Pages that fail to
    /// parse or whose site cannot be resolved are skipped with a
    /// warning. All surviving documents go to the backend in a single
    /// bulk call; an empty result set submits nothing.
    pub fn update_page_list(&self, ops: &[BatchOperation]) -> Result<()> {
        let mut bulk = Vec::new();
        for op in ops {
            if op.op_type != OpType::Put || !uri::is_page(&op.key) {
                continue;
            }
            match self.page_document(op) {
                Some(doc) => {
                    let id = uri::strip_version(&op.key).to_string();
                    bulk.push(BulkOp::index(PAGES_INDEX, id, Value::Object(doc)));
                }
                None => {
                    warn!(key = %op.key, "skipping page that failed to index");
                }
            }
        }
        if bulk.is_empty() {
            return Ok(());
        }
        debug!(pages = bulk.len(), "updating page list index");
        self.backend.bulk(&bulk)
    }

    fn page_document(&self, op: &BatchOperation) -> Option<Map<String, Value>> {
        let raw = op.value.as_deref()?;
        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                warn!(key = %op.key, error = %e, "page value is not valid JSON");
                return None;
            }
        };
        let page = value.as_object()?;

        let prefix = uri::page_prefix(&op.key).unwrap_or_default();
        let Some(site) = self.sites.resolve(prefix) else {
            warn!(key = %op.key, prefix = %prefix, "no site matches page prefix");
            return None;
        };

        let mut doc = Map::new();
        doc.insert(
            "uri".to_string(),
            Value::String(uri::strip_version(&op.key).to_string()),
        );
        doc.insert(
            "published".to_string(),
            Value::Bool(uri::is_published(&op.key)),
        );
        doc.insert(
            "scheduled".to_string(),
            Value::Bool(uri::is_scheduled(&op.key)),
        );
        doc.insert(
            "url".to_string(),
            page.get("url").cloned().unwrap_or(Value::String(String::new())),
        );
        doc.insert("site".to_string(), Value::String(site.slug.clone()));
        for (k, v) in page {
            if !doc.contains_key(k) {
                doc.insert(k.clone(), v.clone());
            }
        }

        let mapping = self.mappings.get(PAGES_INDEX)?;
        Some(normalize_document(self.store.as_ref(), mapping, &doc))
    }

    /// Wrap the sync in a composer subscriber that logs failures
    pub fn subscriber(self: Arc<Self>) -> Subscriber {
        Arc::new(move |ops| {
            if let Err(e) = self.update_page_list(ops) {
                error!(error = %e, "page list index update failed");
            }
        })
    }
}
