//! Cascading put / batch composer
//!
//! A root write (a page or component put) implies writes for every nested
//! component embedded in the payload. The composer invokes the component
//! module's put (or the default behavior), walks the resulting document to
//! split embedded components into their own operations, and submits the
//! whole list to the KV store as one atomic batch.
//!
//! Version suffixes: a `@published` root propagates `@published` onto every
//! split child (so a published page points at published components); draft
//! suffixes do not propagate. The suffix is otherwise opaque to default-put
//! and simply becomes part of the key.
//!
//! Producing zero operations is always a defect in a component module's put
//! logic and fails with an explicit error, never a silent no-op.
//!
//! After a successful commit the op list is handed to registered
//! subscribers (search-index sync among them). Delivery is fire-and-forget:
//! no put waits on a subscriber and subscriber panics are not the
//! composer's concern — subscribers catch their own failures and log them.

use crate::registry::ComponentRegistry;
use amphora_core::{
    parse_document, serialize_document, uri, AmphoraError, BatchOperation, KvStore, Locals,
    PutPlan, Result, REF_KEY,
};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Callback receiving every committed batch
pub type Subscriber = Arc<dyn Fn(&[BatchOperation]) + Send + Sync>;

/// Converts single-document writes into atomic multi-key batches
pub struct Composer {
    store: Arc<dyn KvStore>,
    modules: Arc<ComponentRegistry>,
    subscribers: RwLock<Vec<Subscriber>>,
}

impl Composer {
    /// Create a composer over a store and the component-module registry
    pub fn new(store: Arc<dyn KvStore>, modules: Arc<ComponentRegistry>) -> Self {
        Composer {
            store,
            modules,
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Register a committed-batch subscriber
    pub fn subscribe(&self, subscriber: Subscriber) {
        self.subscribers.write().push(subscriber);
    }

    /// Write a document, cascading into every nested component it embeds
    ///
    /// Returns the logical value of the root write so callers can echo it
    /// back.
    ///
    /// # Errors
    ///
    /// `EmptyBatch` if the put produced zero operations; `Validation` if
    /// any produced operation is malformed (nothing is applied).
    pub fn cascading_put(&self, uri: &str, data: Value, locals: &Locals) -> Result<Value> {
        let ops = self.get_put_operations(uri, data, locals)?;
        if ops.is_empty() {
            return Err(AmphoraError::EmptyBatch(uri.to_string()));
        }

        self.store.batch(ops.clone())?;
        debug!(%uri, ops = ops.len(), "committed cascading put");

        for subscriber in self.subscribers.read().iter() {
            subscriber(&ops);
        }

        root_value(&ops, uri)
    }

    /// Collect every batch operation implied by a put
    ///
    /// The component module runs first; when it hands back a document
    /// (the default), embedded components are split out recursively.
    fn get_put_operations(
        &self,
        uri: &str,
        data: Value,
        locals: &Locals,
    ) -> Result<Vec<BatchOperation>> {
        let plan = match uri::component(uri) {
            Some(component) => self.modules.resolve(component).put(uri, data, locals)?,
            // Pages, lists, and users have no component module; the default
            // cascade applies directly.
            None => PutPlan::Document(data),
        };

        match plan {
            PutPlan::Ops(ops) => Ok(ops),
            PutPlan::Document(doc) => split_cascading_data(uri, doc),
        }
    }
}

/// Split embedded components out of a document
///
/// Any nested object carrying `_ref` plus other fields becomes its own put
/// operation; the parent keeps a bare `{_ref}` placeholder. Children are
/// emitted before their parent, the root operation last.
fn split_cascading_data(uri: &str, mut data: Value) -> Result<Vec<BatchOperation>> {
    let publish = uri::is_published(uri);
    let mut ops = Vec::new();
    split_children(&mut data, publish, &mut ops)?;
    ops.push(BatchOperation::put(uri, serialize_document(&data)?));
    Ok(ops)
}

fn split_children(value: &mut Value, publish: bool, ops: &mut Vec<BatchOperation>) -> Result<()> {
    match value {
        Value::Object(map) => {
            for (_key, child) in map.iter_mut() {
                split_child(child, publish, ops)?;
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                split_child(item, publish, ops)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn split_child(value: &mut Value, publish: bool, ops: &mut Vec<BatchOperation>) -> Result<()> {
    // An embedded component is an object carrying a string _ref plus data.
    let ref_uri = match value.as_object() {
        Some(map) if map.len() > 1 => map.get(REF_KEY).and_then(Value::as_str).map(str::to_string),
        _ => None,
    };
    let Some(ref_uri) = ref_uri else {
        // No data to split at this level; keep walking.
        return split_children(value, publish, ops);
    };
    let Some(map) = value.as_object_mut() else {
        return Ok(());
    };

    let mut child_map = std::mem::take(map);
    child_map.remove(REF_KEY);
    let child_key = if publish {
        uri::replace_version(&ref_uri, Some(uri::PUBLISHED))
    } else {
        ref_uri
    };

    let mut child_data = Value::Object(child_map);
    split_children(&mut child_data, publish, ops)?;
    ops.push(BatchOperation::put(
        child_key.clone(),
        serialize_document(&child_data)?,
    ));

    map.insert(REF_KEY.to_string(), Value::String(child_key));
    Ok(())
}

/// Extract the logical value of the root write from a committed batch
///
/// Matches the op whose key equals the target uri, falling back to a
/// version-suffix-insensitive match.
fn root_value(ops: &[BatchOperation], uri: &str) -> Result<Value> {
    let root = ops
        .iter()
        .find(|op| op.key == uri)
        .or_else(|| {
            ops.iter()
                .find(|op| uri::strip_version(&op.key) == uri::strip_version(uri))
        })
        .ok_or_else(|| AmphoraError::storage(format!("batch contains no operation for {uri}")))?;

    let raw = root
        .value
        .as_deref()
        .ok_or_else(|| AmphoraError::storage(format!("root operation for {uri} has no value")))?;
    parse_document(raw)
}
