//! Component, schema, and upgrade-transform registries
//!
//! Component modules, schemas, and transform sets are supplied externally
//! (discovered alongside each component's code by the bootstrap layer) and
//! registered here once at startup. Resolution is a cached map lookup, never
//! a per-call re-probe.

use amphora_core::{ComponentModule, Locals, Result, Schema};
use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Module used for any component type without a registered override
///
/// All capabilities take their trait defaults: puts hand the document to the
/// cascade, reads and deletes fall back to the KV store.
#[derive(Debug, Default)]
pub struct DefaultComponentModule;

impl ComponentModule for DefaultComponentModule {}

/// Registry of per-component-type modules
pub struct ComponentRegistry {
    modules: DashMap<String, Arc<dyn ComponentModule>>,
    fallback: Arc<dyn ComponentModule>,
}

impl ComponentRegistry {
    /// Create an empty registry; unknown types resolve to the default module
    pub fn new() -> Self {
        ComponentRegistry {
            modules: DashMap::new(),
            fallback: Arc::new(DefaultComponentModule),
        }
    }

    /// Register a module for a component type, replacing any previous one
    pub fn register(&self, component: impl Into<String>, module: Arc<dyn ComponentModule>) {
        self.modules.insert(component.into(), module);
    }

    /// Resolve the module for a component type
    ///
    /// Always succeeds: unknown types get the default module.
    pub fn resolve(&self, component: &str) -> Arc<dyn ComponentModule> {
        self.modules
            .get(component)
            .map(|entry| Arc::clone(entry.value()))
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry of per-component-type schemas
///
/// Schemas arrive as plain YAML-derived structures; only the declared
/// `_version` matters to the upgrade engine.
#[derive(Default)]
pub struct SchemaRegistry {
    schemas: DashMap<String, Schema>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        SchemaRegistry {
            schemas: DashMap::new(),
        }
    }

    /// Register the schema for a component type
    pub fn register(&self, component: impl Into<String>, schema: Schema) {
        self.schemas.insert(component.into(), schema);
    }

    /// Look up the schema for a component type
    pub fn resolve(&self, component: &str) -> Option<Schema> {
        self.schemas.get(component).map(|entry| entry.value().clone())
    }
}

/// A single upgrade transform: migrates stored data from one schema version
/// to the next, threading accumulated state
pub type TransformFn = dyn Fn(&str, Value, &Locals) -> Result<Value> + Send + Sync;

/// Ordered set of upgrade transforms for one component type, keyed by
/// version-number string (`"1.0"`, `"2"`)
///
/// Transform keys, parsed as floats and sorted ascending, define a strict
/// total order.
#[derive(Default, Clone)]
pub struct TransformSet {
    transforms: BTreeMap<String, Arc<TransformFn>>,
}

impl TransformSet {
    /// Create an empty set
    pub fn new() -> Self {
        TransformSet {
            transforms: BTreeMap::new(),
        }
    }

    /// Add a transform under a version key (builder style)
    pub fn with<F>(mut self, version: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&str, Value, &Locals) -> Result<Value> + Send + Sync + 'static,
    {
        self.transforms.insert(version.into(), Arc::new(transform));
        self
    }

    /// All registered version keys
    pub fn version_keys(&self) -> Vec<String> {
        self.transforms.keys().cloned().collect()
    }

    /// Look up the transform for a parsed version number
    ///
    /// Numeric parsing of a key like `"2"` loses a potential `"2.0"` form,
    /// so the lookup reconstructs the canonical key: the plain rendering
    /// first, then with `.0` appended when the rendering has no decimal
    /// point.
    pub fn lookup(&self, version: f64) -> Option<Arc<TransformFn>> {
        let plain = format!("{version}");
        if let Some(t) = self.transforms.get(&plain) {
            return Some(Arc::clone(t));
        }
        if !plain.contains('.') {
            let canonical = format!("{plain}.0");
            if let Some(t) = self.transforms.get(&canonical) {
                return Some(Arc::clone(t));
            }
        }
        None
    }

    /// True if no transforms are registered
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

/// Registry of transform sets, keyed by component type
#[derive(Default)]
pub struct TransformRegistry {
    sets: DashMap<String, Arc<TransformSet>>,
}

impl TransformRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        TransformRegistry {
            sets: DashMap::new(),
        }
    }

    /// Register the transform set for a component type
    pub fn register(&self, component: impl Into<String>, set: TransformSet) {
        self.sets.insert(component.into(), Arc::new(set));
    }

    /// Look up the transform set for a component type
    pub fn resolve(&self, component: &str) -> Option<Arc<TransformSet>> {
        self.sets.get(component).map(|entry| Arc::clone(entry.value()))
    }
}
