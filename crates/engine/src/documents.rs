//! Documents facade
//!
//! The operation surface the HTTP layer calls. Holds explicit handles to
//! the store and registries — no ambient globals — and wires the upgrade
//! engine, composer, and resolver together:
//!
//! - `get`: raw fetch with upgrade-on-read (reading can write; see
//!   [`crate::upgrade`])
//! - `get_composed`: fetch + upgrade + exhaustive reference resolution
//! - `put`: cascading put through the composer
//! - `del`: delete, echoing the removed document
//!
//! Component modules with custom `get`/`del` capabilities are dispatched
//! first, falling back to generic KV behavior.

use crate::composer::Composer;
use crate::registry::{ComponentRegistry, SchemaRegistry, TransformRegistry};
use crate::resolver::resolve_data_references;
use crate::upgrade::UpgradeEngine;
use amphora_core::{parse_document, uri, KvStore, Limits, Locals, Result};
use serde_json::Value;
use std::sync::Arc;

/// High-level document operations over one store
pub struct Documents {
    store: Arc<dyn KvStore>,
    modules: Arc<ComponentRegistry>,
    upgrades: UpgradeEngine,
    composer: Arc<Composer>,
    limits: Limits,
}

impl Documents {
    /// Wire a facade from a store and the externally loaded registries
    pub fn new(
        store: Arc<dyn KvStore>,
        modules: Arc<ComponentRegistry>,
        schemas: Arc<SchemaRegistry>,
        transforms: Arc<TransformRegistry>,
        limits: Limits,
    ) -> Self {
        let upgrades = UpgradeEngine::new(Arc::clone(&store), schemas, transforms);
        let composer = Arc::new(Composer::new(Arc::clone(&store), Arc::clone(&modules)));
        Documents {
            store,
            modules,
            upgrades,
            composer,
            limits,
        }
    }

    /// The composer, for wiring committed-batch subscribers
    pub fn composer(&self) -> &Arc<Composer> {
        &self.composer
    }

    /// Fetch a document, upgrading it on read when its schema moved on
    ///
    /// Note that a read can therefore write: the upgraded form is persisted
    /// before it is returned.
    pub fn get(&self, target: &str, locals: &Locals) -> Result<Value> {
        let data = match self.module_get(target, locals) {
            Some(result) => result?,
            None => parse_document(&self.store.get(target)?)?,
        };
        let outcome = self.upgrades.check_for_upgrade(target, data, locals)?;
        Ok(outcome.data)
    }

    /// Fetch a document and resolve every `_ref` into one composed object
    pub fn get_composed(&self, target: &str, locals: &Locals) -> Result<Value> {
        let data = self.get(target, locals)?;
        resolve_data_references(&*self.store, data, &self.limits)
    }

    /// Write a document, cascading nested component writes atomically
    pub fn put(&self, target: &str, data: Value, locals: &Locals) -> Result<Value> {
        self.composer.cascading_put(target, data, locals)
    }

    /// Delete a document, returning what was stored
    ///
    /// A component module with a custom `del` takes over entirely;
    /// otherwise the previous value is fetched (upgrade included) and the
    /// key removed.
    pub fn del(&self, target: &str, locals: &Locals) -> Result<Value> {
        if let Some(component) = uri::component(target) {
            if let Some(result) = self.modules.resolve(component).del(target, locals) {
                return result;
            }
        }
        let previous = self.get(target, locals)?;
        self.store.del(target)?;
        Ok(previous)
    }

    fn module_get(&self, target: &str, locals: &Locals) -> Option<Result<Value>> {
        let component = uri::component(target)?;
        self.modules.resolve(component).get(target, locals)
    }
}
