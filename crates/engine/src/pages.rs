//! Page helpers: prefix streaming and publish
//!
//! Sitemap generation and index backfill walk every page of a site; both
//! ride on `KvStore::list`, whose lexicographic ordering makes the output
//! deterministic and boundable. The stream is pull-driven, so a slow
//! consumer throttles the underlying store's read rate.

use crate::composer::Composer;
use amphora_core::{uri, KvStore, ListOptions, Locals, Result};
use serde_json::Value;
use std::sync::Arc;

/// Page-level operations over one site prefix
pub struct Pages {
    store: Arc<dyn KvStore>,
    composer: Arc<Composer>,
}

impl Pages {
    /// Create page helpers over a store and composer
    pub fn new(store: Arc<dyn KvStore>, composer: Arc<Composer>) -> Self {
        Pages { store, composer }
    }

    /// Stream page uris under a site prefix in lexicographic order
    ///
    /// `version` filters to exactly that suffix (`Some("published")` for the
    /// sitemap case); `None` yields only unversioned (latest/editable) keys.
    pub fn list_uris(
        &self,
        prefix: &str,
        version: Option<&str>,
    ) -> Result<Box<dyn Iterator<Item = String> + Send>> {
        let scan_prefix = format!("{}/{}/", prefix.trim_end_matches('/'), uri::PAGES);
        let stream = self.store.list(ListOptions::prefix(scan_prefix).keys_only())?;

        let wanted = version.map(str::to_string);
        Ok(Box::new(stream.filter_map(move |entry| {
            let key = entry.key?;
            (uri::version(&key) == wanted.as_deref()).then_some(key)
        })))
    }

    /// Publish a page: a cascading put at the `@published` version
    ///
    /// Nested component writes propagate the suffix, so the published page
    /// points at published components.
    pub fn publish(&self, page_uri: &str, data: Value, locals: &Locals) -> Result<Value> {
        let published = uri::replace_version(page_uri, Some(uri::PUBLISHED));
        self.composer.cascading_put(&published, data, locals)
    }
}
