//! Amphora - Content-management core for versioned JSON documents
//!
//! Amphora stores site content as JSON documents in a key-value store,
//! keyed by slash-delimited URIs with `@version` suffixes for published
//! and scheduled states. On top of the store it provides reference
//! composition (`_ref` placeholders resolved into full trees),
//! schema-version upgrades applied on read, cascading writes that split
//! embedded components into their own documents, and a search index
//! kept in sync with page traffic.
//!
//! # Quick Start
//!
//! ```ignore
//! use amphora::{
//!     ComponentRegistry, Documents, Limits, Locals, MemoryStore, SchemaRegistry,
//!     TransformRegistry,
//! };
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let docs = Documents::new(
//!     store,
//!     Arc::new(ComponentRegistry::new()),
//!     Arc::new(SchemaRegistry::new()),
//!     Arc::new(TransformRegistry::new()),
//!     Limits::default(),
//! );
//!
//! let locals = Locals::for_site("site.com");
//! docs.put("site.com/components/article/a", serde_json::json!({"title": "Hi"}), &locals)?;
//! let composed = docs.get_composed("site.com/components/article/a", &locals)?;
//! ```
//!
//! # Architecture
//!
//! The workspace splits along seams: `amphora-core` holds the URI
//! model, batch operations, and the [`KvStore`] trait; `amphora-storage`
//! provides the in-memory store; `amphora-engine` composes reads and
//! writes on top of any store; `amphora-search` mirrors page writes
//! into a search backend.

pub use amphora_core::batch::{BatchOperation, OpType};
pub use amphora_core::error::{AmphoraError, Result};
pub use amphora_core::limits::Limits;
pub use amphora_core::schema::{Locals, Schema};
pub use amphora_core::traits::{ComponentModule, KvStore, ListEntry, ListOptions, PutPlan};
pub use amphora_core::uri;
pub use amphora_engine::composer::Composer;
pub use amphora_engine::documents::Documents;
pub use amphora_engine::lists::Lists;
pub use amphora_engine::pages::Pages;
pub use amphora_engine::registry::{
    ComponentRegistry, SchemaRegistry, TransformRegistry, TransformSet,
};
pub use amphora_engine::resolver::resolve_data_references;
pub use amphora_engine::upgrade::UpgradeEngine;
pub use amphora_search::{
    register_backend, FieldType, IndexMapping, IndexMappings, MemorySearchBackend, PageListSync,
    SearchBackend, Site, SiteResolver, PAGES_INDEX,
};
pub use amphora_storage::MemoryStore;
