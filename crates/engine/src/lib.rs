//! Composition engine for Amphora
//!
//! This crate orchestrates the content core over the `KvStore` seam:
//! - Reference resolver: exhaustive recursive `_ref` composition
//! - Upgrade engine: version-ordered transform chains with persist-on-read
//! - Composer: cascading put turning one write into an atomic batch
//! - Documents: the facade the HTTP layer calls (get/get_composed/put/del)
//! - Registries: component modules, schemas, and upgrade transforms,
//!   resolved once per component type and cached
//! - Lists and Pages: the collection-store and prefix-scan helpers
//!
//! The engine is the only layer that knows how the pieces fit: storage
//! below it, component modules beside it, index sync subscribed to it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod composer;
pub mod documents;
pub mod lists;
pub mod pages;
pub mod registry;
pub mod resolver;
pub mod upgrade;

pub use composer::{Composer, Subscriber};
pub use documents::Documents;
pub use lists::Lists;
pub use pages::Pages;
pub use registry::{
    ComponentRegistry, DefaultComponentModule, SchemaRegistry, TransformFn, TransformRegistry,
    TransformSet,
};
pub use resolver::resolve_data_references;
pub use upgrade::{aggregate_transforms, UpgradeEngine, Upgraded};
