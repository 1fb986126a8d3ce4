//! Search index sync for Amphora
//!
//! Provides the [`backend::SearchBackend`] seam, index mappings with
//! document normalization, site resolution, and the page list sync that
//! mirrors page writes into the `pages` index.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod bulk;
pub mod mapping;
pub mod page_list;
pub mod sites;

pub use backend::{register_backend, MemorySearchBackend, SearchBackend};
pub use bulk::{BulkAction, BulkOp};
pub use mapping::{FieldMapping, FieldType, IndexMapping, IndexMappings};
pub use page_list::{PageListSync, PAGES_INDEX};
pub use sites::{Site, SiteResolver};
