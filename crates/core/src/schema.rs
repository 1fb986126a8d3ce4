//! Component schemas and request-scoped locals
//!
//! A schema is a per-component-type structure (one per type, not per
//! instance), YAML-derived and loaded externally, then handed to the core
//! as a plain structure. The core only reads its declared `_version`, which
//! decides the upgrade-transform range applied to stored instances of the
//! type.

use crate::document::VERSION_KEY;
use serde_json::{Map, Value};

/// Per-component-type schema
///
/// `version` is the declared `_version`; `fields` carries everything else
/// (field descriptors like `{_type, _required, ...}`), opaque to this core.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    /// Declared schema version, if any
    pub version: Option<f64>,
    /// Remaining schema fields, untouched by the core
    pub fields: Map<String, Value>,
}

impl Schema {
    /// Build a schema from a plain JSON structure (the YAML-derived form)
    ///
    /// A `_version` key, if present and numeric, becomes the declared
    /// version; every other key lands in `fields` unchanged.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Schema::default();
        };
        let version = map.remove(VERSION_KEY).and_then(|v| v.as_f64());
        Schema {
            version,
            fields: map,
        }
    }

    /// Schema with only a declared version (test and bootstrap convenience)
    pub fn with_version(version: f64) -> Self {
        Schema {
            version: Some(version),
            fields: Map::new(),
        }
    }
}

/// Request-scoped context threaded through component operations
///
/// The HTTP layer populates this per request; component modules and upgrade
/// transforms receive it read-only.
#[derive(Debug, Clone, Default)]
pub struct Locals {
    /// Slug of the site the request addresses, if resolved
    pub site: Option<String>,
    /// Authenticated user identifier, if any
    pub user: Option<String>,
    /// Anything else the outer layers want to pass along
    pub extra: Map<String, Value>,
}

impl Locals {
    /// Locals scoped to a site
    pub fn for_site(slug: impl Into<String>) -> Self {
        Locals {
            site: Some(slug.into()),
            ..Locals::default()
        }
    }
}
