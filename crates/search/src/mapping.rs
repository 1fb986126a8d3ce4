//! Index mappings and document normalization
//!
//! Each index declares a mapping: field name to field type. Before a
//! document is sent to the search backend it is normalized against the
//! mapping for its index: unmapped fields are dropped, reference
//! placeholders are flattened to their text content, dates are coerced
//! to RFC 3339, and fields that fail coercion are dropped with a
//! warning rather than failing the whole document.

use std::collections::BTreeMap;

use amphora_core::document::REF_KEY;
use amphora_core::traits::KvStore;
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Field type in an index mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Analyzed text
    Text,
    /// Exact-match string
    Keyword,
    /// RFC 3339 date, also accepted as epoch milliseconds
    Date,
    /// Boolean
    Boolean,
    /// Nested object, passed through after `_ref` stripping
    Object,
}

/// Mapping entry for one field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// The field's type
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldMapping {
    /// Shorthand constructor
    pub fn new(field_type: FieldType) -> Self {
        FieldMapping { field_type }
    }
}

/// Mapping for one index: property name to field mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexMapping {
    /// Field mappings keyed by property name
    pub properties: BTreeMap<String, FieldMapping>,
}

impl IndexMapping {
    /// Build a mapping from (name, type) pairs
    pub fn from_fields(fields: &[(&str, FieldType)]) -> Self {
        IndexMapping {
            properties: fields
                .iter()
                .map(|(name, ty)| ((*name).to_string(), FieldMapping::new(*ty)))
                .collect(),
        }
    }
}

/// All configured mappings, keyed by index name
pub type IndexMappings = BTreeMap<String, IndexMapping>;

/// Normalize a document against an index mapping.
///
/// Unmapped fields are dropped. Null values are omitted. A field that
/// cannot be coerced to its mapped type is dropped with a warning; the
/// rest of the document still indexes.
pub fn normalize_document(
    store: &dyn KvStore,
    mapping: &IndexMapping,
    doc: &Map<String, Value>,
) -> Map<String, Value> {
    let mut out = Map::new();
    for (name, field) in &mapping.properties {
        let Some(value) = doc.get(name) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        match normalize_field(store, field.field_type, value) {
            Some(v) => {
                out.insert(name.clone(), v);
            }
            None => {
                warn!(field = %name, "dropping field that failed normalization");
            }
        }
    }
    out
}

fn normalize_field(store: &dyn KvStore, field_type: FieldType, value: &Value) -> Option<Value> {
    match field_type {
        FieldType::Text | FieldType::Keyword => normalize_text(store, value),
        FieldType::Date => normalize_date(value),
        FieldType::Boolean => value.as_bool().map(Value::Bool),
        FieldType::Object => {
            let mut v = value.clone();
            strip_refs(&mut v);
            Some(v)
        }
    }
}

/// Text fields accept a plain string, or a reference placeholder whose
/// target is fetched and flattened to its first string-valued property.
/// A target with an `items` array flattens each item the same way and
/// joins the pieces with spaces.
fn normalize_text(store: &dyn KvStore, value: &Value) -> Option<Value> {
    if let Some(s) = value.as_str() {
        return Some(Value::String(s.to_string()));
    }
    let obj = value.as_object()?;
    let uri = obj.get(REF_KEY)?.as_str()?;
    let raw = store.get(uri).ok()?;
    let fetched: Value = serde_json::from_str(&raw).ok()?;
    flatten_to_text(&fetched).map(Value::String)
}

fn flatten_to_text(value: &Value) -> Option<String> {
    let obj = value.as_object()?;
    if let Some(items) = obj.get("items").and_then(Value::as_array) {
        let pieces: Vec<String> = items.iter().filter_map(flatten_to_text).collect();
        if pieces.is_empty() {
            return None;
        }
        return Some(pieces.join(" "));
    }
    obj.iter().find_map(|(k, v)| {
        if k == REF_KEY {
            return None;
        }
        v.as_str().map(ToString::to_string)
    })
}

fn normalize_date(value: &Value) -> Option<Value> {
    if let Some(s) = value.as_str() {
        let parsed = chrono::DateTime::parse_from_rfc3339(s).ok()?;
        return Some(Value::String(parsed.with_timezone(&Utc).to_rfc3339()));
    }
    let millis = value.as_i64()?;
    let dt = Utc.timestamp_millis_opt(millis).single()?;
    Some(Value::String(dt.to_rfc3339()))
}

/// Remove every `_ref` key from an object tree, in place.
pub fn strip_refs(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove(REF_KEY);
            for v in map.values_mut() {
                strip_refs(v);
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                strip_refs(v);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amphora_storage::MemoryStore;
    use serde_json::json;

    fn mapping() -> IndexMapping {
        IndexMapping::from_fields(&[
            ("title", FieldType::Text),
            ("site", FieldType::Keyword),
            ("published_at", FieldType::Date),
            ("published", FieldType::Boolean),
            ("meta", FieldType::Object),
        ])
    }

    fn doc(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_unmapped_fields_dropped() {
        let store = MemoryStore::new();
        let out = normalize_document(
            &store,
            &mapping(),
            &doc(json!({"title": "t", "junk": "x"})),
        );
        assert_eq!(out.get("title"), Some(&json!("t")));
        assert!(!out.contains_key("junk"));
    }

    #[test]
    fn test_null_values_omitted() {
        let store = MemoryStore::new();
        let out = normalize_document(&store, &mapping(), &doc(json!({"title": null})));
        assert!(out.is_empty());
    }

    #[test]
    fn test_text_ref_flattened_to_first_string() {
        let store = MemoryStore::new();
        store
            .put("site/components/head/a", r#"{"text":"Headline","size":"h1"}"#)
            .unwrap();
        let out = normalize_document(
            &store,
            &mapping(),
            &doc(json!({"title": {"_ref": "site/components/head/a"}})),
        );
        assert_eq!(out.get("title"), Some(&json!("Headline")));
    }

    #[test]
    fn test_text_ref_with_items_joined() {
        let store = MemoryStore::new();
        store
            .put(
                "site/components/body/a",
                r#"{"items":[{"text":"one"},{"text":"two"}]}"#,
            )
            .unwrap();
        let out = normalize_document(
            &store,
            &mapping(),
            &doc(json!({"title": {"_ref": "site/components/body/a"}})),
        );
        assert_eq!(out.get("title"), Some(&json!("one two")));
    }

    #[test]
    fn test_text_ref_missing_target_dropped() {
        let store = MemoryStore::new();
        let out = normalize_document(
            &store,
            &mapping(),
            &doc(json!({"title": {"_ref": "site/components/head/gone"}, "site": "s"})),
        );
        assert!(!out.contains_key("title"));
        assert_eq!(out.get("site"), Some(&json!("s")));
    }

    #[test]
    fn test_date_rfc3339_and_epoch_millis() {
        let store = MemoryStore::new();
        let out = normalize_document(
            &store,
            &mapping(),
            &doc(json!({"published_at": "2020-01-02T03:04:05Z"})),
        );
        assert_eq!(out.get("published_at"), Some(&json!("2020-01-02T03:04:05+00:00")));

        let out = normalize_document(
            &store,
            &mapping(),
            &doc(json!({"published_at": 1577934245000i64})),
        );
        assert_eq!(out.get("published_at"), Some(&json!("2020-01-02T03:04:05+00:00")));
    }

    #[test]
    fn test_bad_date_dropped() {
        let store = MemoryStore::new();
        let out = normalize_document(
            &store,
            &mapping(),
            &doc(json!({"published_at": "not a date"})),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_boolean_coercion() {
        let store = MemoryStore::new();
        let out = normalize_document(&store, &mapping(), &doc(json!({"published": true})));
        assert_eq!(out.get("published"), Some(&json!(true)));

        let out = normalize_document(&store, &mapping(), &doc(json!({"published": "yes"})));
        assert!(out.is_empty());
    }

    #[test]
    fn test_object_strips_refs_recursively() {
        let store = MemoryStore::new();
        let out = normalize_document(
            &store,
            &mapping(),
            &doc(json!({"meta": {"_ref": "x", "inner": {"_ref": "y", "keep": 1}}})),
        );
        assert_eq!(out.get("meta"), Some(&json!({"inner": {"keep": 1}})));
    }
}
