//! Document helpers
//!
//! A document is an arbitrary JSON value stored under a uri. Nested objects
//! may carry the reserved `_ref` property, a uri pointing at another
//! document to be spliced in by the reference resolver. The reserved
//! `_version` property records the highest upgrade-transform version already
//! applied to the instance.

use crate::error::Result;
use serde_json::Value;

/// Reserved property naming a referenced document's uri
pub const REF_KEY: &str = "_ref";

/// Reserved property recording the applied schema version
pub const VERSION_KEY: &str = "_version";

/// Parse a stored serialized document
pub fn parse_document(raw: &str) -> Result<Value> {
    Ok(serde_json::from_str(raw)?)
}

/// Serialize a document for storage
pub fn serialize_document(doc: &Value) -> Result<String> {
    Ok(serde_json::to_string(doc)?)
}

/// The `_ref` uri of an object value, if present and a string
pub fn ref_uri(value: &Value) -> Option<&str> {
    value.as_object()?.get(REF_KEY)?.as_str()
}

/// True if the value is an object bearing a `_ref` property
pub fn is_placeholder(value: &Value) -> bool {
    ref_uri(value).is_some()
}

/// The numeric `_version` of a document, if stamped
pub fn data_version(doc: &Value) -> Option<f64> {
    doc.as_object()?.get(VERSION_KEY)?.as_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_and_serialize_round_trip() {
        let doc = json!({"a": 1, "b": {"_ref": "site/components/x"}});
        let raw = serialize_document(&doc).unwrap();
        assert_eq!(parse_document(&raw).unwrap(), doc);
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(parse_document("{nope").is_err());
    }

    #[test]
    fn test_ref_uri_extraction() {
        let v = json!({"_ref": "site/components/a", "extra": 1});
        assert_eq!(ref_uri(&v), Some("site/components/a"));
        assert!(is_placeholder(&v));

        assert_eq!(ref_uri(&json!({"a": 1})), None);
        assert_eq!(ref_uri(&json!("not an object")), None);
        // A non-string _ref is not a placeholder
        assert_eq!(ref_uri(&json!({"_ref": 42})), None);
    }

    #[test]
    fn test_data_version() {
        assert_eq!(data_version(&json!({"_version": 1.5})), Some(1.5));
        assert_eq!(data_version(&json!({"_version": 2})), Some(2.0));
        assert_eq!(data_version(&json!({})), None);
    }
}
