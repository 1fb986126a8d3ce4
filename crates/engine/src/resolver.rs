//! Reference resolver
//!
//! Walks an arbitrary JSON document, finds every object bearing a `_ref`
//! property at any depth, fetches the referenced document from the KV store,
//! recursively resolves references inside the fetched document, and merges
//! the result into the placeholder. The original `_ref` property is
//! preserved so callers can tell where data came from; fetched fields win
//! any other key collision.
//!
//! Resolution is exhaustive: after a successful pass no placeholder remains
//! unresolved. Any fetch failure (`NotFound` included) aborts the whole
//! document — there is no partial-resolution fallback.
//!
//! A placeholder is only considered resolved once its full recursive
//! subtree has resolved, so a chain A→B→C composes completely. The
//! in-flight uri path is tracked: re-entering a uri fails with `Cycle`,
//! and chains longer than `Limits::max_resolution_depth` fail with
//! `ResolutionDepth` instead of recursing unboundedly.

use amphora_core::{parse_document, AmphoraError, KvStore, Limits, Result, REF_KEY};
use serde_json::Value;
use tracing::trace;

/// Resolve every `_ref` placeholder in a document
///
/// Returns the fully composed document. The input is consumed; on error the
/// caller's stored data is untouched (resolution never writes).
pub fn resolve_data_references(
    store: &dyn KvStore,
    data: Value,
    limits: &Limits,
) -> Result<Value> {
    let mut data = data;
    let mut in_flight = Vec::new();
    resolve_in_place(store, &mut data, &mut in_flight, limits)?;
    Ok(data)
}

/// Resolve placeholders within `value`, depth-first
///
/// Children are resolved before the value's own `_ref` is fetched and
/// merged, so merged content is never re-walked (each placeholder is
/// fetched exactly once per pass).
fn resolve_in_place(
    store: &dyn KvStore,
    value: &mut Value,
    in_flight: &mut Vec<String>,
    limits: &Limits,
) -> Result<()> {
    match value {
        Value::Object(map) => {
            let ref_uri = map
                .get(REF_KEY)
                .and_then(Value::as_str)
                .map(str::to_string);

            for (_key, child) in map.iter_mut() {
                resolve_in_place(store, child, in_flight, limits)?;
            }

            if let Some(uri) = ref_uri {
                if in_flight.iter().any(|seen| seen == &uri) {
                    return Err(AmphoraError::Cycle(uri));
                }
                if in_flight.len() >= limits.max_resolution_depth {
                    return Err(AmphoraError::ResolutionDepth {
                        max: limits.max_resolution_depth,
                    });
                }

                trace!(%uri, depth = in_flight.len(), "resolving reference");
                let raw = store.get(&uri)?;
                let mut fetched = parse_document(&raw)?;

                in_flight.push(uri);
                resolve_in_place(store, &mut fetched, in_flight, limits)?;
                in_flight.pop();

                if let Value::Object(fetched_map) = fetched {
                    for (key, fetched_value) in fetched_map {
                        // Keep the original _ref; fetched fields win elsewhere.
                        if key != REF_KEY {
                            map.insert(key, fetched_value);
                        }
                    }
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                resolve_in_place(store, item, in_flight, limits)?;
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use amphora_storage::MemoryStore;
    use serde_json::json;

    fn store_with(entries: &[(&str, &str)]) -> MemoryStore {
        let store = MemoryStore::new();
        for (key, value) in entries {
            store.put(key, value).unwrap();
        }
        store
    }

    #[test]
    fn test_resolves_placeholders_at_any_depth() {
        let store = store_with(&[("x", r#"{"g":"h"}"#), ("y", r#"{"i":"j"}"#)]);
        let data = json!({"a": {"_ref": "x"}, "c": {"d": {"_ref": "y"}}});

        let resolved = resolve_data_references(&store, data, &Limits::default()).unwrap();
        assert_eq!(
            resolved,
            json!({
                "a": {"_ref": "x", "g": "h"},
                "c": {"d": {"_ref": "y", "i": "j"}}
            })
        );
    }

    #[test]
    fn test_chained_references_resolve_transitively() {
        let store = store_with(&[
            ("x", r#"{"g":"h"}"#),
            ("y", r#"{"i":"j","k":{"_ref":"m"}}"#),
            ("m", r#"{"n":"o"}"#),
        ]);
        let data = json!({"a": {"_ref": "y"}});

        let resolved = resolve_data_references(&store, data, &Limits::default()).unwrap();
        assert_eq!(
            resolved,
            json!({"a": {"_ref": "y", "i": "j", "k": {"_ref": "m", "n": "o"}}})
        );
    }

    #[test]
    fn test_three_level_chain() {
        let store = store_with(&[
            ("a", r#"{"next":{"_ref":"b"},"depth":1}"#),
            ("b", r#"{"next":{"_ref":"c"},"depth":2}"#),
            ("c", r#"{"depth":3}"#),
        ]);
        let data = json!({"root": {"_ref": "a"}});

        let resolved = resolve_data_references(&store, data, &Limits::default()).unwrap();
        assert_eq!(
            resolved["root"]["next"]["next"],
            json!({"_ref": "c", "depth": 3})
        );
    }

    #[test]
    fn test_fetched_fields_win_collisions_but_ref_is_preserved() {
        let store = store_with(&[("x", r#"{"title":"fetched"}"#)]);
        let data = json!({"a": {"_ref": "x", "title": "local", "keep": true}});

        let resolved = resolve_data_references(&store, data, &Limits::default()).unwrap();
        assert_eq!(
            resolved,
            json!({"a": {"_ref": "x", "title": "fetched", "keep": true}})
        );
    }

    #[test]
    fn test_placeholders_inside_arrays() {
        let store = store_with(&[("x", r#"{"n":1}"#), ("y", r#"{"n":2}"#)]);
        let data = json!({"items": [{"_ref": "x"}, {"_ref": "y"}, "plain"]});

        let resolved = resolve_data_references(&store, data, &Limits::default()).unwrap();
        assert_eq!(
            resolved["items"],
            json!([{"_ref": "x", "n": 1}, {"_ref": "y", "n": 2}, "plain"])
        );
    }

    #[test]
    fn test_missing_reference_aborts_whole_resolution() {
        let store = store_with(&[("x", r#"{"g":"h"}"#)]);
        let data = json!({"good": {"_ref": "x"}, "bad": {"_ref": "missing"}});

        let err = resolve_data_references(&store, data, &Limits::default()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unparseable_referenced_document_fails() {
        let store = store_with(&[("x", "{broken")]);
        let data = json!({"a": {"_ref": "x"}});

        let err = resolve_data_references(&store, data, &Limits::default()).unwrap_err();
        assert!(matches!(err, AmphoraError::Serialization(_)));
    }

    #[test]
    fn test_cycle_is_detected() {
        let store = store_with(&[
            ("a", r#"{"peer":{"_ref":"b"}}"#),
            ("b", r#"{"peer":{"_ref":"a"}}"#),
        ]);
        let data = json!({"root": {"_ref": "a"}});

        let err = resolve_data_references(&store, data, &Limits::default()).unwrap_err();
        match err {
            AmphoraError::Cycle(uri) => assert_eq!(uri, "a"),
            other => panic!("expected Cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_cycle_is_detected() {
        let store = store_with(&[("a", r#"{"again":{"_ref":"a"}}"#)]);
        let data = json!({"root": {"_ref": "a"}});

        let err = resolve_data_references(&store, data, &Limits::default()).unwrap_err();
        assert!(matches!(err, AmphoraError::Cycle(_)));
    }

    #[test]
    fn test_repeated_reference_is_not_a_cycle() {
        // The same uri referenced from two siblings is legal; only
        // re-entering a uri still being resolved is a cycle.
        let store = store_with(&[("shared", r#"{"n":1}"#)]);
        let data = json!({"a": {"_ref": "shared"}, "b": {"_ref": "shared"}});

        let resolved = resolve_data_references(&store, data, &Limits::default()).unwrap();
        assert_eq!(resolved["a"]["n"], 1);
        assert_eq!(resolved["b"]["n"], 1);
    }

    #[test]
    fn test_depth_limit_bounds_long_chains() {
        let store = MemoryStore::new();
        for i in 0..10 {
            store
                .put(&format!("c{i}"), &format!(r#"{{"next":{{"_ref":"c{}"}}}}"#, i + 1))
                .unwrap();
        }
        store.put("c10", r#"{"end":true}"#).unwrap();

        let limits = Limits {
            max_resolution_depth: 4,
            ..Limits::default()
        };
        let err =
            resolve_data_references(&store, json!({"root": {"_ref": "c0"}}), &limits).unwrap_err();
        assert!(matches!(err, AmphoraError::ResolutionDepth { max: 4 }));
    }

    #[test]
    fn test_document_without_references_is_unchanged() {
        let store = MemoryStore::new();
        let data = json!({"a": 1, "b": ["x", {"c": null}]});
        let resolved = resolve_data_references(&store, data.clone(), &Limits::default()).unwrap();
        assert_eq!(resolved, data);
    }

    #[test]
    fn test_non_string_ref_is_left_alone() {
        let store = MemoryStore::new();
        let data = json!({"a": {"_ref": 42}});
        let resolved = resolve_data_references(&store, data.clone(), &Limits::default()).unwrap();
        assert_eq!(resolved, data);
    }
}
