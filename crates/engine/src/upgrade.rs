//! Upgrade engine
//!
//! Components carry a per-type schema with an optional declared `_version`;
//! stored instances stamp the highest transform version already applied in
//! their own `_version` field. When the two disagree on read, the ordered
//! range of eligible transforms runs in sequence, threading accumulated
//! state, and the result is persisted back before it is returned — the
//! upgrade-on-read pattern, so subsequent reads see the upgraded form and
//! skip the chain.
//!
//! The write-back can race a concurrent explicit put to the same uri; last
//! write wins and no reconciliation is attempted. The effect is visible in
//! the contract: `check_for_upgrade` returns an [`Upgraded`] carrying an
//! explicit `upgraded` flag.
//!
//! Any transform error aborts the whole chain; the stored data is left
//! untouched and no partial version stamp is applied.

use crate::registry::{SchemaRegistry, TransformRegistry, TransformSet};
use amphora_core::{
    data_version, serialize_document, uri, AmphoraError, KvStore, Locals, Result, VERSION_KEY,
};
use serde_json::{Number, Value};
use std::sync::Arc;
use tracing::debug;

/// Result of an upgrade check
#[derive(Debug, Clone, PartialEq)]
pub struct Upgraded {
    /// The (possibly transformed) document
    pub data: Value,
    /// True if transforms ran and the result was persisted
    pub upgraded: bool,
}

impl Upgraded {
    fn unchanged(data: Value) -> Self {
        Upgraded {
            data,
            upgraded: false,
        }
    }
}

/// Collect the transform versions eligible between a stored instance's
/// version and the schema's declared target, sorted ascending
///
/// An instance that has never been versioned (no `_version`, or a zero one)
/// is offered every transform key as long as the schema declares a nonzero
/// version — deliberately more permissive than the bounded branch, which
/// takes only versions strictly newer than the current one and no newer
/// than the schema target. The bootstrap branch's missing upper bound is
/// preserved observed behavior; see the pinning test below.
pub fn aggregate_transforms(
    schema_version: f64,
    current_version: Option<f64>,
    keys: &[String],
) -> Vec<f64> {
    let unversioned = current_version.map_or(true, |v| v == 0.0);

    let mut eligible: Vec<f64> = keys
        .iter()
        .filter_map(|key| key.parse::<f64>().ok())
        .filter(|&candidate| {
            if unversioned {
                schema_version != 0.0
            } else {
                let current = current_version.unwrap_or(0.0);
                schema_version >= candidate && candidate > current
            }
        })
        .collect();

    eligible.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    eligible.dedup();
    eligible
}

/// Runs version-ordered transform chains and persists the result
pub struct UpgradeEngine {
    store: Arc<dyn KvStore>,
    schemas: Arc<SchemaRegistry>,
    transforms: Arc<TransformRegistry>,
}

impl UpgradeEngine {
    /// Create an engine over a store and the externally loaded registries
    pub fn new(
        store: Arc<dyn KvStore>,
        schemas: Arc<SchemaRegistry>,
        transforms: Arc<TransformRegistry>,
    ) -> Self {
        UpgradeEngine {
            store,
            schemas,
            transforms,
        }
    }

    /// Bring a document up to its schema's declared version
    ///
    /// Fast path: no component name, no schema, no declared schema version,
    /// or versions already equal — the data comes back unchanged.
    /// Otherwise the eligible transform range runs and the result is
    /// written back to `uri` before returning.
    pub fn check_for_upgrade(&self, uri: &str, data: Value, locals: &Locals) -> Result<Upgraded> {
        let Some(component) = uri::component(uri) else {
            return Ok(Upgraded::unchanged(data));
        };
        let Some(schema) = self.schemas.resolve(component) else {
            return Ok(Upgraded::unchanged(data));
        };
        let Some(schema_version) = schema.version else {
            return Ok(Upgraded::unchanged(data));
        };

        let current = data_version(&data);
        if current == Some(schema_version) {
            return Ok(Upgraded::unchanged(data));
        }

        self.upgrade_data(component, schema_version, current, uri, data, locals)
    }

    fn upgrade_data(
        &self,
        component: &str,
        schema_version: f64,
        current_version: Option<f64>,
        uri: &str,
        data: Value,
        locals: &Locals,
    ) -> Result<Upgraded> {
        let Some(set) = self.transforms.resolve(component) else {
            return Ok(Upgraded::unchanged(data));
        };

        let eligible = aggregate_transforms(schema_version, current_version, &set.version_keys());
        if eligible.is_empty() {
            return Ok(Upgraded::unchanged(data));
        }

        let mut accumulated = data;
        let mut applied = None;
        for version in eligible {
            let transform = lookup_transform(&set, version, uri)?;
            accumulated =
                transform(uri, accumulated, locals).map_err(|e| AmphoraError::UpgradeTransform {
                    uri: uri.to_string(),
                    version: format!("{version}"),
                    message: e.to_string(),
                })?;
            applied = Some(version);
        }

        if let Some(version) = applied {
            stamp_version(&mut accumulated, version);
            // Persist-on-read: write the upgraded form back so subsequent
            // reads skip the chain. Races with a concurrent explicit put
            // are last-write-wins.
            self.store.put(uri, &serialize_document(&accumulated)?)?;
            debug!(%uri, version, "persisted upgraded document");
        }

        Ok(Upgraded {
            data: accumulated,
            upgraded: true,
        })
    }
}

fn lookup_transform(
    set: &TransformSet,
    version: f64,
    uri: &str,
) -> Result<Arc<crate::registry::TransformFn>> {
    set.lookup(version).ok_or_else(|| AmphoraError::UpgradeTransform {
        uri: uri.to_string(),
        version: format!("{version}"),
        message: "transform missing from set".to_string(),
    })
}

/// Stamp `_version` to the last-applied transform version
///
/// Whole numbers are stored as JSON integers so the stamp round-trips the
/// way component authors write it.
fn stamp_version(data: &mut Value, version: f64) {
    if let Value::Object(map) = data {
        let number = if version.fract() == 0.0 {
            Number::from(version as i64)
        } else {
            Number::from_f64(version).unwrap_or_else(|| Number::from(0))
        };
        map.insert(VERSION_KEY.to_string(), Value::Number(number));
    }
}
