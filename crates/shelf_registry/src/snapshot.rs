//! Snapshot value type and its JSON wire format
//!
//! ```text
//! { "v": 1, "rootPath": "<anchor path>",
//!   "items": [ { "p": "<path>", "m": "<modelId>", "o": { "x": F, "y": F, "z": F } } ] }
//! ```
//!
//! Decoding is lenient: missing or non-array `items` is an empty snapshot,
//! missing `m` is an empty model id, and an item lacking `p` or `o` is
//! dropped without affecting its neighbours.

use serde::{Deserialize, Serialize};
use shelf_core::math::Vec3;
use thiserror::Error;

/// Wire format version written by this crate.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot text is not a valid snapshot object")]
    Malformed(#[source] serde_json::Error),

    #[error("failed to encode snapshot")]
    Encode(#[source] serde_json::Error),
}

/// One path-keyed placement record.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEntry {
    pub path: String,
    pub model_id: String,
    /// World position of the node minus world position of the anchor.
    pub offset: Vec3,
}

/// Self-contained serialized form of a registry at one point in time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub version: u32,
    /// Anchor path at capture time. Informational only: restoring resolves
    /// against the current anchor.
    pub root_path: String,
    pub items: Vec<TrackedEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireVec3 {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Serialize)]
struct WireItemOut<'a> {
    p: &'a str,
    m: &'a str,
    o: WireVec3,
}

#[derive(Serialize)]
struct WireSnapshotOut<'a> {
    v: u32,
    #[serde(rename = "rootPath")]
    root_path: &'a str,
    items: Vec<WireItemOut<'a>>,
}

#[derive(Deserialize)]
struct WireItemIn {
    p: String,
    #[serde(default)]
    m: Option<String>,
    o: WireVec3,
}

#[derive(Deserialize)]
struct WireSnapshotIn {
    #[serde(default)]
    v: Option<u32>,
    #[serde(default, rename = "rootPath")]
    root_path: Option<String>,
    #[serde(default)]
    items: Option<serde_json::Value>,
}

impl Snapshot {
    pub fn new(root_path: impl Into<String>, items: Vec<TrackedEntry>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            root_path: root_path.into(),
            items,
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        let wire = WireSnapshotOut {
            v: self.version,
            root_path: &self.root_path,
            items: self
                .items
                .iter()
                .map(|entry| WireItemOut {
                    p: &entry.path,
                    m: &entry.model_id,
                    o: WireVec3 {
                        x: entry.offset.x,
                        y: entry.offset.y,
                        z: entry.offset.z,
                    },
                })
                .collect(),
        };
        serde_json::to_string(&wire).map_err(SnapshotError::Encode)
    }

    pub fn parse(text: &str) -> Result<Self, SnapshotError> {
        let wire: WireSnapshotIn = serde_json::from_str(text).map_err(SnapshotError::Malformed)?;
        let version = wire.v.unwrap_or(SNAPSHOT_VERSION);
        if version > SNAPSHOT_VERSION {
            tracing::warn!(version, supported = SNAPSHOT_VERSION, "snapshot version is newer than supported");
        }

        let raw_items = match wire.items {
            Some(serde_json::Value::Array(items)) => items,
            _ => Vec::new(),
        };
        let mut items = Vec::with_capacity(raw_items.len());
        for (index, raw) in raw_items.into_iter().enumerate() {
            match serde_json::from_value::<WireItemIn>(raw) {
                Ok(item) => items.push(TrackedEntry {
                    path: item.p,
                    model_id: item.m.unwrap_or_default(),
                    offset: Vec3::new(item.o.x, item.o.y, item.o.z),
                }),
                Err(e) => tracing::warn!(index, error = %e, "dropping malformed snapshot item"),
            }
        }

        Ok(Self {
            version,
            root_path: wire.root_path.unwrap_or_default(),
            items,
        })
    }
}
