//! Placement registry
//!
//! Owns the tracked entry list. Scene nodes are only looked up during
//! register/restore calls; the registry never holds on to them.

use crate::path::{path_of, resolve};
use crate::snapshot::{Snapshot, SnapshotError, TrackedEntry};
use crate::Placements;
use shelf_core::math::Vec3;
use shelf_core::scene::{NodeId, SceneGraph};

/// Outcome of applying a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    /// Entries whose path did not resolve in the current scene.
    pub skipped: usize,
}

/// Path-keyed placement store relative to a configurable anchor.
#[derive(Debug, Clone)]
pub struct PlacementRegistry {
    anchor: NodeId,
    tracked: Vec<TrackedEntry>,
}

impl PlacementRegistry {
    pub fn new(anchor: NodeId) -> Self {
        Self {
            anchor,
            tracked: Vec::new(),
        }
    }

    pub fn anchor(&self) -> NodeId {
        self.anchor
    }

    /// Re-anchor the registry. Existing entries keep their stored paths.
    pub fn set_anchor(&mut self, anchor: NodeId) {
        self.anchor = anchor;
    }

    pub fn entries(&self) -> &[TrackedEntry] {
        &self.tracked
    }

    pub fn get(&self, path: &str) -> Option<&TrackedEntry> {
        self.tracked.iter().find(|t| t.path == path)
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    pub fn clear(&mut self) {
        self.tracked.clear();
    }

    pub fn path_of<S: SceneGraph + ?Sized>(&self, scene: &S, node: NodeId) -> String {
        path_of(scene, self.anchor, node)
    }

    pub fn resolve<S: SceneGraph + ?Sized>(&self, scene: &S, path: &str) -> Option<NodeId> {
        resolve(scene, self.anchor, path)
    }

    /// Record the node's current offset from the anchor, replacing any entry
    /// with the same path. An empty `model_id` falls back to the node name.
    pub fn register_object<S: SceneGraph + ?Sized>(&mut self, scene: &S, node: NodeId, model_id: &str) {
        let Some(offset) = self.offset_of(scene, node) else {
            tracing::warn!(node = %node, "cannot register node without a live transform");
            return;
        };
        let path = self.path_of(scene, node);
        let model_id = if model_id.is_empty() {
            scene.name(node).unwrap_or_default().to_string()
        } else {
            model_id.to_string()
        };
        tracing::debug!(path = %path, model_id = %model_id, "placement registered");
        self.upsert(TrackedEntry {
            path,
            model_id,
            offset,
        });
    }

    /// Remove the entry for the node's current path, if any.
    pub fn unregister_object<S: SceneGraph + ?Sized>(&mut self, scene: &S, node: NodeId) {
        let path = self.path_of(scene, node);
        self.tracked.retain(|t| t.path != path);
    }

    pub fn snapshot<S: SceneGraph + ?Sized>(&self, scene: &S) -> Snapshot {
        Snapshot::new(self.path_of(scene, self.anchor), self.tracked.clone())
    }

    pub fn snapshot_to_string<S: SceneGraph + ?Sized>(&self, scene: &S) -> Result<String, SnapshotError> {
        self.snapshot(scene).to_json()
    }

    /// Restore placements from serialized text.
    ///
    /// Blank text is ignored. Unparsable text is logged and ignored. Never
    /// fails: unresolvable entries are counted as skipped.
    pub fn apply_snapshot<S: SceneGraph + ?Sized>(&mut self, scene: &mut S, text: &str) -> RestoreReport {
        if text.trim().is_empty() {
            return RestoreReport::default();
        }
        match Snapshot::parse(text) {
            Ok(snapshot) => self.apply(scene, &snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse placement snapshot");
                RestoreReport::default()
            }
        }
    }

    /// Move every resolvable node to anchor + stored offset and track it.
    pub fn apply<S: SceneGraph + ?Sized>(&mut self, scene: &mut S, snapshot: &Snapshot) -> RestoreReport {
        let mut report = RestoreReport::default();
        let Some(anchor_pos) = scene.world_position(self.anchor) else {
            tracing::warn!(anchor = %self.anchor, "placement anchor is gone; nothing restored");
            report.skipped = snapshot.items.len();
            return report;
        };

        for item in &snapshot.items {
            let Some(node) = self.resolve(scene, &item.path) else {
                tracing::debug!(path = %item.path, "snapshot entry has no matching node");
                report.skipped += 1;
                continue;
            };
            if let Err(e) = scene.set_world_position(node, anchor_pos + item.offset) {
                tracing::warn!(path = %item.path, error = %e, "failed to move restored node");
                report.skipped += 1;
                continue;
            }
            self.upsert(item.clone());
            report.restored += 1;
        }

        tracing::info!(
            restored = report.restored,
            skipped = report.skipped,
            root_path = %snapshot.root_path,
            "placement snapshot applied"
        );
        report
    }

    fn offset_of<S: SceneGraph + ?Sized>(&self, scene: &S, node: NodeId) -> Option<Vec3> {
        Some(scene.world_position(node)? - scene.world_position(self.anchor)?)
    }

    fn upsert(&mut self, entry: TrackedEntry) {
        match self.tracked.iter_mut().find(|t| t.path == entry.path) {
            Some(existing) => *existing = entry,
            None => self.tracked.push(entry),
        }
    }
}

impl Placements for PlacementRegistry {
    fn register_object(&mut self, scene: &dyn SceneGraph, node: NodeId, model_id: &str) {
        PlacementRegistry::register_object(self, scene, node, model_id);
    }

    fn unregister_object(&mut self, scene: &dyn SceneGraph, node: NodeId) {
        PlacementRegistry::unregister_object(self, scene, node);
    }
}
