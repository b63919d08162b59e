//! Catalog slot dispenser
//!
//! A spawner keeps one fresh instance of its template sitting in its slot.
//! When an instance is released further than `spawn_distance` from the slot
//! a new one is spawned; the carried instance stays where it was left.
//!
//! With a carry root set, an instance leaves its slot on its first grab and
//! is re-parented under that root, so paging the catalog never hides it.

use crate::item::{InteractorEvent, Item};
use crate::{reborrow_placements, warn_on_scene_error};
use shelf_asset::{CatalogEntry, Download, TemplateFetcher, TemplateSource};
use shelf_core::math::{Quat, Vec3};
use shelf_core::scene::{NodeId, SceneError, SceneGraph, Template};
use shelf_metrics::Counter;
use shelf_registry::Placements;
use std::sync::Arc;

/// Scale applied to every freshly spawned instance.
pub const SPAWN_SCALE_FACTOR: f32 = 2.0;
/// Extra scale applied on an instance's first grab.
pub const GRAB_SCALE_FACTOR: f32 = 2.0;
/// Downloaded templates are authored at a much larger unit scale.
pub const REMOTE_UNIT_SCALE: f32 = 0.0007;

/// Receives every item a spawner creates.
pub trait SpawnRegistrar {
    fn register_spawned_item(&mut self, slot: usize, node: NodeId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnerState {
    /// Not started yet.
    Idle,
    /// Waiting for the remote template.
    Downloading,
    /// Template available; spawning on demand.
    Ready,
    /// Remote template could not be obtained. No retry.
    Failed,
    /// Torn down; any pending download was cancelled.
    Stopped,
}

#[derive(Debug)]
struct SpawnedItem {
    item: Item,
    /// Local scale right after spawning, before the first-grab bump.
    spawn_scale: Vec3,
}

#[derive(Debug)]
pub struct Spawner {
    index: usize,
    slot: NodeId,
    carry_root: Option<NodeId>,
    source: TemplateSource,
    model_id: String,
    spawn_distance: f32,
    template: Option<Arc<Template>>,
    downloaded: bool,
    state: SpawnerState,
    download: Option<Download>,
    items: Vec<SpawnedItem>,
    spawn_seq: u32,
    metrics: Counter,
}

impl Spawner {
    /// Spawner for catalog position `index`, dispensing into `slot`.
    pub fn new(index: usize, slot: NodeId, entry: CatalogEntry, spawn_distance: f32) -> Self {
        Self {
            index,
            slot,
            carry_root: None,
            source: entry.source,
            model_id: entry.model_id,
            spawn_distance,
            template: None,
            downloaded: false,
            state: SpawnerState::Idle,
            download: None,
            items: Vec::new(),
            spawn_seq: 0,
            metrics: Counter::new(),
        }
    }

    /// Re-parent instances under `root` on their first grab.
    pub fn with_carry_root(mut self, root: NodeId) -> Self {
        self.carry_root = Some(root);
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn slot(&self) -> NodeId {
        self.slot
    }

    pub fn carry_root(&self) -> Option<NodeId> {
        self.carry_root
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn state(&self) -> SpawnerState {
        self.state
    }

    pub fn spawn_distance(&self) -> f32 {
        self.spawn_distance
    }

    pub fn metrics(&self) -> &Counter {
        &self.metrics
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items.iter().map(|s| &s.item)
    }

    pub fn item(&self, node: NodeId) -> Option<&Item> {
        self.items.iter().find(|s| s.item.node() == node).map(|s| &s.item)
    }

    pub fn item_mut(&mut self, node: NodeId) -> Option<&mut Item> {
        self.items.iter_mut().find(|s| s.item.node() == node).map(|s| &mut s.item)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Spawn right away for local templates; start the download for remote
    /// ones. Without a fetcher a remote spawner fails immediately.
    pub fn start(
        &mut self,
        scene: &mut dyn SceneGraph,
        registrar: &mut dyn SpawnRegistrar,
        fetcher: Option<&Arc<dyn TemplateFetcher>>,
        placements: Option<&mut dyn Placements>,
    ) {
        if self.state != SpawnerState::Idle {
            return;
        }
        match &self.source {
            TemplateSource::Local(template) => {
                self.template = Some(Arc::clone(template));
                self.state = SpawnerState::Ready;
                self.spawn_item(scene, registrar, placements);
            }
            TemplateSource::Remote(reference) => {
                let Some(fetcher) = fetcher else {
                    tracing::error!(template = %reference.name, "no template fetcher configured for remote entry");
                    self.fail_download();
                    return;
                };
                match Download::spawn(Arc::clone(fetcher), reference) {
                    Ok(download) => {
                        self.download = Some(download);
                        self.state = SpawnerState::Downloading;
                    }
                    Err(e) => {
                        tracing::error!(template = %reference.name, error = %e, "failed to start template download");
                        self.fail_download();
                    }
                }
            }
        }
    }

    /// Pick up a finished download. Returns the spawned node, if any.
    pub fn poll_download(
        &mut self,
        scene: &mut dyn SceneGraph,
        registrar: &mut dyn SpawnRegistrar,
        placements: Option<&mut dyn Placements>,
    ) -> Option<NodeId> {
        let result = self.download.as_mut()?.try_take()?;
        self.download = None;
        match result {
            Ok(template) => {
                tracing::info!(template = %template.name, slot = self.index, "remote template downloaded");
                self.template = Some(Arc::new(template));
                self.downloaded = true;
                self.state = SpawnerState::Ready;
                self.spawn_item(scene, registrar, placements)
            }
            Err(e) => {
                tracing::error!(template = %self.source.name(), error = %e, "remote template was not downloaded");
                self.fail_download();
                None
            }
        }
    }

    /// Instantiate a new instance into the slot and record its spawn-time
    /// placement.
    ///
    /// A template without an interaction component yields no item; that is
    /// logged and this spawn is abandoned.
    pub fn spawn_item(
        &mut self,
        scene: &mut dyn SceneGraph,
        registrar: &mut dyn SpawnRegistrar,
        placements: Option<&mut dyn Placements>,
    ) -> Option<NodeId> {
        let Some(template) = self.template.clone() else {
            tracing::warn!(slot = self.index, "spawn requested before the template is available");
            return None;
        };
        let name = format!("{}_{}", template.name, self.spawn_seq);
        self.spawn_seq += 1;

        let (node, spawn_scale) = match self.instantiate(scene, &template, self.slot, &name) {
            Ok(spawned) => spawned,
            Err(e) => {
                tracing::warn!(slot = self.index, error = %e, "failed to instantiate template");
                self.metrics.increment("spawn_failed", 1);
                return None;
            }
        };

        let item = self.attach(&*scene, node, &name)?;
        if let Some(placements) = placements {
            item.register_initial_placement(&*scene, placements);
        }
        self.items.push(SpawnedItem { item, spawn_scale });
        registrar.register_spawned_item(self.index, node);
        self.metrics.increment("spawned", 1);
        tracing::debug!(instance = %name, model_id = %self.model_id, slot = self.index, "item spawned");
        Some(node)
    }

    /// Rebuild an instance that was carried away in an earlier session,
    /// directly under the carry root as `name`. Its placement is left to the
    /// snapshot being restored.
    pub fn spawn_carried(
        &mut self,
        scene: &mut dyn SceneGraph,
        registrar: &mut dyn SpawnRegistrar,
        name: &str,
    ) -> Option<NodeId> {
        let (Some(template), Some(root)) = (self.template.clone(), self.carry_root) else {
            tracing::warn!(slot = self.index, instance = name, "cannot rebuild carried item without template and carry root");
            return None;
        };
        let (node, spawn_scale) = match self.instantiate(scene, &template, root, name) {
            Ok(spawned) => spawned,
            Err(e) => {
                tracing::warn!(slot = self.index, error = %e, "failed to rebuild carried item");
                self.metrics.increment("spawn_failed", 1);
                return None;
            }
        };
        let mut item = self.attach(&*scene, node, name)?;
        item.mark_spawned();
        warn_on_scene_error(scene.set_local_scale(node, spawn_scale * GRAB_SCALE_FACTOR), "carried scale");

        self.items.push(SpawnedItem { item, spawn_scale });
        registrar.register_spawned_item(self.index, node);
        tracing::debug!(instance = name, model_id = %self.model_id, slot = self.index, "carried item rebuilt");
        Some(node)
    }

    fn instantiate(
        &self,
        scene: &mut dyn SceneGraph,
        template: &Template,
        parent: NodeId,
        name: &str,
    ) -> Result<(NodeId, Vec3), SceneError> {
        let node = scene.instantiate(template, parent)?;
        scene.set_name(node, name)?;
        scene.set_local_position(node, Vec3::ZERO)?;
        scene.set_local_rotation(node, Quat::IDENTITY)?;
        let authored = scene.local_scale(node).unwrap_or(Vec3::ONE);
        let factor = if self.downloaded {
            REMOTE_UNIT_SCALE * SPAWN_SCALE_FACTOR
        } else {
            SPAWN_SCALE_FACTOR
        };
        let spawn_scale = authored * factor;
        scene.set_local_scale(node, spawn_scale)?;
        Ok((node, spawn_scale))
    }

    fn attach(&mut self, scene: &dyn SceneGraph, node: NodeId, name: &str) -> Option<Item> {
        match Item::attach(scene, node, self.model_id.clone()) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!(instance = name, error = %e, "spawned instance has no item");
                self.metrics.increment("spawn_failed", 1);
                None
            }
        }
    }

    /// Route a grab to the item on `node`. The first grab of an instance
    /// moves it under the carry root and scales it up once more.
    pub fn handle_grab(
        &mut self,
        scene: &mut dyn SceneGraph,
        node: NodeId,
        event: InteractorEvent,
        placements: Option<&mut dyn Placements>,
    ) -> bool {
        let carry = self.carry_root.map(|root| (root, self.carry_base_name()));
        let Some(spawned) = self.items.iter_mut().find(|s| s.item.node() == node) else {
            return false;
        };
        if !spawned.item.trigger_start(event) {
            return false;
        }
        if spawned.item.mark_spawned() {
            if let Some((root, base)) = carry {
                detach_to_carry_root(scene, node, root, &base, placements);
            }
            warn_on_scene_error(
                scene.set_local_scale(node, spawned.spawn_scale * GRAB_SCALE_FACTOR),
                "first grab scale",
            );
        }
        true
    }

    /// Route a release to the item on `node`, then respawn if it was carried
    /// beyond `spawn_distance`. Returns the respawned node, if any.
    pub fn handle_release(
        &mut self,
        scene: &mut dyn SceneGraph,
        registrar: &mut dyn SpawnRegistrar,
        node: NodeId,
        event: InteractorEvent,
        mut placements: Option<&mut dyn Placements>,
    ) -> Option<NodeId> {
        let spawned = self.items.iter_mut().find(|s| s.item.node() == node)?;
        if !spawned
            .item
            .trigger_end(&*scene, event, reborrow_placements(&mut placements))
        {
            return None;
        }
        if !self.check_item_distance(&*scene, node) {
            return None;
        }
        let respawned = self.spawn_item(scene, registrar, placements);
        if respawned.is_some() {
            self.metrics.increment("respawned", 1);
        }
        respawned
    }

    /// Whether `node` sits strictly further than `spawn_distance` from the slot.
    pub fn check_item_distance(&self, scene: &dyn SceneGraph, node: NodeId) -> bool {
        let (Some(item_pos), Some(slot_pos)) = (scene.world_position(node), scene.world_position(self.slot)) else {
            return false;
        };
        let distance = item_pos.distance(slot_pos);
        tracing::trace!(distance, threshold = self.spawn_distance, "release distance");
        distance > self.spawn_distance
    }

    /// Enable or disable interaction on items that were never grabbed.
    pub fn set_idle_interaction(&mut self, enabled: bool) {
        for spawned in self.items.iter_mut().filter(|s| !s.item.is_spawned()) {
            spawned.item.toggle_interaction(enabled);
        }
    }

    /// Drop items whose nodes were destroyed. Returns their handles.
    pub fn forget_destroyed(&mut self, scene: &dyn SceneGraph) -> Vec<NodeId> {
        let mut removed = Vec::new();
        self.items.retain(|s| {
            let alive = scene.contains(s.item.node());
            if !alive {
                removed.push(s.item.node());
            }
            alive
        });
        removed
    }

    /// Tear down: cancel any pending download so its completion is dropped.
    pub fn stop(&mut self) {
        if let Some(mut download) = self.download.take() {
            download.cancel();
            tracing::debug!(template = %download.name(), "pending download cancelled");
        }
        self.state = SpawnerState::Stopped;
    }

    fn carry_base_name(&self) -> String {
        match &self.template {
            Some(template) => template.name.clone(),
            None => self.source.name().to_string(),
        }
    }

    fn fail_download(&mut self) {
        self.state = SpawnerState::Failed;
        self.metrics.increment("download_failed", 1);
    }
}

/// Move `node` under `root` as `<base>_<n>`, `n` being the first free suffix
/// among the root's children. Any placement recorded at the old path is
/// dropped first.
fn detach_to_carry_root(
    scene: &mut dyn SceneGraph,
    node: NodeId,
    root: NodeId,
    base: &str,
    placements: Option<&mut dyn Placements>,
) {
    if let Some(placements) = placements {
        placements.unregister_object(&*scene, node);
    }
    let name = (0u32..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| scene.find_child(root, candidate).is_none())
        .unwrap_or_else(|| base.to_string());
    warn_on_scene_error(scene.set_parent(node, root), "detach carried item");
    warn_on_scene_error(scene.set_name(node, &name), "rename carried item");
    tracing::debug!(node = %node, name = %name, "item left its slot");
}
