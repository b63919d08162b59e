//! Paginated catalog browser
//!
//! Owns one slot node and one [`Spawner`] per catalog entry, created up
//! front. Only the slots of the current page are enabled; they are laid
//! out on a grid relative to the browser root.
//!
//! Grabbed items live under a separate carry root (`Spawned`, a sibling of
//! the browser root), so neither paging nor slot layout touches them.

use crate::config::BrowserConfig;
use crate::item::{InteractorEvent, Item};
use crate::spawner::{SpawnRegistrar, Spawner, SpawnerState};
use crate::{reborrow_placements, warn_on_scene_error, CatalogError};
use shelf_asset::{CatalogEntry, TemplateFetcher};
use shelf_core::math::{Quat, Vec3};
use shelf_core::scene::{NodeId, SceneGraph, Template};
use shelf_metrics::Counter;
use shelf_registry::{PlacementRegistry, Placements, Snapshot, PATH_SEPARATOR};
use std::collections::HashMap;
use std::sync::Arc;

/// Maps spawned item nodes back to the slot that owns them.
#[derive(Debug, Default)]
pub struct ItemIndex {
    slots: HashMap<NodeId, usize>,
}

impl ItemIndex {
    pub fn slot_of(&self, node: NodeId) -> Option<usize> {
        self.slots.get(&node).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn remove(&mut self, node: NodeId) {
        self.slots.remove(&node);
    }
}

impl SpawnRegistrar for ItemIndex {
    fn register_spawned_item(&mut self, slot: usize, node: NodeId) {
        self.slots.insert(node, slot);
    }
}

/// Name of the node carried items are moved under.
pub const CARRY_ROOT_NAME: &str = "Spawned";

#[derive(Debug)]
pub struct Browser {
    root: NodeId,
    carry_root: NodeId,
    config: BrowserConfig,
    spawners: Vec<Spawner>,
    index: ItemIndex,
    current_page: usize,
    total_pages: usize,
    next_button: Option<NodeId>,
    previous_button: Option<NodeId>,
}

impl Browser {
    /// Build every slot under `root`, plus the carry root beside it. Fails on
    /// an empty catalog, a missing spawner template, or a degenerate layout.
    pub fn new(
        scene: &mut dyn SceneGraph,
        root: NodeId,
        config: BrowserConfig,
        spawner_template: Option<Arc<Template>>,
        catalog: Vec<CatalogEntry>,
    ) -> Result<Self, CatalogError> {
        config.validate()?;
        if catalog.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }
        let spawner_template = spawner_template.ok_or(CatalogError::MissingSpawnerTemplate)?;

        let carry_parent = scene.parent(root).unwrap_or(root);
        let carry_root = scene.instantiate(&Template::new(CARRY_ROOT_NAME), carry_parent)?;

        let mut spawners = Vec::with_capacity(catalog.len());
        for (index, entry) in catalog.into_iter().enumerate() {
            let slot = scene.instantiate(&spawner_template, root)?;
            scene.set_name(slot, &format!("{}_{}", spawner_template.name, index))?;
            spawners.push(Spawner::new(index, slot, entry, config.spawn_distance).with_carry_root(carry_root));
        }

        let total_pages = config.total_pages(spawners.len());
        Ok(Self {
            root,
            carry_root,
            config,
            spawners,
            index: ItemIndex::default(),
            current_page: 0,
            total_pages,
            next_button: None,
            previous_button: None,
        })
    }

    /// Lay out the first page, then start every spawner. Spawn-time
    /// placements go to `placements` when given.
    pub fn start(
        &mut self,
        scene: &mut dyn SceneGraph,
        fetcher: Option<&Arc<dyn TemplateFetcher>>,
        mut placements: Option<&mut dyn Placements>,
    ) {
        self.show_page(scene, 0);
        for spawner in &mut self.spawners {
            spawner.start(scene, &mut self.index, fetcher, reborrow_placements(&mut placements));
            let visible = scene.is_enabled(spawner.slot());
            spawner.set_idle_interaction(visible);
        }
        tracing::info!(
            entries = self.spawners.len(),
            pages = self.total_pages,
            "catalog browser started"
        );
    }

    /// Per-frame pump: pick up finished downloads and forget destroyed items.
    pub fn update(&mut self, scene: &mut dyn SceneGraph, mut placements: Option<&mut dyn Placements>) {
        for spawner in &mut self.spawners {
            if spawner
                .poll_download(scene, &mut self.index, reborrow_placements(&mut placements))
                .is_some()
            {
                let visible = scene.is_enabled(spawner.slot());
                spawner.set_idle_interaction(visible);
            }
            for node in spawner.forget_destroyed(&*scene) {
                self.index.remove(node);
            }
        }
    }

    /// Show page `page`, clamped to the valid range.
    pub fn show_page(&mut self, scene: &mut dyn SceneGraph, page: isize) {
        let last = self.total_pages.saturating_sub(1) as isize;
        self.current_page = page.clamp(0, last) as usize;
        self.apply_visibility(scene);
        self.update_navigation(scene);
        tracing::info!(page = self.current_page, total = self.total_pages, "page shown");
    }

    pub fn next_page(&mut self, scene: &mut dyn SceneGraph) {
        self.show_page(scene, self.current_page as isize + 1);
    }

    pub fn previous_page(&mut self, scene: &mut dyn SceneGraph) {
        self.show_page(scene, self.current_page as isize - 1);
    }

    /// Attach the optional next/previous affordances.
    pub fn set_navigation(&mut self, scene: &mut dyn SceneGraph, next: Option<NodeId>, previous: Option<NodeId>) {
        self.next_button = next;
        self.previous_button = previous;
        self.update_navigation(scene);
    }

    /// Route a grab on `node` to its owning item. Returns whether it was
    /// handled. A first grab moves the item out of its slot, dropping its
    /// slot-path record from `placements`.
    pub fn grab_start(
        &mut self,
        scene: &mut dyn SceneGraph,
        node: NodeId,
        event: InteractorEvent,
        placements: Option<&mut dyn Placements>,
    ) -> bool {
        let Some(slot) = self.index.slot_of(node) else {
            tracing::debug!(node = %node, "grab on a node the catalog does not own");
            return false;
        };
        self.spawners[slot].handle_grab(scene, node, event, placements)
    }

    /// Route a release on `node`. Returns the respawned replacement, if any.
    pub fn grab_end(
        &mut self,
        scene: &mut dyn SceneGraph,
        node: NodeId,
        event: InteractorEvent,
        placements: Option<&mut dyn Placements>,
    ) -> Option<NodeId> {
        let slot = self.index.slot_of(node)?;
        let spawner = &mut self.spawners[slot];
        let respawned = spawner.handle_release(scene, &mut self.index, node, event, placements)?;
        let visible = scene.is_enabled(spawner.slot());
        spawner.set_idle_interaction(visible);
        Some(respawned)
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn carry_root(&self) -> NodeId {
        self.carry_root
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    pub fn spawners(&self) -> &[Spawner] {
        &self.spawners
    }

    pub fn spawner(&self, index: usize) -> Option<&Spawner> {
        self.spawners.get(index)
    }

    pub fn item_index(&self) -> &ItemIndex {
        &self.index
    }

    /// The item on `node`, wherever it lives.
    pub fn item(&self, node: NodeId) -> Option<&Item> {
        let slot = self.index.slot_of(node)?;
        self.spawners[slot].item(node)
    }

    pub fn item_mut(&mut self, node: NodeId) -> Option<&mut Item> {
        let slot = self.index.slot_of(node)?;
        self.spawners[slot].item_mut(node)
    }

    /// Counters summed over every spawner.
    pub fn metrics(&self) -> Counter {
        let mut total = Counter::new();
        for spawner in &self.spawners {
            total.merge(spawner.metrics());
        }
        total
    }

    /// Rebuild the carried items `snapshot` records under the carry root
    /// that this scene lacks, so that applying the snapshot afterwards can
    /// place them. Each is rebuilt by the first ready spawner with the
    /// recorded model id. Returns how many were rebuilt.
    pub fn restore_carried(
        &mut self,
        scene: &mut dyn SceneGraph,
        registry: &PlacementRegistry,
        snapshot: &Snapshot,
    ) -> usize {
        let mut rebuilt = 0;
        for entry in &snapshot.items {
            if registry.resolve(&*scene, &entry.path).is_some() {
                continue;
            }
            let Some((parent, name)) = entry.path.rsplit_once(PATH_SEPARATOR) else {
                continue;
            };
            if registry.resolve(&*scene, parent) != Some(self.carry_root) {
                continue;
            }
            let Some(spawner) = self
                .spawners
                .iter_mut()
                .find(|s| s.model_id() == entry.model_id && s.state() == SpawnerState::Ready)
            else {
                tracing::warn!(path = %entry.path, model_id = %entry.model_id, "no spawner can rebuild carried item");
                continue;
            };
            if spawner.spawn_carried(scene, &mut self.index, name).is_some() {
                rebuilt += 1;
            }
        }
        if rebuilt > 0 {
            tracing::info!(rebuilt, "carried items rebuilt");
        }
        rebuilt
    }

    /// Cancel pending downloads. The scene is left as is.
    pub fn shutdown(&mut self) {
        for spawner in &mut self.spawners {
            spawner.stop();
        }
        tracing::info!("catalog browser shut down");
    }

    fn page_window(&self) -> std::ops::Range<usize> {
        let start = self.current_page * self.config.items_per_page;
        let end = (start + self.config.items_per_page).min(self.spawners.len());
        start..end
    }

    fn apply_visibility(&mut self, scene: &mut dyn SceneGraph) {
        let window = self.page_window();
        let origin = scene.world_position(self.root).unwrap_or(Vec3::ZERO);
        let rotation = scene.world_rotation(self.root).unwrap_or(Quat::IDENTITY);

        for (index, spawner) in self.spawners.iter_mut().enumerate() {
            let visible = window.contains(&index);
            let slot = spawner.slot();
            if visible {
                let offset = self.config.grid_offset(index - window.start);
                warn_on_scene_error(scene.set_world_position(slot, origin + rotation * offset), "place slot");
            }
            warn_on_scene_error(scene.set_enabled(slot, visible), "toggle slot");
            spawner.set_idle_interaction(visible);
        }
    }

    fn update_navigation(&self, scene: &mut dyn SceneGraph) {
        let many = self.total_pages > 1;
        if let Some(next) = self.next_button {
            let enabled = many && self.current_page + 1 < self.total_pages;
            warn_on_scene_error(scene.set_enabled(next, enabled), "toggle next button");
        }
        if let Some(previous) = self.previous_button {
            let enabled = many && self.current_page > 0;
            warn_on_scene_error(scene.set_enabled(previous, enabled), "toggle previous button");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_core::scene::Scene;

    fn catalog(n: usize) -> Vec<CatalogEntry> {
        (0..n)
            .map(|i| CatalogEntry::local(Template::new(format!("Model{i}")).interactive(true)))
            .collect()
    }

    fn browser(n: usize) -> (Scene, NodeId, Browser) {
        let mut scene = Scene::new();
        let anchor = scene.create_node("Anchor", None).unwrap();
        let root = scene.create_node("Catalog", Some(anchor)).unwrap();
        let browser = Browser::new(
            &mut scene,
            root,
            BrowserConfig::default(),
            Some(Arc::new(Template::new("Slot"))),
            catalog(n),
        )
        .unwrap();
        (scene, anchor, browser)
    }

    fn visible_slots(scene: &Scene, browser: &Browser) -> Vec<usize> {
        browser
            .spawners()
            .iter()
            .filter(|s| scene.is_enabled(s.slot()))
            .map(|s| s.index())
            .collect()
    }

    fn first_item(browser: &Browser, slot: usize) -> NodeId {
        browser.spawners()[slot].items().next().unwrap().node()
    }

    #[test]
    fn construction_errors_are_fatal() {
        let mut scene = Scene::new();
        let root = scene.create_node("Catalog", None).unwrap();
        let slot = Some(Arc::new(Template::new("Slot")));

        let empty = Browser::new(&mut scene, root, BrowserConfig::default(), slot.clone(), Vec::new());
        assert!(matches!(empty, Err(CatalogError::EmptyCatalog)));

        let missing = Browser::new(&mut scene, root, BrowserConfig::default(), None, catalog(1));
        assert!(matches!(missing, Err(CatalogError::MissingSpawnerTemplate)));

        let config = BrowserConfig {
            items_per_row: 0,
            ..BrowserConfig::default()
        };
        let layout = Browser::new(&mut scene, root, config, slot, catalog(1));
        assert!(matches!(layout, Err(CatalogError::InvalidLayout(_))));
    }

    #[test]
    fn slots_are_created_up_front_with_unique_names() {
        let (scene, anchor, browser) = browser(4);
        assert_eq!(scene.child_count(browser.root()), 4);
        assert_eq!(scene.name(browser.spawners()[3].slot()), Some("Slot_3"));
        assert_eq!(scene.parent(browser.carry_root()), Some(anchor));
        assert_eq!(scene.name(browser.carry_root()), Some(CARRY_ROOT_NAME));
    }

    #[test]
    fn unparented_root_hosts_its_own_carry_root() {
        let mut scene = Scene::new();
        let root = scene.create_node("Catalog", None).unwrap();
        let browser = Browser::new(
            &mut scene,
            root,
            BrowserConfig::default(),
            Some(Arc::new(Template::new("Slot"))),
            catalog(2),
        )
        .unwrap();
        assert_eq!(scene.parent(browser.carry_root()), Some(root));
    }

    #[test]
    fn start_records_every_spawn_time_placement() {
        let (mut scene, anchor, mut browser) = browser(12);
        let mut registry = PlacementRegistry::new(anchor);
        browser.start(&mut scene, None, Some(&mut registry));

        assert_eq!(registry.len(), 12);
        for i in 0..12 {
            let entry = registry.get(&format!("Anchor/Catalog/Slot_{i}/Model{i}_0")).unwrap();
            assert_eq!(entry.model_id, format!("Model{i}"));
        }
        let fourth = registry.get("Anchor/Catalog/Slot_4/Model4_0").unwrap();
        assert!(fourth.offset.abs_diff_eq(BrowserConfig::default().grid_offset(4), 1e-4));
    }

    #[test]
    fn respawns_are_recorded_too() {
        let (mut scene, anchor, mut browser) = browser(3);
        let mut registry = PlacementRegistry::new(anchor);
        browser.start(&mut scene, None, Some(&mut registry));
        let node = first_item(&browser, 0);

        browser.grab_start(&mut scene, node, InteractorEvent::default(), Some(&mut registry));
        scene.set_world_position(node, Vec3::new(0.0, 0.0, 50.0)).unwrap();
        browser.grab_end(&mut scene, node, InteractorEvent::default(), Some(&mut registry));

        assert!(registry.get("Anchor/Catalog/Slot_0/Model0_0").is_none());
        assert!(registry.get("Anchor/Spawned/Model0_0").is_some());
        assert!(registry.get("Anchor/Catalog/Slot_0/Model0_1").is_some());
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn pagination_clamps_at_both_ends() {
        let (mut scene, _, mut browser) = browser(20);
        browser.start(&mut scene, None, None);
        assert_eq!(browser.total_pages(), 3);
        assert_eq!(visible_slots(&scene, &browser), (0..9).collect::<Vec<_>>());

        browser.show_page(&mut scene, -1);
        assert_eq!(browser.current_page(), 0);

        browser.show_page(&mut scene, 99);
        assert_eq!(browser.current_page(), 2);
        assert_eq!(visible_slots(&scene, &browser), (18..20).collect::<Vec<_>>());

        browser.next_page(&mut scene);
        assert_eq!(browser.current_page(), 2);
        browser.previous_page(&mut scene);
        assert_eq!(browser.current_page(), 1);
        assert_eq!(visible_slots(&scene, &browser), (9..18).collect::<Vec<_>>());
    }

    #[test]
    fn slots_use_page_local_grid_positions() {
        let (mut scene, _, mut browser) = browser(20);
        scene.set_world_position(browser.root(), Vec3::new(0.0, 10.0, 0.0)).unwrap();
        browser.start(&mut scene, None, None);
        browser.show_page(&mut scene, 1);

        let tenth = browser.spawners()[10].slot();
        let pos = scene.world_position(tenth).unwrap();
        assert!(pos.abs_diff_eq(Vec3::new(12.0, 10.0, 0.0), 1e-4));
    }

    #[test]
    fn navigation_buttons_follow_page_bounds() {
        let (mut scene, _, mut browser) = browser(20);
        let next = scene.create_node("Next", None).unwrap();
        let previous = scene.create_node("Previous", None).unwrap();
        browser.set_navigation(&mut scene, Some(next), Some(previous));
        browser.start(&mut scene, None, None);

        assert!(scene.is_enabled(next));
        assert!(!scene.is_enabled(previous));
        browser.show_page(&mut scene, 2);
        assert!(!scene.is_enabled(next));
        assert!(scene.is_enabled(previous));
    }

    #[test]
    fn single_page_hides_both_buttons() {
        let (mut scene, _, mut browser) = browser(3);
        let next = scene.create_node("Next", None).unwrap();
        let previous = scene.create_node("Previous", None).unwrap();
        browser.set_navigation(&mut scene, Some(next), Some(previous));
        browser.start(&mut scene, None, None);

        assert!(!scene.is_enabled(next));
        assert!(!scene.is_enabled(previous));
    }

    #[test]
    fn hidden_page_items_ignore_grabs() {
        let (mut scene, _, mut browser) = browser(12);
        browser.start(&mut scene, None, None);
        let hidden = first_item(&browser, 10);

        assert!(!scene.is_active_in_hierarchy(hidden));
        assert!(!browser.grab_start(&mut scene, hidden, InteractorEvent::default(), None));
        browser.next_page(&mut scene);
        assert!(scene.is_active_in_hierarchy(hidden));
        assert!(browser.grab_start(&mut scene, hidden, InteractorEvent::default(), None));
    }

    #[test]
    fn carried_items_stay_visible_across_pages() {
        let (mut scene, _, mut browser) = browser(12);
        browser.start(&mut scene, None, None);
        let node = first_item(&browser, 0);

        browser.grab_start(&mut scene, node, InteractorEvent::default(), None);
        scene.set_world_position(node, Vec3::new(0.0, 0.0, 50.0)).unwrap();
        let respawned = browser.grab_end(&mut scene, node, InteractorEvent::default(), None).unwrap();

        browser.next_page(&mut scene);
        assert!(scene.is_active_in_hierarchy(node));
        assert!(browser.item(node).unwrap().interaction_enabled());
        assert!(!scene.is_active_in_hierarchy(respawned));
        assert!(!browser.item(respawned).unwrap().interaction_enabled());

        browser.previous_page(&mut scene);
        assert!(scene.is_active_in_hierarchy(node));
        assert!(scene.is_active_in_hierarchy(respawned));
    }

    #[test]
    fn carried_items_keep_their_position_when_slots_move() {
        let (mut scene, _, mut browser) = browser(3);
        browser.start(&mut scene, None, None);
        let node = first_item(&browser, 1);

        browser.grab_start(&mut scene, node, InteractorEvent::default(), None);
        scene.set_world_position(node, Vec3::new(-4.0, 2.0, 30.0)).unwrap();
        browser.grab_end(&mut scene, node, InteractorEvent::default(), None);

        scene.set_world_position(browser.root(), Vec3::new(100.0, 0.0, 0.0)).unwrap();
        browser.show_page(&mut scene, 0);
        assert!(scene.world_position(node).unwrap().abs_diff_eq(Vec3::new(-4.0, 2.0, 30.0), 1e-4));
        let slot = browser.spawners()[1].slot();
        assert!(scene.world_position(slot).unwrap().abs_diff_eq(Vec3::new(112.0, 0.0, 0.0), 1e-4));
    }

    #[test]
    fn restored_items_stay_visible_across_pages() {
        let (mut earlier, anchor, mut first) = browser(12);
        let mut registry = PlacementRegistry::new(anchor);
        first.start(&mut earlier, None, Some(&mut registry));
        let node = first_item(&first, 0);
        first.grab_start(&mut earlier, node, InteractorEvent::default(), Some(&mut registry));
        earlier.set_world_position(node, Vec3::new(3.0, 0.0, 40.0)).unwrap();
        first.grab_end(&mut earlier, node, InteractorEvent::default(), Some(&mut registry));
        let snapshot = registry.snapshot(&earlier);

        let (mut scene, anchor, mut browser) = browser(12);
        let mut registry = PlacementRegistry::new(anchor);
        browser.start(&mut scene, None, Some(&mut registry));
        assert_eq!(browser.restore_carried(&mut scene, &registry, &snapshot), 1);
        registry.apply(&mut scene, &snapshot);

        let restored = registry.resolve(&scene, "Anchor/Spawned/Model0_0").unwrap();
        assert!(scene.world_position(restored).unwrap().abs_diff_eq(Vec3::new(3.0, 0.0, 40.0), 1e-4));
        assert!(browser.item(restored).unwrap().is_spawned());

        browser.next_page(&mut scene);
        assert!(scene.is_active_in_hierarchy(restored));
        assert!(browser.item(restored).unwrap().interaction_enabled());
        browser.previous_page(&mut scene);
        assert!(scene.is_active_in_hierarchy(restored));

        // Present items are never rebuilt twice.
        assert_eq!(browser.restore_carried(&mut scene, &registry, &snapshot), 0);
    }

    #[test]
    fn carried_items_without_a_spawner_are_skipped() {
        let (mut scene, anchor, mut browser) = browser(2);
        let registry = PlacementRegistry::new(anchor);
        browser.start(&mut scene, None, None);
        let snapshot = Snapshot::new(
            "Anchor",
            vec![shelf_registry::TrackedEntry {
                path: "Anchor/Spawned/Lamp_0".into(),
                model_id: "Lamp".into(),
                offset: Vec3::ONE,
            }],
        );
        assert_eq!(browser.restore_carried(&mut scene, &registry, &snapshot), 0);
        assert_eq!(scene.child_count(browser.carry_root()), 0);
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn metrics_sum_over_spawners() {
        let (mut scene, _, mut browser) = browser(5);
        browser.start(&mut scene, None, None);
        assert_eq!(browser.metrics().get("spawned"), 5);
        assert_eq!(browser.item_index().len(), 5);
    }
}
