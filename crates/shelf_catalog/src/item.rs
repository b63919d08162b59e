//! Per-instance grab state machine
//!
//! `Idle -> Grabbed -> Idle`, driven by trigger start/end events from the
//! interaction provider. While interaction is disabled both events are
//! ignored.
//!
//! The owning [`Spawner`](crate::Spawner) drives the transitions directly
//! and reacts to them itself. The `on_item_grabbed`/`on_item_released`
//! listener lists and [`ItemBehavior`] hooks are for host-side observers
//! such as audio or haptics; the catalog never subscribes to them.

use crate::ItemError;
use shelf_core::event::Event;
use shelf_core::math::Vec3;
use shelf_core::scene::{NodeId, SceneGraph};
use shelf_registry::Placements;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabState {
    Idle,
    Grabbed,
}

/// Grab or release reported by the interaction provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InteractorEvent {
    /// Hand or controller that produced the event.
    pub interactor: u32,
}

/// Payload of `on_item_grabbed` / `on_item_released`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemNotification {
    pub node: NodeId,
    pub event: InteractorEvent,
}

/// Per-item hooks run on grab transitions, before listeners are notified.
pub trait ItemBehavior {
    fn on_grab_started(&mut self, _node: NodeId) {}
    fn on_grab_ended(&mut self, _node: NodeId) {}
}

struct NoBehavior;

impl ItemBehavior for NoBehavior {}

pub struct Item {
    node: NodeId,
    model_id: String,
    state: GrabState,
    is_spawned: bool,
    interaction_enabled: bool,
    behavior: Box<dyn ItemBehavior>,
    on_item_grabbed: Event<ItemNotification>,
    on_item_released: Event<ItemNotification>,
}

impl Item {
    /// Wrap `node`, which must carry an interaction component.
    pub fn attach<S: SceneGraph + ?Sized>(
        scene: &S,
        node: NodeId,
        model_id: impl Into<String>,
    ) -> Result<Self, ItemError> {
        if !scene.is_interactive(node) {
            return Err(ItemError::MissingInteractable { node });
        }
        Ok(Self {
            node,
            model_id: model_id.into(),
            state: GrabState::Idle,
            is_spawned: false,
            interaction_enabled: true,
            behavior: Box::new(NoBehavior),
            on_item_grabbed: Event::new(),
            on_item_released: Event::new(),
        })
    }

    pub fn with_behavior(mut self, behavior: impl ItemBehavior + 'static) -> Self {
        self.behavior = Box::new(behavior);
        self
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn set_model_id(&mut self, model_id: impl Into<String>) {
        self.model_id = model_id.into();
    }

    pub fn state(&self) -> GrabState {
        self.state
    }

    pub fn is_being_grabbed(&self) -> bool {
        self.state == GrabState::Grabbed
    }

    /// Whether the item has been grabbed at least once.
    pub fn is_spawned(&self) -> bool {
        self.is_spawned
    }

    /// Flip the first-grab marker. Returns `true` only on the first call.
    pub(crate) fn mark_spawned(&mut self) -> bool {
        !std::mem::replace(&mut self.is_spawned, true)
    }

    pub fn interaction_enabled(&self) -> bool {
        self.interaction_enabled
    }

    pub fn toggle_interaction(&mut self, enabled: bool) {
        self.interaction_enabled = enabled;
    }

    pub fn on_item_grabbed(&mut self) -> &mut Event<ItemNotification> {
        &mut self.on_item_grabbed
    }

    pub fn on_item_released(&mut self) -> &mut Event<ItemNotification> {
        &mut self.on_item_released
    }

    pub fn world_position<S: SceneGraph + ?Sized>(&self, scene: &S) -> Option<Vec3> {
        scene.world_position(self.node)
    }

    /// Grab begins. Returns `false` if the event was ignored.
    pub fn trigger_start(&mut self, event: InteractorEvent) -> bool {
        if !self.interaction_enabled {
            return false;
        }
        self.state = GrabState::Grabbed;
        self.behavior.on_grab_started(self.node);
        tracing::debug!(node = %self.node, model_id = %self.model_id, "item grabbed");
        self.on_item_grabbed.invoke(&ItemNotification {
            node: self.node,
            event,
        });
        true
    }

    /// Grab ends. Records the placement when `placements` is supplied.
    /// Returns `false` if the event was ignored.
    pub fn trigger_end(
        &mut self,
        scene: &dyn SceneGraph,
        event: InteractorEvent,
        placements: Option<&mut dyn Placements>,
    ) -> bool {
        if !self.interaction_enabled {
            return false;
        }
        self.state = GrabState::Idle;
        self.behavior.on_grab_ended(self.node);
        tracing::debug!(node = %self.node, model_id = %self.model_id, "item released");
        self.on_item_released.invoke(&ItemNotification {
            node: self.node,
            event,
        });
        if let Some(placements) = placements {
            placements.register_object(scene, self.node, &self.registration_label(scene));
        }
        true
    }

    /// Record the spawn-time placement, before any grab.
    pub fn register_initial_placement(&self, scene: &dyn SceneGraph, placements: &mut dyn Placements) {
        placements.register_object(scene, self.node, &self.registration_label(scene));
    }

    fn registration_label(&self, scene: &dyn SceneGraph) -> String {
        if self.model_id.is_empty() {
            scene.name(self.node).unwrap_or_default().to_string()
        } else {
            self.model_id.clone()
        }
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("node", &self.node)
            .field("model_id", &self.model_id)
            .field("state", &self.state)
            .field("is_spawned", &self.is_spawned)
            .field("interaction_enabled", &self.interaction_enabled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_core::scene::Scene;
    use shelf_registry::PlacementRegistry;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn scene_with_item() -> (Scene, NodeId, NodeId) {
        let mut scene = Scene::new();
        let anchor = scene.create_node("Anchor", None).unwrap();
        let node = scene.create_node("Gear_0", Some(anchor)).unwrap();
        scene.set_interactive(node, true).unwrap();
        (scene, anchor, node)
    }

    struct Recorder(Rc<RefCell<Vec<&'static str>>>);

    impl ItemBehavior for Recorder {
        fn on_grab_started(&mut self, _node: NodeId) {
            self.0.borrow_mut().push("started");
        }
        fn on_grab_ended(&mut self, _node: NodeId) {
            self.0.borrow_mut().push("ended");
        }
    }

    #[test]
    fn attach_requires_interaction_component() {
        let mut scene = Scene::new();
        let node = scene.create_node("Plain", None).unwrap();
        assert_eq!(
            Item::attach(&scene, node, "plain").unwrap_err(),
            ItemError::MissingInteractable { node }
        );
    }

    #[test]
    fn grab_and_release_cycle() {
        let (scene, _, node) = scene_with_item();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut item = Item::attach(&scene, node, "gear")
            .unwrap()
            .with_behavior(Recorder(Rc::clone(&log)));

        let grabbed = Rc::clone(&log);
        item.on_item_grabbed().add(move |_| grabbed.borrow_mut().push("grabbed"));
        let released = Rc::clone(&log);
        item.on_item_released().add(move |_| released.borrow_mut().push("released"));

        assert_eq!(item.state(), GrabState::Idle);
        assert!(item.trigger_start(InteractorEvent::default()));
        assert!(item.is_being_grabbed());
        assert!(item.trigger_end(&scene, InteractorEvent::default(), None));
        assert_eq!(item.state(), GrabState::Idle);
        assert_eq!(*log.borrow(), vec!["started", "grabbed", "ended", "released"]);
    }

    #[test]
    fn disabled_interaction_ignores_events() {
        let (scene, anchor, node) = scene_with_item();
        let mut registry = PlacementRegistry::new(anchor);
        let mut item = Item::attach(&scene, node, "gear").unwrap();

        item.toggle_interaction(false);
        assert!(!item.trigger_start(InteractorEvent::default()));
        assert_eq!(item.state(), GrabState::Idle);
        assert!(!item.trigger_end(&scene, InteractorEvent::default(), Some(&mut registry)));
        assert!(registry.is_empty());

        item.toggle_interaction(true);
        assert!(item.trigger_start(InteractorEvent::default()));
    }

    #[test]
    fn release_registers_placement() {
        let (mut scene, anchor, node) = scene_with_item();
        scene.set_world_position(node, Vec3::new(1.0, 2.0, 3.0)).unwrap();
        let mut registry = PlacementRegistry::new(anchor);
        let mut item = Item::attach(&scene, node, "").unwrap();

        item.trigger_start(InteractorEvent::default());
        item.trigger_end(&scene, InteractorEvent::default(), Some(&mut registry));

        let entry = registry.get("Anchor/Gear_0").unwrap();
        assert_eq!(entry.model_id, "Gear_0");
        assert_eq!(entry.offset, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn initial_placement_uses_model_id() {
        let (scene, anchor, node) = scene_with_item();
        let mut registry = PlacementRegistry::new(anchor);
        let item = Item::attach(&scene, node, "gear-v1").unwrap();

        item.register_initial_placement(&scene, &mut registry);
        assert_eq!(registry.get("Anchor/Gear_0").unwrap().model_id, "gear-v1");
    }

    #[test]
    fn mark_spawned_flips_once() {
        let (scene, _, node) = scene_with_item();
        let mut item = Item::attach(&scene, node, "gear").unwrap();
        assert!(item.mark_spawned());
        assert!(!item.mark_spawned());
        assert!(item.is_spawned());
    }
}
