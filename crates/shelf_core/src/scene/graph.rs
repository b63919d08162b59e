// graph.rs - In-memory scene graph with generational node slots

use super::{NodeId, SceneError, SceneGraph, Template};
use crate::math::{Mat4, Quat, Transform, Vec3};

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local: Transform,
    enabled: bool,
    interactive: bool,
}

impl Node {
    fn new(name: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            local: Transform::IDENTITY,
            enabled: true,
            interactive: false,
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Tree of named nodes with local transforms.
///
/// Destroyed slots are reused; their generation is bumped so that stale
/// handles stop resolving.
#[derive(Debug, Default)]
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl Scene {
    /// Create a new empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty node, as a root when `parent` is `None`.
    pub fn create_node(&mut self, name: &str, parent: Option<NodeId>) -> Result<NodeId, SceneError> {
        if let Some(parent) = parent {
            self.get(parent).ok_or(SceneError::StaleNode(parent))?;
        }
        let id = self.alloc(Node::new(name, parent));
        if let Some(parent) = parent {
            if let Some(p) = self.get_mut(parent) {
                p.children.push(id);
            }
        }
        Ok(id)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live nodes without a parent, in slot order.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.node
                .as_ref()
                .filter(|n| n.parent.is_none())
                .map(|_| NodeId::new(index as u32, slot.generation))
        })
    }

    pub fn local_transform(&self, node: NodeId) -> Option<Transform> {
        self.get(node).map(|n| n.local)
    }

    pub fn set_local_transform(&mut self, node: NodeId, transform: Transform) -> Result<(), SceneError> {
        self.node_mut(node)?.local = transform;
        Ok(())
    }

    pub fn set_interactive(&mut self, node: NodeId, interactive: bool) -> Result<(), SceneError> {
        self.node_mut(node)?.interactive = interactive;
        Ok(())
    }

    /// Matrix mapping the node's local space into world space.
    pub fn world_matrix(&self, node: NodeId) -> Option<Mat4> {
        let n = self.get(node)?;
        let local = n.local.compute_matrix();
        match n.parent {
            Some(parent) => Some(self.world_matrix(parent)? * local),
            None => Some(local),
        }
    }

    /// Whether the node and all of its ancestors are enabled.
    pub fn is_active_in_hierarchy(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            match self.get(id) {
                Some(n) if n.enabled => current = n.parent,
                _ => return false,
            }
        }
        true
    }

    fn get(&self, node: NodeId) -> Option<&Node> {
        self.slots
            .get(node.index() as usize)
            .filter(|slot| slot.generation == node.generation())
            .and_then(|slot| slot.node.as_ref())
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(node.index() as usize)
            .filter(|slot| slot.generation == node.generation())
            .and_then(|slot| slot.node.as_mut())
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut Node, SceneError> {
        self.get_mut(node).ok_or(SceneError::StaleNode(node))
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId::new(index, 0)
    }

    fn release(&mut self, node: NodeId) -> Option<Node> {
        let slot = self.slots.get_mut(node.index() as usize)?;
        if slot.generation != node.generation() {
            return None;
        }
        let removed = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(node.index());
        self.live -= 1;
        Some(removed)
    }

    fn instantiate_node(&mut self, template: &Template, parent: NodeId) -> Result<NodeId, SceneError> {
        let id = self.create_node(&template.name, Some(parent))?;
        {
            let node = self.node_mut(id)?;
            node.local = template.transform;
            node.interactive = template.interactive;
        }
        for child in &template.children {
            self.instantiate_node(child, id)?;
        }
        Ok(id)
    }
}

impl SceneGraph for Scene {
    fn contains(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    fn name(&self, node: NodeId) -> Option<&str> {
        self.get(node).map(|n| n.name.as_str())
    }

    fn set_name(&mut self, node: NodeId, name: &str) -> Result<(), SceneError> {
        self.node_mut(node)?.name = name.to_string();
        Ok(())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.parent
    }

    fn set_parent(&mut self, node: NodeId, parent: NodeId) -> Result<(), SceneError> {
        let world = self.world_matrix(node).ok_or(SceneError::StaleNode(node))?;
        let parent_world = self.world_matrix(parent).ok_or(SceneError::StaleNode(parent))?;
        let mut ancestor = Some(parent);
        while let Some(id) = ancestor {
            if id == node {
                return Err(SceneError::CyclicParent { node, parent });
            }
            ancestor = self.parent(id);
        }

        if let Some(old) = self.parent(node).and_then(|p| self.get_mut(p)) {
            old.children.retain(|&c| c != node);
        }
        self.node_mut(parent)?.children.push(node);
        let (scale, rotation, translation) = (parent_world.inverse() * world).to_scale_rotation_translation();
        let n = self.node_mut(node)?;
        n.parent = Some(parent);
        n.local = Transform {
            translation,
            rotation,
            scale,
        };
        Ok(())
    }

    fn child_count(&self, node: NodeId) -> usize {
        self.get(node).map_or(0, |n| n.children.len())
    }

    fn child(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.get(node)?.children.get(index).copied()
    }

    fn world_position(&self, node: NodeId) -> Option<Vec3> {
        self.world_matrix(node).map(|m| m.w_axis.truncate())
    }

    fn set_world_position(&mut self, node: NodeId, position: Vec3) -> Result<(), SceneError> {
        let parent = self.get(node).ok_or(SceneError::StaleNode(node))?.parent;
        let local = match parent.and_then(|p| self.world_matrix(p)) {
            Some(parent_world) => parent_world.inverse().transform_point3(position),
            None => position,
        };
        self.node_mut(node)?.local.translation = local;
        Ok(())
    }

    fn world_rotation(&self, node: NodeId) -> Option<Quat> {
        let n = self.get(node)?;
        match n.parent {
            Some(parent) => Some(self.world_rotation(parent)? * n.local.rotation),
            None => Some(n.local.rotation),
        }
    }

    fn local_position(&self, node: NodeId) -> Option<Vec3> {
        self.get(node).map(|n| n.local.translation)
    }

    fn set_local_position(&mut self, node: NodeId, position: Vec3) -> Result<(), SceneError> {
        self.node_mut(node)?.local.translation = position;
        Ok(())
    }

    fn set_local_rotation(&mut self, node: NodeId, rotation: Quat) -> Result<(), SceneError> {
        self.node_mut(node)?.local.rotation = rotation;
        Ok(())
    }

    fn local_scale(&self, node: NodeId) -> Option<Vec3> {
        self.get(node).map(|n| n.local.scale)
    }

    fn set_local_scale(&mut self, node: NodeId, scale: Vec3) -> Result<(), SceneError> {
        self.node_mut(node)?.local.scale = scale;
        Ok(())
    }

    fn instantiate(&mut self, template: &Template, parent: NodeId) -> Result<NodeId, SceneError> {
        self.instantiate_node(template, parent)
    }

    fn is_enabled(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(|n| n.enabled)
    }

    fn set_enabled(&mut self, node: NodeId, enabled: bool) -> Result<(), SceneError> {
        self.node_mut(node)?.enabled = enabled;
        Ok(())
    }

    fn is_interactive(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(|n| n.interactive)
    }

    fn destroy(&mut self, node: NodeId) -> Result<(), SceneError> {
        let parent = self.get(node).ok_or(SceneError::StaleNode(node))?.parent;
        if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
            p.children.retain(|&c| c != node);
        }
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(removed) = self.release(id) {
                stack.extend(removed.children);
            }
        }
        Ok(())
    }
}
