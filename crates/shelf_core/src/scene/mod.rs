//! Scene graph
//!
//! [`SceneGraph`] is the narrow capability set the rest of Shelf consumes
//! from a host engine: tree navigation by name and index, world/local
//! transforms, template instantiation, and visibility. Nothing above this
//! trait needs global node identifiers.
//!
//! [`Scene`] is the in-memory implementation used by the runtime and tests.

mod graph;
mod node;
mod template;

pub use graph::Scene;
pub use node::NodeId;
pub use template::Template;

use crate::math::{Quat, Vec3};
use thiserror::Error;

/// Placeholder segment for nodes with an empty name.
pub const UNNAMED: &str = "(unnamed)";

/// Errors raised by scene mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("node {0} does not exist in this scene")]
    StaleNode(NodeId),

    #[error("cannot parent node {node} under its own descendant {parent}")]
    CyclicParent { node: NodeId, parent: NodeId },
}

/// Tree-navigation and transform capabilities provided by the host engine.
///
/// Read accessors return `None` (or a neutral value) for stale handles;
/// mutations return [`SceneError::StaleNode`].
pub trait SceneGraph {
    fn contains(&self, node: NodeId) -> bool;

    /// Node name; empty for unnamed nodes.
    fn name(&self, node: NodeId) -> Option<&str>;

    fn set_name(&mut self, node: NodeId, name: &str) -> Result<(), SceneError>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Move `node` to the end of `parent`'s children, keeping its world
    /// transform.
    fn set_parent(&mut self, node: NodeId, parent: NodeId) -> Result<(), SceneError>;

    fn child_count(&self, node: NodeId) -> usize;

    /// Child at `index`, in sibling order.
    fn child(&self, node: NodeId, index: usize) -> Option<NodeId>;

    fn world_position(&self, node: NodeId) -> Option<Vec3>;

    fn set_world_position(&mut self, node: NodeId, position: Vec3) -> Result<(), SceneError>;

    fn world_rotation(&self, node: NodeId) -> Option<Quat>;

    fn local_position(&self, node: NodeId) -> Option<Vec3>;

    fn set_local_position(&mut self, node: NodeId, position: Vec3) -> Result<(), SceneError>;

    fn set_local_rotation(&mut self, node: NodeId, rotation: Quat) -> Result<(), SceneError>;

    fn local_scale(&self, node: NodeId) -> Option<Vec3>;

    fn set_local_scale(&mut self, node: NodeId, scale: Vec3) -> Result<(), SceneError>;

    /// Create a copy of `template` as the last child of `parent`.
    fn instantiate(&mut self, template: &Template, parent: NodeId) -> Result<NodeId, SceneError>;

    fn is_enabled(&self, node: NodeId) -> bool;

    fn set_enabled(&mut self, node: NodeId, enabled: bool) -> Result<(), SceneError>;

    /// Whether the node carries an interaction component.
    fn is_interactive(&self, node: NodeId) -> bool;

    /// Destroy the node and all of its descendants.
    fn destroy(&mut self, node: NodeId) -> Result<(), SceneError>;

    /// Name used when building paths: the node name, or [`UNNAMED`].
    fn path_segment(&self, node: NodeId) -> &str {
        match self.name(node) {
            Some(name) if !name.is_empty() => name,
            _ => UNNAMED,
        }
    }

    /// First direct child whose path segment equals `name`.
    fn find_child(&self, node: NodeId, name: &str) -> Option<NodeId> {
        (0..self.child_count(node))
            .filter_map(|i| self.child(node, i))
            .find(|&child| self.path_segment(child) == name)
    }
}
