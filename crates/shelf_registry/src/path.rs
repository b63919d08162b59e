//! Name-path addressing relative to an anchor node

use shelf_core::scene::{NodeId, SceneGraph};

pub const PATH_SEPARATOR: &str = "/";

/// Path from `anchor` (inclusive) down to `node`.
///
/// If `node` is not below `anchor`, the walk continues up to the scene root.
/// Unnamed nodes contribute the `(unnamed)` placeholder.
pub fn path_of<S: SceneGraph + ?Sized>(scene: &S, anchor: NodeId, node: NodeId) -> String {
    let mut names = Vec::new();
    let mut current = Some(node);
    while let Some(id) = current {
        names.push(scene.path_segment(id));
        if id == anchor {
            break;
        }
        current = scene.parent(id);
    }
    names.reverse();
    names.join(PATH_SEPARATOR)
}

/// Find the node addressed by `path` below `anchor`.
///
/// A leading segment equal to the anchor's name is consumed; otherwise the
/// whole path is taken relative to the anchor's children. Each segment
/// matches direct children only, first sibling wins.
pub fn resolve<S: SceneGraph + ?Sized>(scene: &S, anchor: NodeId, path: &str) -> Option<NodeId> {
    if path.is_empty() || !scene.contains(anchor) {
        return None;
    }
    let mut segments = path.split(PATH_SEPARATOR).peekable();
    if segments.peek() == Some(&scene.path_segment(anchor)) {
        segments.next();
    }
    segments.try_fold(anchor, |current, segment| scene.find_child(current, segment))
}
