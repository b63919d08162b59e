//! Shelf Placement Registry
//!
//! Records where tracked scene nodes sit relative to a configurable anchor
//! and turns that record into a portable snapshot that can be re-applied to
//! a scene rebuilt in another session.
//!
//! ## Identity
//!
//! Scene nodes have no identifier that survives serialization, so a node is
//! addressed by the `/`-joined names from the anchor (inclusive) down to the
//! node. Because the path is relative to the anchor, a layout restores
//! correctly after the anchor moves, and several sub-scenes can share one
//! process as long as each has its own anchor.
//!
//! Sibling names under a tracked subtree must be unique. Duplicates are not
//! an error, but resolution always picks the first sibling with the name.

mod path;
mod registry;
mod snapshot;

pub use path::{path_of, resolve, PATH_SEPARATOR};
pub use registry::{PlacementRegistry, RestoreReport};
pub use snapshot::{Snapshot, SnapshotError, TrackedEntry, SNAPSHOT_VERSION};

use shelf_core::scene::{NodeId, SceneGraph};

/// Write access to a placement store, as needed by catalog items.
pub trait Placements {
    /// Record (or update) the placement of `node`, labelled `model_id`.
    fn register_object(&mut self, scene: &dyn SceneGraph, node: NodeId, model_id: &str);

    /// Drop the record at `node`'s current path. Call before the node moves
    /// to a new parent.
    fn unregister_object(&mut self, scene: &dyn SceneGraph, node: NodeId);
}
