//! Shelf Catalog
//!
//! The interactive half of Shelf:
//! - [`Item`]: per-instance grab/release state machine
//! - [`Spawner`]: one catalog slot that keeps a fresh instance available and
//!   respawns when the current one is carried away
//! - [`Browser`]: owns every spawner and pages them through a grid
//!
//! Everything here runs on the frame loop's thread. Scene access is passed
//! into each call rather than stored, so no component outlives or aliases
//! the scene it operates on.

pub mod browser;
pub mod config;
pub mod item;
pub mod spawner;

pub use browser::{Browser, ItemIndex, CARRY_ROOT_NAME};
pub use config::BrowserConfig;
pub use item::{GrabState, InteractorEvent, Item, ItemBehavior, ItemNotification};
pub use spawner::{SpawnRegistrar, Spawner, SpawnerState, GRAB_SCALE_FACTOR, REMOTE_UNIT_SCALE, SPAWN_SCALE_FACTOR};

use shelf_core::scene::{NodeId, SceneError};
use shelf_registry::Placements;
use thiserror::Error;

/// Fatal configuration errors raised while building the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog has no entries")]
    EmptyCatalog,

    #[error("spawner template is not set")]
    MissingSpawnerTemplate,

    #[error("invalid layout: {0}")]
    InvalidLayout(&'static str),

    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Errors raised when attaching an item to a scene node.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ItemError {
    #[error("node {node} has no interaction component")]
    MissingInteractable { node: NodeId },
}

/// Log a failed scene mutation; the caller carries on.
pub(crate) fn warn_on_scene_error(result: Result<(), SceneError>, action: &str) {
    if let Err(e) = result {
        tracing::warn!(error = %e, action, "scene update failed");
    }
}

/// Shorten an optional placement store borrow so it can be passed on more
/// than once.
pub(crate) fn reborrow_placements<'a>(
    placements: &'a mut Option<&mut dyn Placements>,
) -> Option<&'a mut dyn Placements> {
    match placements {
        Some(placements) => Some(&mut **placements),
        None => None,
    }
}
