//! Shelf Services Layer
//!
//! Host-side plumbing for the runtime: settings, snapshot persistence and
//! scripted interaction input.

pub mod input;
pub mod save;
pub mod settings;

pub use input::{InputEvent, InputScript};
pub use save::{SaveError, SnapshotSlot};
pub use settings::{AssetSettings, PersistenceSettings, Settings, SettingsError};
