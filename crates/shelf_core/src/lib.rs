//! Shelf Core
//!
//! Contains the fundamental building blocks shared by every Shelf crate:
//! - Scene-graph capability trait and the in-memory scene
//! - Templates (prefabs) that can be instantiated into a scene
//! - Transform math
//! - Synchronous listener lists for item notifications

pub mod event;
pub mod math;
pub mod scene;

pub use glam;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
