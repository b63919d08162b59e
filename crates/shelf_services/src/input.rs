//! Scripted interaction input
//!
//! Stands in for the interaction provider outside a headset: a JSON list of
//! grab/move/release and paging events, with items addressed by their
//! anchor-relative path.

use serde::{Deserialize, Serialize};
use shelf_core::math::Vec3;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum InputEvent {
    Grab {
        path: String,
        #[serde(default)]
        interactor: u32,
    },
    /// Move a node to a world position, as a carrying hand would.
    Move { path: String, to: Vec3 },
    Release {
        path: String,
        #[serde(default)]
        interactor: u32,
    },
    NextPage,
    PreviousPage,
    ShowPage { page: isize },
    /// Run the frame pump this many times.
    Frames { count: u32 },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputScript {
    #[serde(default)]
    pub events: Vec<InputEvent>,
}

impl InputScript {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Load a script. Any failure is logged and yields an empty script.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "input script not readable");
                return Self::default();
            }
        };
        match Self::parse(&text) {
            Ok(script) => {
                tracing::info!(path = %path.display(), events = script.events.len(), "input script loaded");
                script
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "input script is malformed");
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
