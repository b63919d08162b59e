//! Settings management

use serde::{Deserialize, Serialize};
use shelf_catalog::BrowserConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings '{}'", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Runtime settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub layout: BrowserConfig,
    pub assets: AssetSettings,
    pub persistence: PersistenceSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    /// Catalog manifest (spawner template plus entries).
    pub manifest: PathBuf,
    /// Directory served to remote entries as `<name>.json`. Remote entries
    /// fail to load when unset.
    pub template_dir: Option<PathBuf>,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("assets/catalog.json"),
            template_dir: Some(PathBuf::from("assets/templates")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceSettings {
    pub snapshot_path: PathBuf,
    /// Name of the node placements are recorded against.
    pub anchor: String,
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("placements.json"),
            anchor: "Anchor".to_string(),
        }
    }
}

impl Settings {
    pub fn parse(path: &Path, text: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "settings file not found, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let settings = Self::parse(path, &text)?;
        tracing::info!(path = %path.display(), "settings loaded");
        Ok(settings)
    }
}
