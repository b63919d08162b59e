//! Catalog manifests
//!
//! JSON description of a catalog: the spawner (slot) template plus one
//! entry per spawnable item, each embedded inline or referenced by name.

use crate::{AssetError, CatalogEntry};
use serde::{Deserialize, Serialize};
use shelf_core::scene::Template;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogManifest {
    /// Template instantiated once per catalog slot.
    #[serde(default)]
    pub spawner: Option<Template>,
    #[serde(default)]
    pub entries: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ManifestEntry {
    Local {
        template: Template,
        #[serde(default, rename = "modelId")]
        model_id: Option<String>,
    },
    Remote {
        name: String,
        #[serde(default, rename = "modelId")]
        model_id: Option<String>,
    },
}

impl ManifestEntry {
    pub fn to_catalog_entry(&self) -> CatalogEntry {
        let (entry, model_id) = match self {
            ManifestEntry::Local { template, model_id } => {
                (CatalogEntry::local(template.clone()), model_id)
            }
            ManifestEntry::Remote { name, model_id } => (CatalogEntry::remote(name.clone()), model_id),
        };
        match model_id {
            Some(id) if !id.is_empty() => entry.with_model_id(id.clone()),
            _ => entry,
        }
    }
}

impl CatalogManifest {
    pub fn parse(name: &str, text: &str) -> Result<Self, AssetError> {
        serde_json::from_str(text).map_err(|source| AssetError::Parse {
            name: name.to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let text = std::fs::read_to_string(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest = Self::parse(&path.display().to_string(), &text)?;
        tracing::info!(
            path = %path.display(),
            entries = manifest.entries.len(),
            "catalog manifest loaded"
        );
        Ok(manifest)
    }

    pub fn spawner_template(&self) -> Option<Arc<Template>> {
        self.spawner.clone().map(Arc::new)
    }

    pub fn catalog(&self) -> Vec<CatalogEntry> {
        self.entries.iter().map(ManifestEntry::to_catalog_entry).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "spawner": { "name": "Slot" },
        "entries": [
            { "type": "local", "template": { "name": "Gear", "interactive": true } },
            { "type": "remote", "name": "Turbine", "modelId": "turbine-v2" },
            { "type": "local", "template": { "name": "Cog" }, "modelId": "" }
        ]
    }"#;

    #[test]
    fn parses_local_and_remote_entries() {
        let manifest = CatalogManifest::parse("test", MANIFEST).unwrap();
        assert_eq!(manifest.spawner_template().unwrap().name, "Slot");

        let catalog = manifest.catalog();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog[0].model_id, "Gear");
        assert!(!catalog[0].source.is_remote());
        assert_eq!(catalog[1].model_id, "turbine-v2");
        assert!(catalog[1].source.is_remote());
        // Empty override falls back to the template name.
        assert_eq!(catalog[2].model_id, "Cog");
    }

    #[test]
    fn missing_spawner_is_allowed_at_parse_time() {
        let manifest = CatalogManifest::parse("test", r#"{"entries":[]}"#).unwrap();
        assert!(manifest.spawner_template().is_none());
        assert!(manifest.catalog().is_empty());
    }

    #[test]
    fn malformed_manifest_is_a_parse_error() {
        let err = CatalogManifest::parse("broken", "{").unwrap_err();
        assert!(matches!(err, AssetError::Parse { ref name, .. } if name == "broken"));
    }
}
