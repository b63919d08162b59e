//! Shelf Asset Pipeline
//!
//! Catalog entries, local and remote template sources, asynchronous
//! template fetching, and catalog manifests.

pub mod download;
pub mod fetch;
pub mod manifest;
pub mod source;

pub use download::Download;
pub use fetch::{BoxFuture, DirectoryFetcher, MemoryFetcher, TemplateFetcher};
pub use manifest::{CatalogManifest, ManifestEntry};
pub use source::{CatalogEntry, RemoteTemplate, TemplateSource};

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while loading or fetching templates.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("remote template '{name}' was not found")]
    NotFound { name: String },

    #[error("remote template name '{name}' is not a plain file name")]
    InvalidName { name: String },

    #[error("failed to read '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{name}'")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no async runtime available to download '{name}'")]
    NoRuntime { name: String },

    #[error("download of '{name}' was cancelled")]
    Cancelled { name: String },
}
