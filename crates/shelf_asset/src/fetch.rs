//! Template fetching
//!
//! A [`TemplateFetcher`] resolves a [`RemoteTemplate`] into a [`Template`]
//! asynchronously. It reports success or failure only; there is no progress
//! reporting and no retry.

use crate::{AssetError, RemoteTemplate};
use shelf_core::scene::Template;
use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::pin::Pin;

/// Boxed future returned by fetchers.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Asynchronous source of remote templates.
pub trait TemplateFetcher: Send + Sync {
    fn fetch(&self, reference: &RemoteTemplate) -> BoxFuture<Result<Template, AssetError>>;
}

/// Serves `<root>/<name>.json` files as remote templates.
#[derive(Debug, Clone)]
pub struct DirectoryFetcher {
    root: PathBuf,
}

impl DirectoryFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl TemplateFetcher for DirectoryFetcher {
    fn fetch(&self, reference: &RemoteTemplate) -> BoxFuture<Result<Template, AssetError>> {
        let name = reference.name.clone();
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Box::pin(std::future::ready(Err(AssetError::InvalidName { name })));
        }
        let path = self.root.join(format!("{name}.json"));

        Box::pin(async move {
            let text = match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    return Err(AssetError::NotFound { name });
                }
                Err(source) => return Err(AssetError::Io { path, source }),
            };
            tracing::debug!(template = %name, path = %path.display(), "remote template read");
            serde_json::from_str(&text).map_err(|source| AssetError::Parse { name, source })
        })
    }
}

/// In-memory fetcher, resolving immediately from a name map.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    templates: HashMap<String, Template>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `template` under its own name.
    pub fn with_template(mut self, template: Template) -> Self {
        self.templates.insert(template.name.clone(), template);
        self
    }
}

impl TemplateFetcher for MemoryFetcher {
    fn fetch(&self, reference: &RemoteTemplate) -> BoxFuture<Result<Template, AssetError>> {
        let result = self
            .templates
            .get(&reference.name)
            .cloned()
            .ok_or_else(|| AssetError::NotFound {
                name: reference.name.clone(),
            });
        Box::pin(std::future::ready(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("shelf-asset-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn directory_fetcher_reads_json_templates() {
        let dir = scratch_dir("read");
        std::fs::write(dir.join("Turbine.json"), r#"{"name":"Turbine","interactive":true}"#).unwrap();

        let fetcher = DirectoryFetcher::new(&dir);
        let template = fetcher.fetch(&RemoteTemplate::new("Turbine")).await.unwrap();
        assert_eq!(template.name, "Turbine");
        assert!(template.interactive);

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn directory_fetcher_reports_missing_and_malformed() {
        let dir = scratch_dir("errors");
        std::fs::write(dir.join("Broken.json"), "{ not json").unwrap();
        let fetcher = DirectoryFetcher::new(&dir);

        let missing = fetcher.fetch(&RemoteTemplate::new("Nope")).await;
        assert!(matches!(missing, Err(AssetError::NotFound { .. })));

        let broken = fetcher.fetch(&RemoteTemplate::new("Broken")).await;
        assert!(matches!(broken, Err(AssetError::Parse { .. })));

        let escape = fetcher.fetch(&RemoteTemplate::new("../secret")).await;
        assert!(matches!(escape, Err(AssetError::InvalidName { .. })));

        std::fs::remove_dir_all(dir).ok();
    }

    #[tokio::test]
    async fn memory_fetcher_resolves_by_name() {
        let fetcher = MemoryFetcher::new().with_template(Template::new("Gear"));
        assert!(fetcher.fetch(&RemoteTemplate::new("Gear")).await.is_ok());
        assert!(fetcher.fetch(&RemoteTemplate::new("Cog")).await.is_err());
    }
}
