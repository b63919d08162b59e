//! Shelf Runtime
//!
//! Headless host: builds the catalog scene, restores saved placements,
//! replays scripted interaction and writes the placements back.
//!
//! Usage: `shelf [settings.json] [input.json]`

use anyhow::{Context, Result};
use shelf_asset::{CatalogManifest, DirectoryFetcher, TemplateFetcher};
use shelf_catalog::{Browser, InteractorEvent, SpawnerState};
use shelf_core::scene::{NodeId, Scene, SceneGraph};
use shelf_registry::{PlacementRegistry, Snapshot};
use shelf_services::{InputEvent, InputScript, Settings, SnapshotSlot};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const FRAME: Duration = Duration::from_millis(16);
const MAX_SETTLE_FRAMES: u32 = 600;

struct Session {
    scene: Scene,
    browser: Browser,
    registry: PlacementRegistry,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let settings_path = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("settings.json"));
    let input_path = args.next().map(PathBuf::from);

    tracing::info!("Shelf v{}", shelf_core::VERSION);
    let settings = Settings::load(&settings_path).context("loading settings")?;
    let manifest = CatalogManifest::load(&settings.assets.manifest).context("loading catalog manifest")?;

    let mut scene = Scene::new();
    let world = scene.create_node("World", None)?;
    let anchor = scene.create_node(&settings.persistence.anchor, Some(world))?;
    let root = scene.create_node("Catalog", Some(anchor))?;
    let next = scene.create_node("NextPage", Some(anchor))?;
    let previous = scene.create_node("PreviousPage", Some(anchor))?;

    let mut browser = Browser::new(
        &mut scene,
        root,
        settings.layout.clone(),
        manifest.spawner_template(),
        manifest.catalog(),
    )
    .context("building catalog browser")?;
    browser.set_navigation(&mut scene, Some(next), Some(previous));

    let fetcher: Option<Arc<dyn TemplateFetcher>> = settings
        .assets
        .template_dir
        .clone()
        .map(|dir| Arc::new(DirectoryFetcher::new(dir)) as Arc<dyn TemplateFetcher>);
    let mut registry = PlacementRegistry::new(anchor);
    browser.start(&mut scene, fetcher.as_ref(), Some(&mut registry));

    let mut session = Session { scene, browser, registry };
    session.settle().await;

    let slot = SnapshotSlot::new(&settings.persistence.snapshot_path);
    if let Some(text) = slot.read()? {
        session.restore(&text);
    }

    if let Some(path) = input_path {
        let script = InputScript::load(&path);
        for event in script.events {
            session.play(event).await;
        }
    }

    let text = session
        .registry
        .snapshot_to_string(&session.scene)
        .context("encoding placements")?;
    slot.write(&text)?;

    session.browser.shutdown();
    for (name, value) in session.browser.metrics().iter() {
        tracing::info!(counter = %name, value, "catalog metric");
    }
    tracing::info!(tracked = session.registry.len(), "runtime finished");
    Ok(())
}

impl Session {
    async fn frame(&mut self) {
        self.browser.update(&mut self.scene, Some(&mut self.registry));
        tokio::time::sleep(FRAME).await;
    }

    /// Pump frames until no download is pending.
    async fn settle(&mut self) {
        for _ in 0..MAX_SETTLE_FRAMES {
            let pending = self
                .browser
                .spawners()
                .iter()
                .any(|s| s.state() == SpawnerState::Downloading);
            if !pending {
                return;
            }
            self.frame().await;
        }
        tracing::warn!("downloads still pending, continuing without them");
    }

    /// Rebuild carried items the saved layout names, then move everything
    /// it records into place.
    fn restore(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        let snapshot = match Snapshot::parse(text) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "saved placements are unreadable, starting fresh");
                return;
            }
        };
        self.browser.restore_carried(&mut self.scene, &self.registry, &snapshot);
        let report = self.registry.apply(&mut self.scene, &snapshot);
        tracing::info!(restored = report.restored, skipped = report.skipped, "saved placements restored");
    }

    fn node(&self, path: &str) -> Option<NodeId> {
        let node = self.registry.resolve(&self.scene, path);
        if node.is_none() {
            tracing::warn!(path, "scripted input names an unknown node");
        }
        node
    }

    async fn play(&mut self, event: InputEvent) {
        match event {
            InputEvent::Grab { path, interactor } => {
                if let Some(node) = self.node(&path) {
                    self.browser.grab_start(
                        &mut self.scene,
                        node,
                        InteractorEvent { interactor },
                        Some(&mut self.registry),
                    );
                }
            }
            InputEvent::Move { path, to } => {
                if let Some(node) = self.node(&path) {
                    if let Err(e) = self.scene.set_world_position(node, to) {
                        tracing::warn!(path = %path, error = %e, "scripted move failed");
                    }
                }
            }
            InputEvent::Release { path, interactor } => {
                if let Some(node) = self.node(&path) {
                    self.browser.grab_end(
                        &mut self.scene,
                        node,
                        InteractorEvent { interactor },
                        Some(&mut self.registry),
                    );
                }
            }
            InputEvent::NextPage => self.browser.next_page(&mut self.scene),
            InputEvent::PreviousPage => self.browser.previous_page(&mut self.scene),
            InputEvent::ShowPage { page } => self.browser.show_page(&mut self.scene, page),
            InputEvent::Frames { count } => {
                for _ in 0..count {
                    self.frame().await;
                }
            }
        }
    }
}
