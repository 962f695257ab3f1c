//! Snapshot loading shared by every analysis command.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use sweep_core::rules::plugin::host_kinds;
use sweep_core::{
    AnalysisConfig, GraphBuilder, RegistryBuilder, RuleRegistry, Scene, SceneSnapshot,
    SpringBonePlugin, load_config,
};
use sweep_liveness::Analysis;

/// Options shared by every command that analyzes a snapshot.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config: Option<PathBuf>,
    pub preserve_end_bones: bool,
}

/// A loaded scene together with the registry and config used to analyze it.
pub struct Loaded {
    pub scene: Scene,
    pub registry: RuleRegistry,
    pub config: AnalysisConfig,
}

impl Loaded {
    pub fn analyze(&self) -> Analysis {
        let builder = GraphBuilder::new(&self.registry, &self.config);
        Analysis::run(&builder, &self.scene)
    }
}

/// Read and validate the snapshot at `path`, resolve the config and build
/// a registry with every plugin the scene's host supports.
pub fn load(path: &Path, options: &LoadOptions, cwd: &Path) -> anyhow::Result<Loaded> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let snapshot = SceneSnapshot::from_json(&json)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
    let scene = Scene::from_snapshot(snapshot)
        .with_context(|| format!("Invalid scene in {}", path.display()))?;

    let mut config = load_config(options.config.as_deref(), cwd)?;
    if options.preserve_end_bones {
        config.preserve_end_bones = true;
    }

    let mut builder = RegistryBuilder::with_builtin().context("Failed to register builtin rules")?;
    let host = host_kinds(&scene);
    let spring = SpringBonePlugin::default();
    builder
        .plugin_for_host(&spring, &host)
        .context("Failed to register spring bone rules")?;
    let registry = builder.build().context("Failed to build rule registry")?;

    tracing::debug!(
        path = %path.display(),
        components = scene.component_count(),
        kinds = registry.kinds().len(),
        "loaded snapshot"
    );
    Ok(Loaded {
        scene,
        registry,
        config,
    })
}
