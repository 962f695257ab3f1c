use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when no path is given.
pub const CONFIG_FILE_NAME: &str = "sweep.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Keep `*_end` leaf transforms alive whenever their parent is.
    #[serde(default)]
    pub preserve_end_bones: bool,
    #[serde(default = "default_end_bone_suffix")]
    pub end_bone_suffix: String,
    #[serde(default = "default_true")]
    pub warn_unknown_kinds: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            preserve_end_bones: false,
            end_bone_suffix: default_end_bone_suffix(),
            warn_unknown_kinds: default_true(),
        }
    }
}

impl AnalysisConfig {
    /// `true` if a transform named `name` is an end bone under this config.
    #[must_use]
    pub fn is_end_bone(&self, name: &str) -> bool {
        if !self.preserve_end_bones || self.end_bone_suffix.is_empty() {
            return false;
        }
        let suffix = self.end_bone_suffix.to_lowercase();
        name.to_lowercase().ends_with(&suffix)
    }
}

/// Resolve which config file applies: the explicit path if given, otherwise
/// `sweep.toml` in `cwd`.
#[must_use]
pub fn config_path(explicit: Option<&Path>, cwd: &Path) -> PathBuf {
    explicit.map_or_else(|| cwd.join(CONFIG_FILE_NAME), Path::to_path_buf)
}

/// Load the analysis config.
///
/// A missing `sweep.toml` in `cwd` yields defaults. An explicit path must
/// exist.
///
/// # Errors
///
/// Returns an error naming the file if an explicit path does not exist, or
/// if the file cannot be read or parsed.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<AnalysisConfig> {
    let path = config_path(explicit, cwd);
    if !path.exists() {
        if explicit.is_some() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(AnalysisConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<AnalysisConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

const fn default_true() -> bool {
    true
}

fn default_end_bone_suffix() -> String {
    "end".to_string()
}
