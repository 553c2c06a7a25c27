use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PathError, Result};
use crate::hierarchy::HierarchyConfig;
use crate::selection::policy::SelectionPolicy;

fn default_log_level() -> String {
    "info".to_string()
}

/// Contents of the TOML run file read by the command-line tool.
#[derive(Deserialize, Debug, Clone)]
pub struct RunConfig {
    /// JSON item table or a directory of `<id>.txt` word lists.
    pub items: PathBuf,
    /// JSON word -> level object or a `.txt` word list.
    pub mapping: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub hierarchy: HierarchyConfig,
    /// When absent the builder's default policy is used.
    #[serde(default)]
    pub policy: Option<SelectionPolicy>,
}

/// Reads and parses a run file. Relative input paths are resolved against
/// the directory holding the file and must exist.
pub fn load_config_from_file(file_path: &Path) -> Result<RunConfig> {
    let contents = fs::read_to_string(file_path).map_err(|e| PathError::io(file_path, e))?;
    let mut config: RunConfig = toml::from_str(&contents)
        .map_err(|source| PathError::Toml { path: file_path.to_path_buf(), source })?;

    let base_dir = file_path.parent().unwrap_or_else(|| Path::new("."));
    config.items = resolve_existing(base_dir, &config.items)?;
    config.mapping = resolve_existing(base_dir, &config.mapping)?;
    Ok(config)
}

fn resolve_existing(base_dir: &Path, path: &Path) -> Result<PathBuf> {
    let resolved = if path.is_absolute() { path.to_path_buf() } else { base_dir.join(path) };
    // Surface a missing input here rather than halfway through loading.
    fs::metadata(&resolved).map_err(|e| PathError::io(&resolved, e))?;
    Ok(resolved)
}
