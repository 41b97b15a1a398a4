use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Contents of a `--config` file. Every key is optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub token: Option<String>,
    pub base: Option<String>,
    pub target: Option<String>,
    pub exclusion: Option<Vec<String>>,
    pub temp_branch: Option<String>,
}

pub fn read_config(config: &str) -> Result<FileConfig> {
    // An empty document deserializes to unit, not to an empty mapping.
    if config.trim().is_empty() {
        return Ok(FileConfig::default());
    }

    let parsed = serde_yaml::from_str(config).context("could not parse config")?;

    Ok(parsed)
}

pub fn read_config_file(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("could not read file `{}`", path.display()))?;

    read_config(&content).with_context(|| format!("invalid config file `{}`", path.display()))
}
