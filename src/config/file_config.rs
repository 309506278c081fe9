use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Settings read from the optional `--config` TOML file. Every field can be
/// left out, in which case the CLI value is used.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub db: Option<String>,
    pub song_data: Option<String>,
    pub log_data: Option<String>,
    pub extension: Option<String>,
    pub continue_on_error: Option<bool>,
    /// "first" or "all".
    pub catalog_records: Option<String>,
    pub progress_bar: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
