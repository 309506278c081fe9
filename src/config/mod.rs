mod file_config;

pub use file_config::FileConfig;

use crate::etl::{CatalogRecordPolicy, ErrorPolicy, LoadOptions};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db: PathBuf,
    pub song_data: PathBuf,
    pub log_data: PathBuf,
    pub extension: String,
    pub continue_on_error: bool,
    pub catalog_records: CatalogRecordPolicy,
    pub progress_bar: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            db: PathBuf::from("sparkify.db"),
            song_data: PathBuf::from("data/song_data"),
            log_data: PathBuf::from("data/log_data"),
            extension: "json".to_string(),
            continue_on_error: false,
            catalog_records: CatalogRecordPolicy::default(),
            progress_bar: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub song_data: PathBuf,
    pub log_data: PathBuf,
    pub extension: String,
    pub error_policy: ErrorPolicy,
    pub catalog_records: CatalogRecordPolicy,
    pub progress_bar: bool,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file.db.map(PathBuf::from).unwrap_or_else(|| cli.db.clone());
        let song_data = file
            .song_data
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.song_data.clone());
        let log_data = file
            .log_data
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.log_data.clone());

        let extension = file
            .extension
            .unwrap_or_else(|| cli.extension.clone())
            .trim_start_matches('.')
            .to_string();
        if extension.is_empty() {
            bail!("extension must not be empty");
        }

        let catalog_records = match file.catalog_records {
            Some(s) => match parse_catalog_records(&s) {
                Some(policy) => policy,
                None => bail!("Unknown catalog_records value: {:?} (expected \"first\" or \"all\")", s),
            },
            None => cli.catalog_records,
        };

        let error_policy = if file.continue_on_error.unwrap_or(cli.continue_on_error) {
            ErrorPolicy::Continue
        } else {
            ErrorPolicy::Abort
        };

        let progress_bar = file.progress_bar.unwrap_or(cli.progress_bar);

        Ok(Self {
            db_path,
            song_data,
            log_data,
            extension,
            error_policy,
            catalog_records,
            progress_bar,
        })
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            extension: self.extension.clone(),
            error_policy: self.error_policy,
            catalog_records: self.catalog_records,
        }
    }
}

/// Uses clap's ValueEnum trait for parsing.
fn parse_catalog_records(s: &str) -> Option<CatalogRecordPolicy> {
    CatalogRecordPolicy::from_str(s, true).ok()
}
