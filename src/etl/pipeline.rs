//! The two-phase load: catalog first, then session logs.
//!
//! Song play resolution only sees songs that are already committed, so the
//! catalog pass has to finish before the log pass starts. `EtlPipeline` makes
//! that ordering part of its type: `load_logs` only exists on the pipeline
//! returned by `load_catalog`.

use super::error::EtlError;
use super::loader::{ErrorPolicy, LoadSummary, Loader};
use super::progress::ProgressReporter;
use super::transform::{transform_catalog_file, transform_log_file, CatalogRecordPolicy, FileRows};
use crate::warehouse::{SqliteWarehouse, TableCounts};
use std::path::Path;
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadOptions {
    /// Extension of the input files, without the leading dot.
    pub extension: String,
    pub error_policy: ErrorPolicy,
    pub catalog_records: CatalogRecordPolicy,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            extension: "json".to_string(),
            error_policy: ErrorPolicy::default(),
            catalog_records: CatalogRecordPolicy::default(),
        }
    }
}

/// Pipeline state before the catalog pass.
pub struct Pending;

/// Pipeline state once the catalog pass has committed.
pub struct CatalogLoaded {
    catalog: LoadSummary,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineSummary {
    pub catalog: LoadSummary,
    pub logs: LoadSummary,
    /// Row counts of the warehouse after both passes.
    pub table_counts: TableCounts,
}

pub struct EtlPipeline<'w, S> {
    warehouse: &'w mut SqliteWarehouse,
    options: LoadOptions,
    progress: Box<dyn ProgressReporter>,
    state: S,
}

impl<'w> EtlPipeline<'w, Pending> {
    pub fn new(
        warehouse: &'w mut SqliteWarehouse,
        options: LoadOptions,
        progress: Box<dyn ProgressReporter>,
    ) -> Self {
        EtlPipeline {
            warehouse,
            options,
            progress,
            state: Pending,
        }
    }

    /// Loads every catalog file under `dir`.
    pub fn load_catalog(mut self, dir: &Path) -> Result<EtlPipeline<'w, CatalogLoaded>, EtlError> {
        info!("Loading song catalog from {}", dir.display());
        let policy = self.options.catalog_records;
        let catalog = Loader::new(
            self.warehouse,
            self.progress.as_mut(),
            self.options.error_policy,
        )
        .load_dir(dir, &self.options.extension, |path, _| {
            transform_catalog_file(path, policy).map(FileRows::Catalog)
        })?;

        Ok(EtlPipeline {
            warehouse: self.warehouse,
            options: self.options,
            progress: self.progress,
            state: CatalogLoaded { catalog },
        })
    }

    /// Catalog pass followed by the log pass.
    pub fn run(self, catalog_dir: &Path, log_dir: &Path) -> Result<PipelineSummary, EtlError> {
        self.load_catalog(catalog_dir)?.load_logs(log_dir)
    }
}

impl EtlPipeline<'_, CatalogLoaded> {
    pub fn catalog_summary(&self) -> &LoadSummary {
        &self.state.catalog
    }

    /// Loads every session log file under `dir`, resolving song plays against
    /// the catalog loaded by the previous pass.
    pub fn load_logs(mut self, dir: &Path) -> Result<PipelineSummary, EtlError> {
        info!("Loading session logs from {}", dir.display());
        let logs = Loader::new(
            self.warehouse,
            self.progress.as_mut(),
            self.options.error_policy,
        )
        .load_dir(dir, &self.options.extension, |path, lookup| {
            transform_log_file(path, lookup).map(FileRows::Log)
        })?;

        let table_counts = self.warehouse.counts().map_err(EtlError::store(dir))?;
        Ok(PipelineSummary {
            catalog: self.state.catalog,
            logs,
            table_counts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::progress::TracingProgress;
    use std::fs;
    use tempfile::TempDir;

    const SONG_LINE: &str = r#"{"num_songs": 1, "artist_id": "AR1", "artist_latitude": null, "artist_longitude": null, "artist_location": "", "artist_name": "Artist", "song_id": "SO1", "title": "Title", "duration": 200.0, "year": 2004}"#;

    fn log_line(ts: i64, song: &str, length: f64) -> String {
        serde_json::json!({
            "artist": "Artist",
            "firstName": "Lily",
            "gender": "F",
            "lastName": "Koch",
            "length": length,
            "level": "paid",
            "location": "Chicago-Naperville-Elgin, IL-IN-WI",
            "page": "NextSong",
            "sessionId": 818,
            "song": song,
            "ts": ts,
            "userAgent": "Mozilla/5.0",
            "userId": "15",
        })
        .to_string()
    }

    struct Inputs {
        _dir: TempDir,
        songs: std::path::PathBuf,
        logs: std::path::PathBuf,
    }

    fn inputs(log_lines: &[String]) -> Inputs {
        let dir = TempDir::new().unwrap();
        let songs = dir.path().join("song_data");
        let logs = dir.path().join("log_data");
        fs::create_dir_all(songs.join("A/B")).unwrap();
        fs::create_dir_all(&logs).unwrap();
        fs::write(songs.join("A/B/SO1.json"), SONG_LINE).unwrap();
        fs::write(logs.join("2018-11-15-events.json"), log_lines.join("\n")).unwrap();
        Inputs {
            _dir: dir,
            songs,
            logs,
        }
    }

    fn pipeline(warehouse: &mut SqliteWarehouse) -> EtlPipeline<'_, Pending> {
        EtlPipeline::new(warehouse, LoadOptions::default(), Box::new(TracingProgress))
    }

    #[test]
    fn test_run_loads_catalog_then_logs() {
        let inputs = inputs(&[
            log_line(1542241826796, "Title", 200.0),
            log_line(1542242481796, "Unknown", 180.0),
        ]);
        let mut warehouse = SqliteWarehouse::open_in_memory().unwrap();

        let summary = pipeline(&mut warehouse)
            .run(&inputs.songs, &inputs.logs)
            .unwrap();

        assert_eq!(summary.catalog.files_loaded, 1);
        assert_eq!(summary.logs.files_loaded, 1);
        assert_eq!(
            summary.table_counts,
            TableCounts {
                songs: 1,
                artists: 1,
                users: 1,
                time: 2,
                songplays: 2,
            }
        );

        let plays = warehouse.get_songplays().unwrap();
        assert_eq!(plays[0].song_id.as_deref(), Some("SO1"));
        assert_eq!(plays[0].artist_id.as_deref(), Some("AR1"));
        assert_eq!(plays[1].song_id, None);
    }

    #[test]
    fn test_catalog_summary_is_available_between_passes() {
        let inputs = inputs(&[log_line(1542241826796, "Title", 200.0)]);
        let mut warehouse = SqliteWarehouse::open_in_memory().unwrap();

        let loaded = pipeline(&mut warehouse).load_catalog(&inputs.songs).unwrap();
        assert_eq!(loaded.catalog_summary().files_found, 1);
        assert_eq!(loaded.catalog_summary().rows.songs, 1);

        let summary = loaded.load_logs(&inputs.logs).unwrap();
        assert_eq!(summary.catalog.rows.artists, 1);
        assert_eq!(summary.logs.rows.songplays, 1);
    }

    #[test]
    fn test_missing_log_dir_fails_after_catalog_commit() {
        let inputs = inputs(&[]);
        let mut warehouse = SqliteWarehouse::open_in_memory().unwrap();

        let result = pipeline(&mut warehouse).run(&inputs.songs, &inputs.songs.join("missing"));

        assert!(matches!(result, Err(EtlError::Discover(_))));
        assert_eq!(warehouse.counts().unwrap().songs, 1);
    }
}
