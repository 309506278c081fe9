//! Directory-level loading: one transaction per discovered file.

use super::discover::find_files;
use super::error::EtlError;
use super::progress::ProgressReporter;
use super::transform::FileRows;
use crate::warehouse::{SongLookup, SqliteWarehouse, TableCounts};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// What to do when a single file fails to load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop the whole run at the first failing file.
    #[default]
    Abort,
    /// Roll back the failing file, log it and move on to the next one.
    Continue,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub root: PathBuf,
    pub files_found: usize,
    pub files_loaded: usize,
    pub files_failed: usize,
    /// Rows actually added per table. Upserted users count once per write.
    pub rows: TableCounts,
}

pub struct Loader<'a> {
    warehouse: &'a mut SqliteWarehouse,
    progress: &'a mut dyn ProgressReporter,
    error_policy: ErrorPolicy,
}

impl<'a> Loader<'a> {
    pub fn new(
        warehouse: &'a mut SqliteWarehouse,
        progress: &'a mut dyn ProgressReporter,
        error_policy: ErrorPolicy,
    ) -> Self {
        Loader {
            warehouse,
            progress,
            error_policy,
        }
    }

    /// Loads every `extension` file under `root`, in discovery order.
    ///
    /// Each file is transformed and written inside its own transaction, which
    /// is committed only once all of the file's rows are written. Progress is
    /// reported after every file.
    pub fn load_dir<F>(
        &mut self,
        root: &Path,
        extension: &str,
        mut transform: F,
    ) -> Result<LoadSummary, EtlError>
    where
        F: FnMut(&Path, &dyn SongLookup) -> Result<FileRows, EtlError>,
    {
        let files = find_files(root, extension)?;
        let total = files.len();
        self.progress.files_found(root, total);

        let mut summary = LoadSummary {
            root: root.to_path_buf(),
            files_found: total,
            ..Default::default()
        };

        for (index, path) in files.iter().enumerate() {
            match self.load_file(path, &mut transform) {
                Ok(rows) => {
                    summary.files_loaded += 1;
                    summary.rows += rows;
                }
                Err(err) => match self.error_policy {
                    ErrorPolicy::Abort => return Err(err),
                    ErrorPolicy::Continue => {
                        error!("Skipping {:?}: {}", path, err);
                        summary.files_failed += 1;
                    }
                },
            }
            self.progress.file_processed(index + 1, total);
        }

        self.progress.finished(&summary);
        Ok(summary)
    }

    fn load_file<F>(&mut self, path: &Path, transform: &mut F) -> Result<TableCounts, EtlError>
    where
        F: FnMut(&Path, &dyn SongLookup) -> Result<FileRows, EtlError>,
    {
        let tx = self.warehouse.begin_file().map_err(EtlError::store(path))?;
        let rows = transform(path, &tx)?;
        let counts = rows.write_to(&tx).map_err(EtlError::store(path))?;
        tx.commit().map_err(EtlError::store(path))?;
        debug!("Loaded {:?}: {:?}", path, counts);
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::transform::{transform_catalog_file, CatalogRecordPolicy};
    use std::fs;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingProgress {
        found: Vec<usize>,
        processed: Vec<(usize, usize)>,
        finished: usize,
    }

    impl ProgressReporter for RecordingProgress {
        fn files_found(&mut self, _root: &Path, total: usize) {
            self.found.push(total);
        }

        fn file_processed(&mut self, processed: usize, total: usize) {
            self.processed.push((processed, total));
        }

        fn finished(&mut self, _summary: &LoadSummary) {
            self.finished += 1;
        }
    }

    fn song_line(song_id: &str) -> String {
        format!(
            r#"{{"artist_id": "AR1", "artist_latitude": null, "artist_longitude": null, "artist_location": "", "artist_name": "A", "song_id": "{}", "title": "T {}", "duration": 100.5, "year": 2001}}"#,
            song_id, song_id
        )
    }

    fn catalog_dir(songs: &[(&str, String)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (relative, content) in songs {
            let path = dir.path().join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    fn catalog_transform(path: &Path, _: &dyn SongLookup) -> Result<FileRows, EtlError> {
        transform_catalog_file(path, CatalogRecordPolicy::First).map(FileRows::Catalog)
    }

    #[test]
    fn test_load_dir_commits_each_file_and_reports_progress() {
        let dir = catalog_dir(&[
            ("A/A/SO1.json", song_line("SO1")),
            ("A/B/SO2.json", song_line("SO2")),
            ("B/SO3.json", song_line("SO3")),
        ]);
        let mut warehouse = SqliteWarehouse::open_in_memory().unwrap();
        let mut progress = RecordingProgress::default();

        let summary = Loader::new(&mut warehouse, &mut progress, ErrorPolicy::Abort)
            .load_dir(dir.path(), "json", catalog_transform)
            .unwrap();

        assert_eq!(summary.files_found, 3);
        assert_eq!(summary.files_loaded, 3);
        assert_eq!(summary.files_failed, 0);
        assert_eq!(summary.rows.songs, 3);
        // One artist shared by every file
        assert_eq!(summary.rows.artists, 1);

        assert_eq!(progress.found, vec![3]);
        assert_eq!(progress.processed, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(progress.finished, 1);

        let counts = warehouse.counts().unwrap();
        assert_eq!(counts.songs, 3);
        assert_eq!(counts.artists, 1);
    }

    #[test]
    fn test_load_dir_aborts_on_first_failure() {
        let dir = catalog_dir(&[
            ("1.json", song_line("SO1")),
            ("2.json", "{broken".to_string()),
            ("3.json", song_line("SO3")),
        ]);
        let mut warehouse = SqliteWarehouse::open_in_memory().unwrap();
        let mut progress = RecordingProgress::default();

        let result = Loader::new(&mut warehouse, &mut progress, ErrorPolicy::Abort).load_dir(
            dir.path(),
            "json",
            catalog_transform,
        );

        assert!(matches!(result, Err(EtlError::Json { .. })));
        assert_eq!(progress.processed, vec![(1, 3)]);
        assert_eq!(progress.finished, 0);
        // The first file was committed before the failure
        assert_eq!(warehouse.counts().unwrap().songs, 1);
        assert!(warehouse.get_song("SO3").unwrap().is_none());
    }

    #[test]
    fn test_load_dir_continue_policy_skips_failed_files() {
        let dir = catalog_dir(&[
            ("1.json", song_line("SO1")),
            ("2.json", "{broken".to_string()),
            ("3.json", song_line("SO3")),
        ]);
        let mut warehouse = SqliteWarehouse::open_in_memory().unwrap();
        let mut progress = RecordingProgress::default();

        let summary = Loader::new(&mut warehouse, &mut progress, ErrorPolicy::Continue)
            .load_dir(dir.path(), "json", catalog_transform)
            .unwrap();

        assert_eq!(summary.files_loaded, 2);
        assert_eq!(summary.files_failed, 1);
        assert_eq!(progress.processed, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(warehouse.counts().unwrap().songs, 2);
    }

    #[test]
    fn test_failed_write_rolls_back_the_whole_file() {
        let dir = catalog_dir(&[("1.json", song_line("SO1"))]);
        let mut warehouse = SqliteWarehouse::open_in_memory().unwrap();
        let mut progress = RecordingProgress::default();

        // An orphan song violates the artist foreign key after its artist row was written
        let orphan = |path: &Path, _: &dyn SongLookup| -> Result<FileRows, EtlError> {
            let mut rows = transform_catalog_file(path, CatalogRecordPolicy::First)?;
            let mut song = rows.songs[0].clone();
            song.song_id = "SO_ORPHAN".to_string();
            song.artist_id = "AR_MISSING".to_string();
            rows.songs.push(song);
            Ok(FileRows::Catalog(rows))
        };

        let result = Loader::new(&mut warehouse, &mut progress, ErrorPolicy::Abort).load_dir(
            dir.path(),
            "json",
            orphan,
        );

        assert!(matches!(result, Err(EtlError::Store { .. })));
        assert_eq!(warehouse.counts().unwrap(), TableCounts::default());
    }

    #[test]
    fn test_load_dir_missing_root() {
        let dir = TempDir::new().unwrap();
        let mut warehouse = SqliteWarehouse::open_in_memory().unwrap();
        let mut progress = RecordingProgress::default();

        let result = Loader::new(&mut warehouse, &mut progress, ErrorPolicy::Continue).load_dir(
            &dir.path().join("missing"),
            "json",
            catalog_transform,
        );

        assert!(matches!(result, Err(EtlError::Discover(_))));
        assert!(progress.found.is_empty());
    }
}
