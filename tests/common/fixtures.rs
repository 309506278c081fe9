//! Test fixture creation for input directories and warehouses

use anyhow::Result;
use serde_json::json;
use sparkify_etl::etl::{EtlError, EtlPipeline, LoadOptions, PipelineSummary, TracingProgress};
use sparkify_etl::warehouse::SqliteWarehouse;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory holding a catalog root, a log root and a database path.
pub struct TestWorkspace {
    // Keep the directory alive for the lifetime of the workspace
    _dir: TempDir,
    pub song_data: PathBuf,
    pub log_data: PathBuf,
    pub db_path: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let song_data = dir.path().join("song_data");
        let log_data = dir.path().join("log_data");
        fs::create_dir_all(&song_data).expect("Failed to create song_data");
        fs::create_dir_all(&log_data).expect("Failed to create log_data");
        let db_path = dir.path().join("sparkify.db");
        Self {
            _dir: dir,
            song_data,
            log_data,
            db_path,
        }
    }

    /// Writes a catalog file at `relative` under the catalog root.
    pub fn add_song(&self, relative: &str, record: &str) -> PathBuf {
        write_file(&self.song_data, relative, record)
    }

    /// Writes a log file at `relative` under the log root, one event per line.
    pub fn add_log(&self, relative: &str, events: &[String]) -> PathBuf {
        write_file(&self.log_data, relative, &events.join("\n"))
    }

    pub fn open_warehouse(&self) -> Result<SqliteWarehouse> {
        SqliteWarehouse::open(&self.db_path)
    }

    pub fn run(&self, options: LoadOptions) -> Result<PipelineSummary, EtlError> {
        let mut warehouse = self.open_warehouse().map_err(|source| EtlError::Connection {
            path: self.db_path.clone(),
            source,
        })?;
        EtlPipeline::new(&mut warehouse, options, Box::new(TracingProgress))
            .run(&self.song_data, &self.log_data)
    }

    pub fn run_default(&self) -> Result<PipelineSummary, EtlError> {
        self.run(LoadOptions::default())
    }
}

fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(&path, content).expect("Failed to write fixture file");
    path
}

/// One catalog record, as found in the song dataset.
pub fn song_record(
    song_id: &str,
    artist_id: &str,
    artist_name: &str,
    title: &str,
    duration: f64,
) -> String {
    json!({
        "num_songs": 1,
        "artist_id": artist_id,
        "artist_latitude": 48.85693,
        "artist_longitude": 2.3412,
        "artist_location": "Paris, France",
        "artist_name": artist_name,
        "song_id": song_id,
        "title": title,
        "duration": duration,
        "year": 1965,
    })
    .to_string()
}

/// A `NextSong` event, as found in the log dataset.
pub fn next_song_event(
    ts: i64,
    user_id: &str,
    first_name: &str,
    level: &str,
    artist: &str,
    song: &str,
    length: f64,
) -> String {
    json!({
        "artist": artist,
        "auth": "Logged In",
        "firstName": first_name,
        "gender": "F",
        "itemInSession": 0,
        "lastName": "Koch",
        "length": length,
        "level": level,
        "location": "Chicago-Naperville-Elgin, IL-IN-WI",
        "method": "PUT",
        "page": "NextSong",
        "registration": 1540893000000.0,
        "sessionId": 818,
        "song": song,
        "status": 200,
        "ts": ts,
        "userAgent": "\"Mozilla/5.0 (X11; Linux x86_64)\"",
        "userId": user_id,
    })
    .to_string()
}

/// A non-`NextSong` event. Such events carry no song fields.
pub fn page_event(ts: i64, user_id: &str, page: &str) -> String {
    json!({
        "artist": null,
        "auth": "Logged In",
        "firstName": "Lily",
        "gender": "F",
        "itemInSession": 1,
        "lastName": "Koch",
        "length": null,
        "level": "paid",
        "location": "Chicago-Naperville-Elgin, IL-IN-WI",
        "method": "GET",
        "page": page,
        "sessionId": 818,
        "song": null,
        "status": 200,
        "ts": ts,
        "userAgent": "\"Mozilla/5.0 (X11; Linux x86_64)\"",
        "userId": user_id,
    })
    .to_string()
}
