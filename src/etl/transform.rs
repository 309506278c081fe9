//! Per-file transformation of input records into warehouse rows.

use super::error::{EtlError, RecordError};
use super::records::{
    is_next_song, read_json_lines, CatalogRecord, LogRecord, RawCatalogRecord, RawLogRecord,
};
use crate::warehouse::{
    Artist, FileTransaction, Song, SongLookup, SongPlay, TableCounts, TimeEntry, User,
};
use clap::ValueEnum;
use serde_json::Value;
use std::path::Path;
use tracing::warn;

/// How many records of a catalog file are loaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum CatalogRecordPolicy {
    /// Only the first record; any further records are dropped with a warning.
    #[default]
    First,
    /// Every record in the file.
    All,
}

#[derive(Debug, Default, PartialEq)]
pub struct CatalogRows {
    pub songs: Vec<Song>,
    pub artists: Vec<Artist>,
}

#[derive(Debug, Default, PartialEq)]
pub struct LogRows {
    pub time: Vec<TimeEntry>,
    pub users: Vec<User>,
    pub songplays: Vec<SongPlay>,
}

/// The rows produced from one input file.
#[derive(Debug, PartialEq)]
pub enum FileRows {
    Catalog(CatalogRows),
    Log(LogRows),
}

impl FileRows {
    /// Writes every row through `tx` and returns how many rows each table gained.
    ///
    /// Artists go before songs and time/users before song plays, so foreign
    /// keys always point at rows that already exist.
    pub fn write_to(&self, tx: &FileTransaction) -> rusqlite::Result<TableCounts> {
        let mut counts = TableCounts::default();
        match self {
            FileRows::Catalog(rows) => {
                for artist in &rows.artists {
                    counts.artists += tx.insert_artist(artist)? as usize;
                }
                for song in &rows.songs {
                    counts.songs += tx.insert_song(song)? as usize;
                }
            }
            FileRows::Log(rows) => {
                for entry in &rows.time {
                    counts.time += tx.insert_time(entry)? as usize;
                }
                for user in &rows.users {
                    tx.upsert_user(user)?;
                    counts.users += 1;
                }
                for play in &rows.songplays {
                    tx.insert_songplay(play)?;
                    counts.songplays += 1;
                }
            }
        }
        Ok(counts)
    }
}

fn record_error(path: &Path, line: usize) -> impl FnOnce(RecordError) -> EtlError + '_ {
    move |source| EtlError::Record {
        path: path.to_path_buf(),
        line,
        source,
    }
}

/// Turns one catalog file into its song and artist rows.
pub fn transform_catalog_file(
    path: &Path,
    policy: CatalogRecordPolicy,
) -> Result<CatalogRows, EtlError> {
    let mut raw_records = read_json_lines::<RawCatalogRecord>(path)?;
    if raw_records.is_empty() {
        return Err(record_error(path, 0)(RecordError::EmptyFile));
    }
    if policy == CatalogRecordPolicy::First && raw_records.len() > 1 {
        warn!(
            "{:?} holds {} records, only the first one is loaded",
            path,
            raw_records.len()
        );
        raw_records.truncate(1);
    }

    let mut rows = CatalogRows::default();
    for (line, raw) in raw_records {
        let CatalogRecord { song, artist } = raw.validate().map_err(record_error(path, line))?;
        rows.songs.push(song);
        rows.artists.push(artist);
    }
    Ok(rows)
}

/// Turns one session log file into time, user and song play rows.
///
/// Only `NextSong` events produce rows. Each play is resolved against the
/// catalog through `lookup`; a miss leaves the song and artist ids empty.
pub fn transform_log_file(path: &Path, lookup: &dyn SongLookup) -> Result<LogRows, EtlError> {
    let mut records: Vec<LogRecord> = Vec::new();
    for (line, event) in read_json_lines::<Value>(path)? {
        if !is_next_song(&event) {
            continue;
        }
        let raw: RawLogRecord = serde_json::from_value(event).map_err(|source| EtlError::Json {
            path: path.to_path_buf(),
            line,
            source,
        })?;
        records.push(raw.validate().map_err(record_error(path, line))?);
    }

    let mut rows = LogRows::default();
    for record in &records {
        rows.time.push(record.time.clone());
    }
    for record in &records {
        rows.users.push(User {
            user_id: record.user_id.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            gender: record.gender,
            level: record.level,
        });
    }
    for record in records {
        let resolved = lookup
            .find_song(&record.song, &record.artist, record.length)
            .map_err(EtlError::store(path))?;
        let (song_id, artist_id) = match resolved {
            Some(song_match) => (Some(song_match.song_id), Some(song_match.artist_id)),
            None => (None, None),
        };
        rows.songplays.push(SongPlay {
            start_time: record.time.start_time,
            user_id: record.user_id,
            level: record.level,
            song_id,
            artist_id,
            session_id: record.session_id,
            location: record.location,
            user_agent: record.user_agent,
        });
    }
    Ok(rows)
}
