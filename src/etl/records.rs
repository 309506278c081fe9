//! Typed input records.
//!
//! Both file kinds are JSON lines. Each line is first deserialized into a
//! permissive `Raw*` shape, then validated into the typed record so that a
//! missing field is reported by name.

use super::error::{EtlError, RecordError};
use crate::warehouse::{Artist, Gender, Level, Song, TimeEntry};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// The log's `page` value that marks an actual song play.
pub const NEXT_SONG_PAGE: &str = "NextSong";

/// Reads `path` as JSON lines, returning each record with its 1-based line number.
/// Blank lines are skipped.
pub fn read_json_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<(usize, T)>, EtlError> {
    let text = std::fs::read_to_string(path).map_err(|source| EtlError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line)
                .map(|record| (index + 1, record))
                .map_err(|source| EtlError::Json {
                    path: path.to_path_buf(),
                    line: index + 1,
                    source,
                })
        })
        .collect()
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, RecordError> {
    value.ok_or(RecordError::MissingField(field))
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String, RecordError> {
    match value {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(RecordError::MissingField(field)),
    }
}

// =============================================================================
// Catalog records
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RawCatalogRecord {
    song_id: Option<String>,
    title: Option<String>,
    artist_id: Option<String>,
    year: Option<i32>,
    duration: Option<f64>,
    artist_name: Option<String>,
    artist_location: Option<String>,
    artist_latitude: Option<f64>,
    artist_longitude: Option<f64>,
}

/// One song together with its performing artist.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogRecord {
    pub song: Song,
    pub artist: Artist,
}

impl RawCatalogRecord {
    pub fn validate(self) -> Result<CatalogRecord, RecordError> {
        let artist_id = required_text(self.artist_id, "artist_id")?;
        Ok(CatalogRecord {
            song: Song {
                song_id: required_text(self.song_id, "song_id")?,
                title: required(self.title, "title")?,
                artist_id: artist_id.clone(),
                year: self.year.unwrap_or(0),
                duration: required(self.duration, "duration")?,
            },
            artist: Artist {
                artist_id,
                name: required(self.artist_name, "artist_name")?,
                location: self.artist_location,
                latitude: self.artist_latitude,
                longitude: self.artist_longitude,
            },
        })
    }
}

// =============================================================================
// Log records
// =============================================================================

/// Log dumps carry `userId` either as a string or as a number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UserIdValue {
    Text(String),
    Number(i64),
}

impl UserIdValue {
    fn into_text(self) -> String {
        match self {
            UserIdValue::Text(s) => s.trim().to_string(),
            UserIdValue::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLogRecord {
    ts: Option<i64>,
    user_id: Option<UserIdValue>,
    first_name: Option<String>,
    last_name: Option<String>,
    gender: Option<String>,
    level: Option<String>,
    song: Option<String>,
    artist: Option<String>,
    length: Option<f64>,
    session_id: Option<i64>,
    location: Option<String>,
    user_agent: Option<String>,
}

/// A validated `NextSong` event.
#[derive(Clone, Debug, PartialEq)]
pub struct LogRecord {
    pub time: TimeEntry,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<Gender>,
    pub level: Level,
    pub song: String,
    pub artist: String,
    pub length: f64,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

/// Whether a parsed log line is a song play. Only the `page` field is
/// looked at, so other events are never type-checked.
pub fn is_next_song(event: &Value) -> bool {
    event.get("page").and_then(Value::as_str) == Some(NEXT_SONG_PAGE)
}

impl RawLogRecord {
    pub fn validate(self) -> Result<LogRecord, RecordError> {
        let ts = required(self.ts, "ts")?;
        let time = TimeEntry::from_epoch_millis(ts).ok_or_else(|| RecordError::InvalidValue {
            field: "ts",
            reason: format!("{} is not a representable epoch millisecond timestamp", ts),
        })?;

        let level_text = required_text(self.level, "level")?;
        let level = Level::parse(&level_text).ok_or_else(|| RecordError::InvalidValue {
            field: "level",
            reason: format!("expected \"free\" or \"paid\", got {:?}", level_text),
        })?;

        Ok(LogRecord {
            time,
            user_id: required_text(self.user_id.map(UserIdValue::into_text), "userId")?,
            first_name: required(self.first_name, "firstName")?,
            last_name: required(self.last_name, "lastName")?,
            gender: self.gender.as_deref().map(Gender::from_log_code),
            level,
            song: required(self.song, "song")?,
            artist: required(self.artist, "artist")?,
            length: required(self.length, "length")?,
            session_id: required(self.session_id, "sessionId")?,
            location: self.location,
            user_agent: self.user_agent,
        })
    }
}
