//! Row models for the warehouse tables.
//!
//! Each struct maps one-to-one onto a row of the table with the same name,
//! see `schema.rs`.

use chrono::{DateTime, Datelike, SecondsFormat, Timelike, Utc, Weekday};

// =============================================================================
// Enumerations
// =============================================================================

/// Gender as reported by the session log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    /// Map the log's single-letter code. Anything other than `M`/`F` is `Unknown`.
    pub fn from_log_code(code: &str) -> Self {
        match code {
            "M" => Gender::Male,
            "F" => Gender::Female,
            _ => Gender::Unknown,
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "male" => Gender::Male,
            "female" => Gender::Female,
            _ => Gender::Unknown,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }
}

/// Subscription level of a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Free,
    Paid,
}

impl Level {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "free" => Some(Level::Free),
            "paid" => Some(Level::Paid),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Level::Free => "free",
            Level::Paid => "paid",
        }
    }
}

// =============================================================================
// Catalog rows
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct Song {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    /// 0 when the release year is unknown.
    pub year: i32,
    /// Seconds.
    pub duration: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Artist {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

// =============================================================================
// Log rows
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<Gender>,
    pub level: Level,
}

/// Calendar decomposition of a play timestamp.
///
/// Timestamps are interpreted as UTC with no timezone adjustment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeEntry {
    /// Milliseconds since the Unix epoch, the row identity.
    pub start_time: i64,
    /// ISO 8601 rendering with millisecond precision, e.g. `2018-11-15T00:30:26.796Z`.
    pub start_time_iso: String,
    pub hour: u32,
    pub day: u32,
    /// ISO 8601 week number.
    pub week: u32,
    /// ISO day of week, 1 = Monday through 7 = Sunday.
    pub day_of_week: u32,
    pub month: u32,
    pub year: i32,
    pub is_weekday: bool,
}

impl TimeEntry {
    /// Returns `None` if the timestamp is outside the representable range.
    pub fn from_epoch_millis(millis: i64) -> Option<Self> {
        let datetime = DateTime::<Utc>::from_timestamp_millis(millis)?;
        let weekday = datetime.weekday();
        Some(TimeEntry {
            start_time: millis,
            start_time_iso: datetime.to_rfc3339_opts(SecondsFormat::Millis, true),
            hour: datetime.hour(),
            day: datetime.day(),
            week: datetime.iso_week().week(),
            day_of_week: weekday.number_from_monday(),
            month: datetime.month(),
            year: datetime.year(),
            is_weekday: !matches!(weekday, Weekday::Sat | Weekday::Sun),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SongPlay {
    /// Milliseconds since the Unix epoch.
    pub start_time: i64,
    pub user_id: String,
    pub level: Level,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

/// Result of the resolution join for one play event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongMatch {
    pub song_id: String,
    pub artist_id: String,
}

/// Row counts per warehouse table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub songs: usize,
    pub artists: usize,
    pub users: usize,
    pub time: usize,
    pub songplays: usize,
}

impl std::ops::AddAssign for TableCounts {
    fn add_assign(&mut self, other: Self) {
        self.songs += other.songs;
        self.artists += other.artists;
        self.users += other.users;
        self.time += other.time;
        self.songplays += other.songplays;
    }
}
