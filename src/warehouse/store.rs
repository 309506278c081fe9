//! SQLite-backed warehouse store.
//!
//! Writes happen through a [`FileTransaction`], one per input file. Dropping
//! a `FileTransaction` without calling [`FileTransaction::commit`] rolls back
//! everything written through it.

use super::models::*;
use super::schema::WAREHOUSE_VERSIONED_SCHEMAS;
use super::trait_def::SongLookup;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::path::Path;
use tracing::info;

const FIND_SONG_SQL: &str = "SELECT s.song_id, a.artist_id
     FROM songs s JOIN artists a ON s.artist_id = a.artist_id
     WHERE s.title = ?1 AND a.name = ?2 AND s.duration = ?3
     LIMIT 1";

pub struct SqliteWarehouse {
    conn: Connection,
}

/// Reads a `level` column, failing on values the loader never writes.
fn level_column(row: &Row, idx: usize) -> rusqlite::Result<Level> {
    let value: String = row.get(idx)?;
    Level::parse(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown level {:?}", value).into(),
        )
    })
}

fn migrate_if_needed(conn: &Connection) -> Result<()> {
    let latest_schema = WAREHOUSE_VERSIONED_SCHEMAS
        .last()
        .context("No warehouse schema defined")?;

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;

    if table_count == 0 {
        info!(
            "Creating warehouse db schema at version {}",
            latest_schema.version
        );
        let tx = conn.unchecked_transaction()?;
        latest_schema.create(&tx)?;
        tx.commit()?;
        return Ok(());
    }

    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if db_version != (BASE_DB_VERSION + latest_schema.version) as i64 {
        bail!(
            "Unknown database version {} (expected {})",
            db_version,
            BASE_DB_VERSION + latest_schema.version
        );
    }
    latest_schema
        .validate(conn)
        .context("Existing database does not match the warehouse schema")
}

impl SqliteWarehouse {
    /// Opens the warehouse at `db_path`, creating the file and the schema if needed.
    ///
    /// An existing database must carry the current schema version and pass
    /// validation.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(
            db_path.as_ref(),
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open warehouse database {:?}", db_path.as_ref()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // Foreign key enforcement is per connection, not stored in the file
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrate_if_needed(&conn)?;
        Ok(SqliteWarehouse { conn })
    }

    /// Starts the write transaction for one input file.
    pub fn begin_file(&mut self) -> rusqlite::Result<FileTransaction<'_>> {
        Ok(FileTransaction {
            tx: self.conn.transaction()?,
        })
    }

    pub fn counts(&self) -> rusqlite::Result<TableCounts> {
        let count = |table: &str| -> rusqlite::Result<usize> {
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
                    r.get::<_, i64>(0)
                })
                .map(|n| n as usize)
        };
        Ok(TableCounts {
            songs: count("songs")?,
            artists: count("artists")?,
            users: count("users")?,
            time: count("time")?,
            songplays: count("songplays")?,
        })
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    pub fn get_song(&self, song_id: &str) -> rusqlite::Result<Option<Song>> {
        self.conn
            .query_row(
                "SELECT song_id, title, artist_id, year, duration FROM songs WHERE song_id = ?1",
                params![song_id],
                |row| {
                    Ok(Song {
                        song_id: row.get(0)?,
                        title: row.get(1)?,
                        artist_id: row.get(2)?,
                        year: row.get(3)?,
                        duration: row.get(4)?,
                    })
                },
            )
            .optional()
    }

    pub fn get_artist(&self, artist_id: &str) -> rusqlite::Result<Option<Artist>> {
        self.conn
            .query_row(
                "SELECT artist_id, name, location, latitude, longitude FROM artists WHERE artist_id = ?1",
                params![artist_id],
                |row| {
                    Ok(Artist {
                        artist_id: row.get(0)?,
                        name: row.get(1)?,
                        location: row.get(2)?,
                        latitude: row.get(3)?,
                        longitude: row.get(4)?,
                    })
                },
            )
            .optional()
    }

    pub fn get_user(&self, user_id: &str) -> rusqlite::Result<Option<User>> {
        self.conn
            .query_row(
                "SELECT user_id, first_name, last_name, gender, level FROM users WHERE user_id = ?1",
                params![user_id],
                |row| {
                    let gender: Option<String> = row.get(3)?;
                    Ok(User {
                        user_id: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        gender: gender.as_deref().map(Gender::from_db_str),
                        level: level_column(row, 4)?,
                    })
                },
            )
            .optional()
    }

    pub fn get_time_entry(&self, start_time: i64) -> rusqlite::Result<Option<TimeEntry>> {
        self.conn
            .query_row(
                "SELECT start_time, start_time_iso, hour, day, week, day_of_week, month, year, weekday
                 FROM time WHERE start_time = ?1",
                params![start_time],
                |row| {
                    Ok(TimeEntry {
                        start_time: row.get(0)?,
                        start_time_iso: row.get(1)?,
                        hour: row.get(2)?,
                        day: row.get(3)?,
                        week: row.get(4)?,
                        day_of_week: row.get(5)?,
                        month: row.get(6)?,
                        year: row.get(7)?,
                        is_weekday: row.get(8)?,
                    })
                },
            )
            .optional()
    }

    /// All song plays, in insertion order.
    pub fn get_songplays(&self) -> rusqlite::Result<Vec<SongPlay>> {
        let mut stmt = self.conn.prepare(
            "SELECT start_time, user_id, level, song_id, artist_id, session_id, location, user_agent
             FROM songplays ORDER BY songplay_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SongPlay {
                start_time: row.get(0)?,
                user_id: row.get(1)?,
                level: level_column(row, 2)?,
                song_id: row.get(3)?,
                artist_id: row.get(4)?,
                session_id: row.get(5)?,
                location: row.get(6)?,
                user_agent: row.get(7)?,
            })
        })?;
        let plays = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(plays)
    }
}

impl SongLookup for SqliteWarehouse {
    fn find_song(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> rusqlite::Result<Option<SongMatch>> {
        find_song(&self.conn, title, artist_name, duration)
    }
}

fn find_song(
    conn: &Connection,
    title: &str,
    artist_name: &str,
    duration: f64,
) -> rusqlite::Result<Option<SongMatch>> {
    let mut stmt = conn.prepare_cached(FIND_SONG_SQL)?;
    stmt.query_row(params![title, artist_name, duration], |row| {
        Ok(SongMatch {
            song_id: row.get(0)?,
            artist_id: row.get(1)?,
        })
    })
    .optional()
}

/// Write transaction scoped to one input file.
pub struct FileTransaction<'a> {
    tx: Transaction<'a>,
}

impl FileTransaction<'_> {
    /// Returns `false` if an artist with the same id already exists; the
    /// existing row is left untouched.
    pub fn insert_artist(&self, artist: &Artist) -> rusqlite::Result<bool> {
        let mut stmt = self.tx.prepare_cached(
            "INSERT OR IGNORE INTO artists (artist_id, name, location, latitude, longitude)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        let changed = stmt.execute(params![
            artist.artist_id,
            artist.name,
            artist.location,
            artist.latitude,
            artist.longitude,
        ])?;
        Ok(changed > 0)
    }

    /// Returns `false` if a song with the same id already exists.
    pub fn insert_song(&self, song: &Song) -> rusqlite::Result<bool> {
        let mut stmt = self.tx.prepare_cached(
            "INSERT OR IGNORE INTO songs (song_id, title, artist_id, year, duration)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        let changed = stmt.execute(params![
            song.song_id,
            song.title,
            song.artist_id,
            song.year,
            song.duration,
        ])?;
        Ok(changed > 0)
    }

    /// Inserts the user or overwrites every column of the existing row.
    pub fn upsert_user(&self, user: &User) -> rusqlite::Result<()> {
        let mut stmt = self.tx.prepare_cached(
            "INSERT INTO users (user_id, first_name, last_name, gender, level)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                gender = excluded.gender,
                level = excluded.level",
        )?;
        stmt.execute(params![
            user.user_id,
            user.first_name,
            user.last_name,
            user.gender.map(|g| g.to_db_str()),
            user.level.to_db_str(),
        ])?;
        Ok(())
    }

    /// Returns `false` if the timestamp is already present.
    pub fn insert_time(&self, entry: &TimeEntry) -> rusqlite::Result<bool> {
        let mut stmt = self.tx.prepare_cached(
            "INSERT OR IGNORE INTO time
                (start_time, start_time_iso, hour, day, week, day_of_week, month, year, weekday)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        let changed = stmt.execute(params![
            entry.start_time,
            entry.start_time_iso,
            entry.hour,
            entry.day,
            entry.week,
            entry.day_of_week,
            entry.month,
            entry.year,
            entry.is_weekday,
        ])?;
        Ok(changed > 0)
    }

    /// Returns the new `songplay_id`.
    pub fn insert_songplay(&self, play: &SongPlay) -> rusqlite::Result<i64> {
        let mut stmt = self.tx.prepare_cached(
            "INSERT INTO songplays
                (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        stmt.execute(params![
            play.start_time,
            play.user_id,
            play.level.to_db_str(),
            play.song_id,
            play.artist_id,
            play.session_id,
            play.location,
            play.user_agent,
        ])?;
        Ok(self.tx.last_insert_rowid())
    }

    pub fn commit(self) -> rusqlite::Result<()> {
        self.tx.commit()
    }
}

impl SongLookup for FileTransaction<'_> {
    fn find_song(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> rusqlite::Result<Option<SongMatch>> {
        find_song(&self.tx, title, artist_name, duration)
    }
}
