//! SQLite schema definitions for the listening warehouse.
//!
//! A star schema: `songplays` is the fact table, `songs`, `artists`, `users`
//! and `time` are its dimensions.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, ForeignKey, SqlType, Table, VersionedSchema};

// =============================================================================
// Dimension Tables
// =============================================================================

const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("artist_id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("location", &SqlType::Text),
        sqlite_column!("latitude", &SqlType::Real),
        sqlite_column!("longitude", &SqlType::Real),
    ],
    indices: &[("idx_artists_name", "name")],
};

const SONGS_TABLE: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!("song_id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!(
            "artist_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "artists",
                foreign_column: "artist_id",
            })
        ),
        sqlite_column!("year", &SqlType::Integer, non_null = true), // 0 = unknown
        sqlite_column!("duration", &SqlType::Real, non_null = true), // seconds
    ],
    // Serves the title + duration half of the resolution join
    indices: &[("idx_songs_title_duration", "title, duration")],
};

const USERS_TABLE: Table = Table {
    name: "users",
    columns: &[
        sqlite_column!("user_id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("first_name", &SqlType::Text, non_null = true),
        sqlite_column!("last_name", &SqlType::Text, non_null = true),
        sqlite_column!("gender", &SqlType::Text), // 'male', 'female', 'unknown'
        sqlite_column!("level", &SqlType::Text, non_null = true), // 'free', 'paid'
    ],
    indices: &[],
};

const TIME_TABLE: Table = Table {
    name: "time",
    columns: &[
        sqlite_column!("start_time", &SqlType::Integer, is_primary_key = true), // epoch millis
        sqlite_column!("start_time_iso", &SqlType::Text, non_null = true),
        sqlite_column!("hour", &SqlType::Integer, non_null = true),
        sqlite_column!("day", &SqlType::Integer, non_null = true),
        sqlite_column!("week", &SqlType::Integer, non_null = true),
        sqlite_column!("day_of_week", &SqlType::Integer, non_null = true), // 1 = Monday
        sqlite_column!("month", &SqlType::Integer, non_null = true),
        sqlite_column!("year", &SqlType::Integer, non_null = true),
        sqlite_column!("weekday", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
};

// =============================================================================
// Fact Table
// =============================================================================

const SONGPLAYS_TABLE: Table = Table {
    name: "songplays",
    columns: &[
        sqlite_column!("songplay_id", &SqlType::Integer, is_primary_key = true), // rowid alias
        sqlite_column!(
            "start_time",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "time",
                foreign_column: "start_time",
            })
        ),
        sqlite_column!(
            "user_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "users",
                foreign_column: "user_id",
            })
        ),
        sqlite_column!("level", &SqlType::Text, non_null = true),
        sqlite_column!(
            "song_id",
            &SqlType::Text,
            foreign_key = Some(&ForeignKey {
                foreign_table: "songs",
                foreign_column: "song_id",
            })
        ),
        sqlite_column!(
            "artist_id",
            &SqlType::Text,
            foreign_key = Some(&ForeignKey {
                foreign_table: "artists",
                foreign_column: "artist_id",
            })
        ),
        sqlite_column!("session_id", &SqlType::Integer, non_null = true),
        sqlite_column!("location", &SqlType::Text),
        sqlite_column!("user_agent", &SqlType::Text),
    ],
    indices: &[
        ("idx_songplays_start_time", "start_time"),
        ("idx_songplays_user_id", "user_id"),
    ],
};

// =============================================================================
// Versioned Schema Definition
// =============================================================================

pub const WAREHOUSE_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        ARTISTS_TABLE,
        SONGS_TABLE,
        USERS_TABLE,
        TIME_TABLE,
        SONGPLAYS_TABLE,
    ],
}];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::{params, Connection};

    fn create_schema() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        let schema = &WAREHOUSE_VERSIONED_SCHEMAS[0];
        schema.create(&conn).unwrap();
        conn
    }

    #[test]
    fn test_schema_creates_successfully() {
        let conn = create_schema();
        WAREHOUSE_VERSIONED_SCHEMAS[0].validate(&conn).unwrap();
    }

    #[test]
    fn test_song_requires_existing_artist() {
        let conn = create_schema();

        let result = conn.execute(
            "INSERT INTO songs (song_id, title, artist_id, year, duration) VALUES (?1, ?2, ?3, ?4, ?5)",
            params!["S1", "Title", "AR_MISSING", 0, 200.0],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_songplay_ids_auto_increment() {
        let conn = create_schema();
        conn.execute(
            "INSERT INTO time (start_time, start_time_iso, hour, day, week, day_of_week, month, year, weekday)
             VALUES (1, '1970-01-01T00:00:00.001Z', 0, 1, 1, 4, 1, 1970, 1)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO users (user_id, first_name, last_name, gender, level) VALUES ('10', 'A', 'B', NULL, 'free')",
            [],
        )
        .unwrap();

        for _ in 0..2 {
            conn.execute(
                "INSERT INTO songplays (start_time, user_id, level, session_id) VALUES (1, '10', 'free', 7)",
                [],
            )
            .unwrap();
        }

        let ids: Vec<i64> = conn
            .prepare("SELECT songplay_id FROM songplays ORDER BY songplay_id")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(ids, vec![1, 2]);
    }
}
