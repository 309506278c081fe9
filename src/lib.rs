//! Sparkify ETL Library
//!
//! Loads the song catalog and user session logs into a star-schema SQLite
//! warehouse. The modules are exposed for the binary and for integration tests.

pub mod config;
pub mod etl;
pub mod sqlite_persistence;
pub mod warehouse;

// Re-export commonly used types for convenience
pub use config::{AppConfig, CliConfig};
pub use etl::{EtlError, EtlPipeline, LoadOptions, PipelineSummary};
pub use warehouse::{SongLookup, SqliteWarehouse, TableCounts};
