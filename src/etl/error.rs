use super::discover::DiscoverError;
use std::path::PathBuf;
use thiserror::Error;

/// A record that parsed as JSON but does not have the shape its file kind requires.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("file contains no records")]
    EmptyFile,
}

/// Errors that can occur while loading the warehouse.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Cannot open warehouse {path:?}: {source:#}")]
    Connection {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Discover(#[from] DiscoverError),

    #[error("Cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path:?} at line {line}: {source}")]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid record in {path:?} at line {line}: {source}")]
    Record {
        path: PathBuf,
        line: usize,
        #[source]
        source: RecordError,
    },

    #[error("Warehouse error while loading {path:?}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
}

impl EtlError {
    pub(crate) fn store(path: &std::path::Path) -> impl FnOnce(rusqlite::Error) -> EtlError + '_ {
        move |source| EtlError::Store {
            path: path.to_path_buf(),
            source,
        }
    }
}
