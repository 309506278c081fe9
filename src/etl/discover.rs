//! Recursive input file discovery.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("Path not found: {0:?}")]
    PathNotFound(PathBuf),

    #[error("Not a directory: {0:?}")]
    NotADirectory(PathBuf),

    #[error("Cannot resolve {root:?}: {source}")]
    Resolve {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot walk {root:?}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Finds every file under `root` whose extension is `extension`, at any depth.
///
/// Paths are absolute. Entries are visited sorted by file name, so the order
/// is stable for a given directory tree. The extension may be given with or
/// without its leading dot and is matched case-sensitively.
pub fn find_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>, DiscoverError> {
    if !root.exists() {
        return Err(DiscoverError::PathNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(DiscoverError::NotADirectory(root.to_path_buf()));
    }
    let root = root.canonicalize().map_err(|source| DiscoverError::Resolve {
        root: root.to_path_buf(),
        source,
    })?;

    let extension = extension.trim_start_matches('.');
    let mut files = Vec::new();
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry.map_err(|source| DiscoverError::Walk {
            root: root.clone(),
            source,
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some(extension)
        {
            files.push(entry.into_path());
        }
    }

    debug!("Found {} .{} files under {:?}", files.len(), extension, root);
    Ok(files)
}
