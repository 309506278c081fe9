//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{song_record, TestWorkspace, SONG_1_ID};
//!
//! #[test]
//! fn test_load_song() {
//!     let workspace = TestWorkspace::new();
//!     workspace.add_song("A/A/A/song.json", &song_record(SONG_1_ID, "AR1", "Artist", "Title", 200.0));
//!     let summary = workspace.run_default().unwrap();
//!     assert_eq!(summary.table_counts.songs, 1);
//! }
//! ```

mod constants;
mod fixtures;

pub use constants::*;
pub use fixtures::{next_song_event, page_event, song_record, TestWorkspace};
