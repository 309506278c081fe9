mod discover;
mod error;
mod loader;
mod pipeline;
mod progress;
mod records;
mod transform;

pub use discover::{find_files, DiscoverError};
pub use error::{EtlError, RecordError};
pub use loader::{ErrorPolicy, LoadSummary, Loader};
pub use pipeline::{CatalogLoaded, EtlPipeline, LoadOptions, Pending, PipelineSummary};
pub use progress::{ConsoleProgress, ProgressReporter, TracingProgress};
pub use records::{
    is_next_song, read_json_lines, CatalogRecord, LogRecord, RawCatalogRecord, RawLogRecord,
    UserIdValue, NEXT_SONG_PAGE,
};
pub use transform::{
    transform_catalog_file, transform_log_file, CatalogRecordPolicy, CatalogRows, FileRows,
    LogRows,
};
