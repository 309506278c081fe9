use super::loader::LoadSummary;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::info;

/// Receives the per-file progress of a load pass.
pub trait ProgressReporter {
    /// Called once per pass, after discovery and before the first file.
    fn files_found(&mut self, root: &Path, total: usize);

    /// Called after each file, whether it was loaded or skipped.
    fn file_processed(&mut self, processed: usize, total: usize);

    fn finished(&mut self, _summary: &LoadSummary) {}
}

/// Reports progress through `tracing`, one line per file.
#[derive(Default)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn files_found(&mut self, root: &Path, total: usize) {
        info!("{} files found in {}", total, root.display());
    }

    fn file_processed(&mut self, processed: usize, total: usize) {
        info!("{}/{} files processed.", processed, total);
    }
}

/// Renders a terminal progress bar per pass.
#[derive(Default)]
pub struct ConsoleProgress {
    bar: Option<ProgressBar>,
}

impl ProgressReporter for ConsoleProgress {
    fn files_found(&mut self, root: &Path, total: usize) {
        info!("{} files found in {}", total, root.display());
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files processed",
        ) {
            bar.set_style(style.progress_chars("=>-"));
        }
        bar.set_message(
            root.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        self.bar = Some(bar);
    }

    fn file_processed(&mut self, processed: usize, _total: usize) {
        if let Some(bar) = &self.bar {
            bar.set_position(processed as u64);
        }
    }

    fn finished(&mut self, summary: &LoadSummary) {
        if let Some(bar) = self.bar.take() {
            bar.finish_with_message(format!(
                "{} loaded, {} failed",
                summary.files_loaded, summary.files_failed
            ));
        }
    }
}
