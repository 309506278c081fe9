use anyhow::{Context, Result};
use clap::Parser;
use sparkify_etl::config::{AppConfig, CliConfig, FileConfig};
use sparkify_etl::etl::{
    CatalogRecordPolicy, ConsoleProgress, EtlError, EtlPipeline, LoadSummary, ProgressReporter,
    TracingProgress,
};
use sparkify_etl::warehouse::SqliteWarehouse;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(name = "sparkify-etl")]
#[command(about = "Load the song catalog and session logs into the Sparkify warehouse")]
struct CliArgs {
    /// Path to the SQLite warehouse database file.
    #[clap(long, default_value = "sparkify.db", value_parser = parse_path)]
    pub db: PathBuf,

    /// Root directory of the song catalog files.
    #[clap(long, default_value = "data/song_data", value_parser = parse_path)]
    pub song_data: PathBuf,

    /// Root directory of the session log files.
    #[clap(long, default_value = "data/log_data", value_parser = parse_path)]
    pub log_data: PathBuf,

    /// Extension of the input files.
    #[clap(long, default_value = "json")]
    pub extension: String,

    /// Path to a TOML config file. Its values override the CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Skip files that fail to load instead of aborting the run.
    #[clap(long, default_value_t = false)]
    pub continue_on_error: bool,

    /// Which records of a catalog file to load.
    #[clap(long, value_enum, default_value_t = CatalogRecordPolicy::First)]
    pub catalog_records: CatalogRecordPolicy,

    /// Delete the database file before loading.
    #[clap(long, default_value_t = false)]
    pub reset: bool,

    /// Log progress lines instead of drawing a progress bar.
    #[clap(long, default_value_t = false)]
    pub no_progress_bar: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db: self.db.clone(),
            song_data: self.song_data.clone(),
            log_data: self.log_data.clone(),
            extension: self.extension.clone(),
            continue_on_error: self.continue_on_error,
            catalog_records: self.catalog_records,
            progress_bar: !self.no_progress_bar,
        }
    }
}

fn log_pass_summary(name: &str, summary: &LoadSummary) {
    info!(
        "{}: {} files found, {} loaded",
        name, summary.files_found, summary.files_loaded
    );
    if summary.files_failed > 0 {
        warn!("{}: {} files failed", name, summary.files_failed);
    }
}

fn main() -> Result<ExitCode> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialise logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    if cli_args.reset && config.db_path.exists() {
        warn!("Deleting existing warehouse at {:?}", config.db_path);
        std::fs::remove_file(&config.db_path)
            .with_context(|| format!("Failed to delete {:?}", config.db_path))?;
    }

    info!("Opening SQLite warehouse at {:?}...", config.db_path);
    let mut warehouse = match SqliteWarehouse::open(&config.db_path) {
        Ok(warehouse) => warehouse,
        Err(source) => {
            let err = EtlError::Connection {
                path: config.db_path.clone(),
                source,
            };
            error!("{}", err);
            return Ok(ExitCode::FAILURE);
        }
    };

    let progress: Box<dyn ProgressReporter> = if config.progress_bar {
        Box::new(ConsoleProgress::default())
    } else {
        Box::new(TracingProgress)
    };

    let summary = EtlPipeline::new(&mut warehouse, config.load_options(), progress)
        .run(&config.song_data, &config.log_data)?;

    info!("");
    info!("Load Summary");
    info!("============");
    log_pass_summary("Song catalog", &summary.catalog);
    log_pass_summary("Session logs", &summary.logs);

    let counts = summary.table_counts;
    info!("");
    info!("Warehouse contains:");
    info!("  {} songs", counts.songs);
    info!("  {} artists", counts.artists);
    info!("  {} users", counts.users);
    info!("  {} time entries", counts.time);
    info!("  {} song plays", counts.songplays);

    info!("");
    info!("Load completed successfully!");

    Ok(ExitCode::SUCCESS)
}
