use logbook_ingest::config::IngestConfig;
use logbook_ingest::module::names::LookupTables;
use logbook_ingest::module::sync::HttpBackend;
use logbook_ingest::{logging, Pipeline, RunRequest};

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "logbook-ingest")]
#[command(about = "Upload nightly telescope targets to the observatory logbook")]
struct Cli {
    /// Telescope name, must exist in the logbook
    #[arg(short, long)]
    telescope_name: String,

    /// Data directory for the telescope (contains YYYY-MM-DD folders)
    #[arg(short, long)]
    data_dir: PathBuf,

    /// Where to start, e.g. 2019-01-27T12:06:21. Defaults to the last
    /// target known to the logbook
    #[arg(short = 's', long)]
    datetime_start: Option<String>,

    /// Where to end, e.g. 2019-01-27T12:06:21. Defaults to the far future
    #[arg(short = 'e', long)]
    datetime_end: Option<String>,

    /// CSV file with the object names dictionary
    #[arg(long)]
    names_dict: Option<PathBuf>,

    /// CSV file with the color filters dictionary
    #[arg(long)]
    filters_dict: Option<PathBuf>,

    /// CSV file with the observers dictionary
    #[arg(long)]
    observers_dict: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match IngestConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let _logging_guard = match logging::init_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Big Error!: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &IngestConfig) -> anyhow::Result<()> {
    tracing::info!("Logbook ingest starting for telescope {}", cli.telescope_name);

    let tables = LookupTables::load(
        cli.names_dict.as_deref(),
        cli.filters_dict.as_deref(),
        cli.observers_dict.as_deref(),
    );
    let backend = HttpBackend::new(config.backend.clone())?;

    let request = RunRequest {
        telescope_name: cli.telescope_name,
        data_dir: cli.data_dir,
        datetime_start: cli.datetime_start,
        datetime_end: cli.datetime_end,
    };

    let report = Pipeline::new(config, &backend, &tables).run(&request).await?;
    tracing::info!("Run complete: {}", report);

    Ok(())
}
