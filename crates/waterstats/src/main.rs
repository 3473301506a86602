use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::Table;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use waterstats_core::pipeline::{self, PipelineRun};
use waterstats_core::schema::{target_column_names, DistrictWaterStats};
use waterstats_core::{PipelineConfig, PipelineError};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Joins district evapotranspiration and soil moisture exports into Postgres",
    long_about = None
)]
struct Cli {
    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    /// TOML file with pipeline settings; command-line flags take precedence
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load, join and write the joined rows to the target table
    Run(RunArgs),
    /// Load and join, then print the first joined rows without writing
    Preview(PreviewArgs),
}

#[derive(Args, Debug, Default)]
struct SourceArgs {
    /// Evapotranspiration CSV export [default: evapotranspiration.csv]
    #[arg(long)]
    evapotranspiration: Option<PathBuf>,
    /// Soil moisture CSV export [default: soil_moisture.csv]
    #[arg(long)]
    soil_moisture: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    #[command(flatten)]
    sources: SourceArgs,
    /// Target table, optionally schema-qualified [default: district_water_stats]
    #[arg(long)]
    table: Option<String>,
    /// Stop after the transform; no database connection is opened
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args, Debug, Default)]
struct PreviewArgs {
    #[command(flatten)]
    sources: SourceArgs,
    /// Number of joined rows to print
    #[arg(long, default_value_t = 10)]
    rows: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let category = err
                .downcast_ref::<PipelineError>()
                .map(PipelineError::category)
                .unwrap_or("config");
            error!(category, error = format!("{err:#}"), "Pipeline run failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Pretty => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }
}

async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => handle_run(cli.config.as_deref(), args).await,
        Command::Preview(args) => handle_preview(cli.config.as_deref(), args),
    }
}

async fn handle_run(config_path: Option<&Path>, args: RunArgs) -> Result<()> {
    let mut config = build_config(config_path, args.sources)?;
    if let Some(table) = args.table {
        config.table = table;
    }
    config.dry_run |= args.dry_run;

    let run = PipelineRun::new();
    info!(run_id = %run.run_id, table = %config.table, dry_run = config.dry_run, "Starting pipeline run");
    pipeline::run(&config, &run).await?;
    Ok(())
}

fn handle_preview(config_path: Option<&Path>, args: PreviewArgs) -> Result<()> {
    let config = build_config(config_path, args.sources)?;
    let prepared = pipeline::prepare(&config, &PipelineRun::new())?;
    print_preview(&prepared.records, args.rows);
    Ok(())
}

fn build_config(config_path: Option<&Path>, sources: SourceArgs) -> Result<PipelineConfig> {
    dotenvy::dotenv().ok();

    let mut config = match config_path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(path) = sources.evapotranspiration {
        config.evapotranspiration_path = path;
    }
    if let Some(path) = sources.soil_moisture {
        config.soil_moisture_path = path;
    }
    config.database_url = env::var("DATABASE_URL")
        .or_else(|_| env::var("WATERSTATS_DATABASE_URL"))
        .ok();

    Ok(config)
}

fn print_preview(records: &[DistrictWaterStats], rows: usize) {
    let mut table = Table::new();
    table.set_header(target_column_names());
    for record in records.iter().take(rows) {
        table.add_row(record.display_cells());
    }

    println!("{table}");
    println!(
        "Showing {} of {} joined rows.",
        rows.min(records.len()),
        records.len()
    );
}
