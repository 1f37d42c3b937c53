//! CLI entry point for the district pressure tool.
//!
//! Provides subcommands for scoring districts, forecasting demand,
//! backtesting forecast accuracy, evaluating alerts, and running the whole
//! pipeline into an output directory.

use anyhow::Result;
use clap::{Parser, Subcommand};
use district_pressure::config::PipelineConfig;
use district_pressure::output::{table_path, write_json, write_table};
use district_pressure::parser::load_records;
use district_pressure::pipeline::{PipelineOutput, run};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "district_pressure")]
#[command(about = "Scores, forecasts and flags district service pressure", long_about = None)]
struct Cli {
    /// JSON file overriding the default thresholds, window and horizon
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute AUPS for every district and period
    Score {
        /// CSV of district/period records
        #[arg(short, long)]
        input: String,

        /// CSV file to write scores to
        #[arg(short, long, default_value = "aups.csv")]
        output: String,
    },
    /// Forecast demand per district with a rolling average
    Forecast {
        #[arg(short, long)]
        input: String,

        #[arg(short, long, default_value = "forecast.csv")]
        output: String,
    },
    /// Replay history with single-step forecasts and report accuracy
    Backtest {
        #[arg(short, long)]
        input: String,

        /// CSV file for per-period results
        #[arg(short, long, default_value = "backtest.csv")]
        output: String,

        /// CSV file for per-district accuracy summaries
        #[arg(short, long, default_value = "backtest_summary.csv")]
        summary: String,
    },
    /// Classify each district's current pressure into alert tiers
    Alerts {
        #[arg(short, long)]
        input: String,

        #[arg(short, long, default_value = "alerts.csv")]
        output: String,
    },
    /// Run every stage and write all tables to a directory
    Run {
        #[arg(short, long)]
        input: String,

        /// Directory to write result tables to
        #[arg(short = 'd', long, default_value = "out")]
        output_dir: String,

        /// Gzip compress the CSV tables
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/district_pressure.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("district_pressure.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(LevelFilter::INFO.into()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive(LevelFilter::DEBUG.into()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    info!(?config, "Configuration loaded");

    match cli.command {
        Commands::Score { input, output } => {
            let result = execute(&input, &config)?;
            write_table(&output, &result.aups)?;
        }
        Commands::Forecast { input, output } => {
            let result = execute(&input, &config)?;
            write_table(&output, &result.forecasts)?;
        }
        Commands::Backtest {
            input,
            output,
            summary,
        } => {
            let result = execute(&input, &config)?;
            write_table(&output, &result.backtest_results)?;
            write_table(&summary, &result.backtest_summaries)?;

            for s in &result.backtest_summaries {
                info!(
                    district_id = %s.district_id,
                    periods = s.periods_tested,
                    mae = s.mean_absolute_error,
                    mape = ?s.mean_percent_error,
                    "Backtest accuracy"
                );
            }
        }
        Commands::Alerts { input, output } => {
            let result = execute(&input, &config)?;
            write_table(&output, &result.alerts)?;
        }
        Commands::Run {
            input,
            output_dir,
            gzip,
        } => {
            let result = execute(&input, &config)?;
            write_all(&output_dir, &result, &config, gzip)?;
        }
    }

    Ok(())
}

/// Loads the input table and runs the pipeline, logging any per-district failures.
#[tracing::instrument(skip(config))]
fn execute(input: &str, config: &PipelineConfig) -> Result<PipelineOutput> {
    let records = load_records(input)?;
    let output = run(records, config)?;

    for failure in &output.failures {
        info!(
            district_id = %failure.district_id,
            stage = ?failure.stage,
            error = %failure.message,
            "District not fully processed"
        );
    }

    Ok(output)
}

/// Writes every result table plus the JSON run report into `output_dir`.
#[tracing::instrument(skip(result, config))]
fn write_all(
    output_dir: &str,
    result: &PipelineOutput,
    config: &PipelineConfig,
    gzip: bool,
) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;

    write_table(&table_path(output_dir, "aups", gzip), &result.aups)?;
    write_table(&table_path(output_dir, "forecast", gzip), &result.forecasts)?;
    write_table(
        &table_path(output_dir, "backtest", gzip),
        &result.backtest_results,
    )?;
    write_table(
        &table_path(output_dir, "backtest_summary", gzip),
        &result.backtest_summaries,
    )?;
    write_table(&table_path(output_dir, "alerts", gzip), &result.alerts)?;
    write_table(&table_path(output_dir, "rankings", gzip), &result.rankings)?;
    write_table(&table_path(output_dir, "failures", gzip), &result.failures)?;

    let report = result.report(config);
    let report_path = Path::new(output_dir).join("report.json");
    write_json(&report_path.display().to_string(), &report)?;

    info!(
        output_dir,
        red_flags = report.red_flags.len(),
        edge_cases = report.edge_cases.len(),
        "Finished writing results"
    );
    Ok(())
}
