use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::OutputFormat;

#[derive(Parser)]
#[command(name = "aqi-processor")]
#[command(about = "Air quality index calculator for hourly monitoring data")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "Settings file (TOML or JSON)")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index summary per site and calendar period
    Summary {
        #[arg(short, long = "input", required = true, help = "Measurement CSV (repeatable)")]
        inputs: Vec<PathBuf>,

        #[arg(short, long, help = "Standard key, e.g. UK_DAQI or US_EPA")]
        standard: Option<String>,

        #[arg(short, long, help = "hourly, daily, weekly, monthly, yearly or all")]
        frequency: Option<String>,

        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        #[arg(long, help = "Only emit the overall index rows")]
        overall_only: bool,

        #[arg(
            short,
            long,
            help = "Output file (.csv, .json or .parquet) [default: print a table]"
        )]
        output: Option<PathBuf>,

        #[arg(long)]
        max_workers: Option<usize>,

        #[arg(long, help = "Required share of valid hours, 0.0 to 1.0")]
        min_coverage: Option<f64>,
    },

    /// Hour-by-hour index using each pollutant's averaging window
    Timeseries {
        #[arg(short, long = "input", required = true, help = "Measurement CSV (repeatable)")]
        inputs: Vec<PathBuf>,

        #[arg(short, long)]
        standard: Option<String>,

        #[arg(long, help = "Use NowCast for pollutants that define it")]
        nowcast: bool,

        #[arg(short, long, help = "1h, 8h or 24h for pollutants with a table on that window")]
        window: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        max_workers: Option<usize>,
    },

    /// Compare period means against the WHO 2021 guidelines
    Compliance {
        #[arg(short, long = "input", required = true, help = "Measurement CSV (repeatable)")]
        inputs: Vec<PathBuf>,

        #[arg(short, long, help = "AQG or IT-1 .. IT-4")]
        target: Option<String>,

        #[arg(short, long, help = "annual, 24h, 8h or 1h [default: per pollutant]")]
        averaging: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        max_workers: Option<usize>,

        #[arg(long)]
        min_coverage: Option<f64>,
    },

    /// List the supported standards
    Standards,
}
