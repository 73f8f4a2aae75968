//! Command-line parsing for the economic-trends dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the data pipeline.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{Metric, ValueScale};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "trends", version, about = "County economic trends: housing, income, population")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard.
    Tui(DashboardArgs),
    /// Print metric cards, chart series, and the merged table.
    Summary(DashboardArgs),
    /// Write the (optionally year-filtered) merged table to CSV.
    Export(ExportArgs),
}

/// Where the data lives and where logs go.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Directory holding housing_prices.csv, median_income.csv, and population.csv.
    #[arg(long, env = "TRENDS_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Write log output to this file instead of stderr.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Initial dashboard selection.
#[derive(Debug, Args, Clone)]
pub struct DashboardArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// First year shown (default: ten years before the latest year).
    #[arg(long)]
    pub from: Option<i32>,

    /// Last year shown (default: latest year).
    #[arg(long)]
    pub to: Option<i32>,

    /// Trend chart scale.
    #[arg(long, value_enum, default_value_t = ValueScale::Raw)]
    pub scale: ValueScale,

    /// Series to chart, comma-separated (default: all).
    #[arg(long, value_enum, value_delimiter = ',')]
    pub series: Vec<Metric>,

    /// Hide the year-over-year chart.
    #[arg(long)]
    pub no_yoy: bool,
}

/// Options for `trends export`.
#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Output CSV path.
    #[arg(short, long, value_name = "CSV")]
    pub out: PathBuf,

    /// First year exported (default: earliest year).
    #[arg(long)]
    pub from: Option<i32>,

    /// Last year exported (default: latest year).
    #[arg(long)]
    pub to: Option<i32>,
}
