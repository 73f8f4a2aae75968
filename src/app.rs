//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - loads the merged table (once, through the cache)
//! - hands off to the TUI, the text summary, or the CSV export

use std::fs::File;
use std::path::Path;

use clap::Parser;

use crate::cli::{Command, DashboardArgs, ExportArgs};
use crate::data::{default_selection, filter_rows};
use crate::domain::{MergedTable, Metric, Selection, YearRange};
use crate::error::{AppError, EXIT_DATA};

pub mod pipeline;

/// Dashboard title shared by every front-end.
pub const TITLE: &str = "Santa Barbara County — Economic Trends";

/// Entry point for the `trends` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` may carry TRENDS_DATA_DIR / RUST_LOG; a missing file is fine.
    dotenvy::dotenv().ok();

    // `trends` and `trends --data-dir x` behave like `trends tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Summary(args) => handle_summary(args),
        Command::Export(args) => handle_export(args),
    }
}

fn handle_tui(args: DashboardArgs) -> Result<(), AppError> {
    // Log lines on stderr would tear the alternate screen; stay quiet unless
    // a log file is given or RUST_LOG asks for output.
    let default_filter = if args.data.log_file.is_some() { "info" } else { "off" };
    init_logging(args.data.log_file.as_deref(), default_filter)?;

    let table = pipeline::load_merged(&args.data.data_dir)?;
    let selection = selection_from_args(&args, &table);
    crate::tui::run(table, selection, args.data.data_dir)
}

fn handle_summary(args: DashboardArgs) -> Result<(), AppError> {
    init_logging(args.data.log_file.as_deref(), "warn")?;

    let table = pipeline::load_merged(&args.data.data_dir)?;
    let selection = selection_from_args(&args, &table);
    let view = pipeline::render_pass(&table, &selection);

    println!("=== {TITLE} ===");
    println!("{}", crate::report::format_caption(view.selection.range, &view.summary));
    println!();
    match &view.summary {
        Ok(summary) => print!("{}", crate::report::format_summary(summary)),
        Err(err) => println!("{err}"),
    }

    println!("\nTrend ({}):", view.selection.scale.display_name());
    print!("{}", crate::report::format_points(&view.trend, 2));

    if let Some(yoy) = &view.yoy {
        println!("\nYear-over-Year % Change:");
        print!("{}", crate::report::format_points(yoy, 2));
    }

    println!("\nMerged data:");
    print!("{}", crate::report::format_table(&view.rows));
    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    init_logging(args.data.log_file.as_deref(), "warn")?;

    let table = pipeline::load_merged(&args.data.data_dir)?;
    let range = export_range(&args, &table);
    let rows = filter_rows(table.rows(), range);
    crate::io::export::write_table_csv(&args.out, rows)?;

    println!("Wrote {} rows ({}–{}) to {}", rows.len(), range.lo, range.hi, args.out.display());
    Ok(())
}

/// Build the initial selection from CLI flags on top of the dashboard defaults.
pub fn selection_from_args(args: &DashboardArgs, table: &MergedTable) -> Selection {
    let mut selection = default_selection(table);
    if let Some(lo) = args.from {
        selection.range.lo = lo;
    }
    if let Some(hi) = args.to {
        selection.range.hi = hi;
    }
    selection.scale = args.scale;
    selection.show_yoy = !args.no_yoy;

    if !args.series.is_empty() {
        let mut metrics: Vec<Metric> = Vec::with_capacity(args.series.len());
        for &metric in &args.series {
            if !metrics.contains(&metric) {
                metrics.push(metric);
            }
        }
        selection.metrics = metrics;
    }

    match table.bounds() {
        Some(bounds) => Selection {
            range: selection.range.clamp_to(bounds),
            ..selection
        },
        None => selection,
    }
}

/// Export defaults to the full table.
fn export_range(args: &ExportArgs, table: &MergedTable) -> YearRange {
    let Some(bounds) = table.bounds() else {
        return YearRange::new(args.from.unwrap_or(0), args.to.unwrap_or(0));
    };
    YearRange::new(args.from.unwrap_or(bounds.min), args.to.unwrap_or(bounds.max)).clamp_to(bounds)
}

/// Configure `env_logger`. `RUST_LOG` overrides `default_filter`.
fn init_logging(log_file: Option<&Path>, default_filter: &str) -> Result<(), AppError> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));
    if let Some(path) = log_file {
        let file = File::create(path)
            .map_err(|e| AppError::new(EXIT_DATA, format!("Failed to create log file '{}': {e}", path.display())))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    // A logger may already be installed (e.g. in tests); keep it.
    builder.try_init().ok();
    Ok(())
}

/// Rewrite argv so `trends` defaults to `trends tui`.
///
/// Rules:
/// - `trends`                          -> `trends tui`
/// - `trends --data-dir d ...`         -> `trends tui --data-dir d ...`
/// - `trends --help/--version/-h`      -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "summary" | "export");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
