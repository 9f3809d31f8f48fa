//! CLI entry point for taskboard.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use taskboard_app::{DashboardConfig, SortField};
use taskboard_core::{Category, DateRangePreset, Status, parse_date};
use time::Date;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;

/// Cross-filtering task dashboard on the command line.
#[derive(Parser, Debug)]
#[command(
    name = "taskboard",
    version,
    about = "taskboard: filter tasks and print dashboard derivations as JSON"
)]
struct Cli {
    /// JSON file holding the task list (defaults to the configured tasks file).
    #[arg(long)]
    tasks: Option<PathBuf>,

    /// Configuration file (defaults to `.taskboard/config.toml`).
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print total, amount sum, and per-status counts of the filtered tasks.
    Stats,

    /// Print the status and category chart buckets.
    Charts,

    /// Print per-day task counts.
    Timeline {
        /// Ignore the committed date range.
        #[arg(long)]
        unfiltered: bool,
    },

    /// Print one page of the filtered task table.
    Table {
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        sort: Option<SortField>,
        /// Sort descending.
        #[arg(long)]
        desc: bool,
        /// Narrow rows by title, on top of the global search filter.
        #[arg(long)]
        search: Option<String>,
    },

    /// Print every derivation at once.
    View,

    /// Inspect or change the persisted filter selection.
    Filter {
        #[command(subcommand)]
        action: FilterCommand,
    },

    /// Create a task.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        category: Category,
        #[arg(long, default_value = "todo")]
        status: Status,
        #[arg(long, value_parser = parse_date)]
        date: Date,
        #[arg(long, default_value_t = 0.0)]
        amount: f64,
    },

    /// Change fields of an existing task.
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        status: Option<Status>,
        #[arg(long, value_parser = parse_date)]
        date: Option<Date>,
        #[arg(long)]
        amount: Option<f64>,
    },

    /// Delete a task.
    Delete { id: String },

    /// Replace the task file with generated demo tasks.
    Seed {
        #[arg(long, default_value_t = 100)]
        count: usize,
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
}

#[derive(Subcommand, Debug)]
enum FilterCommand {
    /// Print the current selection.
    Show,
    /// Empty every field.
    Clear,
    /// Restore the default selection.
    Reset,
    /// Toggle a status.
    Status { value: Status },
    /// Toggle a category.
    Category { value: Category },
    /// Replace the title search; an empty string clears it.
    Search { text: String },
    /// Replace the date range; omitted bounds are open.
    Range {
        #[arg(long, value_parser = parse_date)]
        start: Option<Date>,
        #[arg(long, value_parser = parse_date)]
        end: Option<Date>,
    },
    /// Apply a date preset: 7days, 30days, or all.
    Preset { name: DateRangePreset },
}

fn main() -> Result<()> {
    let Cli { tasks, config, cmd } = Cli::parse();
    install_tracing();

    let config = match config {
        Some(path) => DashboardConfig::from_file(&path)?,
        None => DashboardConfig::from_workdir(".")?,
    };
    let tasks_file = tasks.unwrap_or_else(|| config.tasks_file());

    tokio::runtime::Builder::new_current_thread()
        .build()?
        .block_on(commands::run(cmd, &config, tasks_file))
}

fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn install_tracing() {
    // RUST_LOG replaces the INFO default; logs go to stderr so stdout stays JSON.
    let filter = env_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
