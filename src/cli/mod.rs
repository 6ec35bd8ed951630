//! Command-line parsing for the macro dataset loader.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fetch/transform code.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "macro-data",
    version,
    about = "Load CPI (YoY %) and USD-based FX datasets from FRED and the ECB"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load every dataset and align them on the shared date range.
    All(LoadArgs),
    /// Load CPI year-over-year % only (not range-restricted unless --start/--end are given).
    Cpi(LoadArgs),
    /// Load FX pairs only (not range-restricted unless --start/--end are given).
    Fx(LoadArgs),
}

/// Options shared by all subcommands.
#[derive(Debug, Parser, Clone, Default)]
pub struct LoadArgs {
    /// First date kept (inclusive), YYYY-MM-DD. Overrides MACRO_START.
    #[arg(long, value_name = "DATE")]
    pub start: Option<NaiveDate>,

    /// Last date kept (inclusive), YYYY-MM-DD. Overrides MACRO_END.
    #[arg(long, value_name = "DATE")]
    pub end: Option<NaiveDate>,

    /// Number of trailing rows to print per dataset.
    #[arg(long, default_value_t = 12)]
    pub tail: usize,

    /// Skip TLS certificate verification for the ECB download only.
    #[arg(long)]
    pub insecure_ecb: bool,
}

impl LoadArgs {
    pub fn has_range_override(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }
}

/// Rewrite argv so `macro-data` defaults to `macro-data all`.
///
/// Rules:
/// - `macro-data`                     -> `macro-data all`
/// - `macro-data --tail 3 ...`        -> `macro-data all --tail 3 ...`
/// - `macro-data --help/--version/-h` -> unchanged
pub fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("all".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "all".to_string());
    }
    argv
}
