//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - installs logging
//! - parses CLI arguments
//! - builds the loader from environment + flags
//! - prints dataset summaries

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, LoadArgs};
use crate::config::LoaderConfig;
use crate::domain::{Dataset, DateRange};
use crate::error::AppError;

pub mod pipeline;

pub use pipeline::DataLoader;

/// Entry point for the `macro-data` binary.
pub fn run() -> Result<(), AppError> {
    init_tracing();

    let argv = crate::cli::rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::All(args) => handle_all(&args),
        Command::Cpi(args) => handle_one(&args, DataLoader::load_cpi),
        Command::Fx(args) => handle_one(&args, DataLoader::load_fx),
    }
}

/// Logs go to stderr so stdout carries only the report. `RUST_LOG` overrides
/// the default `info` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_all(args: &LoadArgs) -> Result<(), AppError> {
    let config = config_from_args(args)?;
    let loader = DataLoader::new(&config)?;
    let datasets = loader.load_all()?;
    for dataset in datasets.values() {
        println!("{}", crate::report::format_dataset(dataset, args.tail));
    }
    Ok(())
}

fn handle_one(
    args: &LoadArgs,
    load: fn(&DataLoader) -> Result<Dataset, AppError>,
) -> Result<(), AppError> {
    let config = config_from_args(args)?;
    let loader = DataLoader::new(&config)?;
    let mut dataset = load(&loader)?;
    if args.has_range_override() {
        dataset.frame.restrict(config.range);
    }
    println!("{}", crate::report::format_dataset(&dataset, args.tail));
    Ok(())
}

/// Environment first, CLI flags on top.
pub fn config_from_args(args: &LoadArgs) -> Result<LoaderConfig, AppError> {
    let config = LoaderConfig::from_env()?;
    apply_args(config, args)
}

fn apply_args(mut config: LoaderConfig, args: &LoadArgs) -> Result<LoaderConfig, AppError> {
    if args.insecure_ecb {
        config.ecb_insecure_tls = true;
    }
    let start = args.start.unwrap_or(config.range.start);
    let end = args.end.unwrap_or(config.range.end);
    config.range = DateRange::new(start, end)?;
    Ok(config)
}
