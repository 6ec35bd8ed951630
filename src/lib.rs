//! `macro-data` library crate.
//!
//! Fetches CPI and FX series from FRED and the ECB, cleans them into dense
//! monthly tables and aligns them on a shared date range. The binary is a thin
//! wrapper that prints summaries; library callers use `app::DataLoader`.

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod report;
pub mod transform;

pub use app::DataLoader;
pub use config::LoaderConfig;
pub use domain::{Dataset, DateRange, Frame};
pub use error::AppError;
