//! External data providers.
//!
//! - FRED per-series observations (`fred`)
//! - ECB reference-rate archive (`ecb`)
//! - the fixed series catalog (`catalog`)

pub mod catalog;
pub mod ecb;
pub mod fred;

pub use ecb::{EcbClient, RateTableSource};
pub use fred::{FredClient, SeriesBatch, SeriesSource, fetch_batch};
