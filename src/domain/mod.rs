//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the date-indexed table every dataset is held in (`Frame`)
//! - resample frequencies and alignment windows (`Frequency`, `DateRange`)
//! - raw observations and fetch bookkeeping (`Series`, `FetchFailure`)

pub mod frame;
pub mod types;

pub use frame::*;
pub use types::*;
