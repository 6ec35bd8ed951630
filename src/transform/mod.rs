//! Frame transforms: resampling, gap filling, YoY, currency arithmetic, and the
//! `Plan` that sequences them.

pub mod fx;
pub mod plan;
pub mod resample;

pub use fx::{CrossPair, derive_cross_rates, invert_pair};
pub use plan::{CleaningPolicy, Plan, Stage};
pub use resample::{forward_fill, pct_change, resample_last, year_over_year};
