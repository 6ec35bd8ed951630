//! Terminal reporting for loaded datasets.

pub mod format;

pub use format::*;
