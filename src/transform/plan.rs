//! Named transform stages and the ordered plan that runs them.
//!
//! The cleaning steps have ordering dependencies (YoY must see forward-filled
//! levels and run before the final drop, cross rates need the inverted base).
//! Encoding them as a validated `Plan` makes those dependencies checkable
//! instead of implicit in call order.

use tracing::debug;

use crate::domain::{Frame, Frequency};
use crate::error::AppError;
use crate::transform::fx::{CrossPair, derive_cross_rates, invert_pair};
use crate::transform::resample::{forward_fill, resample_last, year_over_year};

/// One transform step.
#[derive(Debug, Clone)]
pub enum Stage {
    /// Pre: any frame. Post: index is consecutive labels at the frequency,
    /// each cell the last present value in its bin (missing for empty bins).
    Resample(Frequency),
    /// Pre: any frame. Post: no missing cell follows a present cell in the
    /// same column.
    ForwardFill,
    /// Pre: levels, forward-filled. Post: percent change against `periods`
    /// rows earlier; the first `periods` rows are missing.
    YearOverYear { periods: usize },
    /// Pre: any frame. Post: `source` replaced by `target = 1 / source`
    /// (no-op when `source` is absent).
    InvertPair { source: String, target: String },
    /// Pre: `base` produced by an earlier `InvertPair`. Post: one column per
    /// pair, `base * rates[source]` on exact date matches.
    DeriveCrossRates {
        base: String,
        rates: Frame,
        pairs: Vec<CrossPair>,
    },
    /// Pre: any frame. Post: `column` is first if present.
    MoveFirst(String),
    /// Pre: any frame. Post: frame is dense.
    DropIncomplete,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Resample(_) => "resample",
            Stage::ForwardFill => "forward-fill",
            Stage::YearOverYear { .. } => "year-over-year",
            Stage::InvertPair { .. } => "invert-pair",
            Stage::DeriveCrossRates { .. } => "derive-cross-rates",
            Stage::MoveFirst(_) => "move-first",
            Stage::DropIncomplete => "drop-incomplete",
        }
    }

    fn apply(&self, frame: &mut Frame) -> Result<(), AppError> {
        match self {
            Stage::Resample(freq) => *frame = resample_last(frame, *freq),
            Stage::ForwardFill => forward_fill(frame),
            Stage::YearOverYear { periods } => year_over_year(frame, *periods),
            Stage::InvertPair { source, target } => {
                invert_pair(frame, source, target)?;
            }
            Stage::DeriveCrossRates { base, rates, pairs } => {
                let added = derive_cross_rates(frame, base, rates, pairs)?;
                debug!(?added, "derived cross rates");
            }
            Stage::MoveFirst(column) => {
                frame.move_first(column);
            }
            Stage::DropIncomplete => {
                let dropped = frame.drop_incomplete();
                debug!(dropped, "dropped incomplete rows");
            }
        }
        Ok(())
    }
}

/// How a plain (non-FX) dataset is cleaned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleaningPolicy {
    pub frequency: Frequency,
    /// `Some(n)` converts levels to percent change over `n` periods.
    pub yoy_periods: Option<usize>,
}

impl CleaningPolicy {
    /// Resample, forward-fill, optional YoY, drop incomplete rows.
    pub fn stages(&self) -> Vec<Stage> {
        let mut stages = vec![Stage::Resample(self.frequency), Stage::ForwardFill];
        if let Some(periods) = self.yoy_periods {
            stages.push(Stage::YearOverYear { periods });
        }
        stages.push(Stage::DropIncomplete);
        stages
    }
}

/// An ordered, validated list of stages.
#[derive(Debug, Clone)]
pub struct Plan {
    stages: Vec<Stage>,
}

impl Plan {
    pub fn new(stages: Vec<Stage>) -> Result<Self, AppError> {
        if stages.is_empty() {
            return Err(AppError::runtime("Transform plan has no stages."));
        }

        for (i, stage) in stages.iter().enumerate() {
            let before = &stages[..i];
            let after = &stages[i + 1..];
            match stage {
                Stage::YearOverYear { .. } => {
                    if !before.iter().any(|s| matches!(s, Stage::ForwardFill)) {
                        return Err(AppError::runtime(
                            "year-over-year stage must follow a forward-fill stage.",
                        ));
                    }
                    if !after.iter().any(|s| matches!(s, Stage::DropIncomplete)) {
                        return Err(AppError::runtime(
                            "year-over-year stage must precede a drop-incomplete stage.",
                        ));
                    }
                }
                Stage::DeriveCrossRates { base, .. } => {
                    let inverted = before.iter().any(|s| match s {
                        Stage::InvertPair { target, .. } => target == base,
                        _ => false,
                    });
                    if !inverted {
                        return Err(AppError::runtime(format!(
                            "derive-cross-rates needs '{base}' from an earlier invert-pair stage."
                        )));
                    }
                }
                _ => {}
            }
        }

        Ok(Self { stages })
    }

    /// Run every stage in order over `frame`.
    pub fn run(&self, mut frame: Frame) -> Result<Frame, AppError> {
        for stage in &self.stages {
            stage.apply(&mut frame)?;
            debug!(
                stage = stage.name(),
                rows = frame.len(),
                cols = frame.width(),
                "stage done"
            );
        }
        Ok(frame)
    }
}
