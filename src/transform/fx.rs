//! Currency-convention arithmetic.

use tracing::debug;

use crate::domain::Frame;
use crate::error::AppError;

/// Replace `source` with its reciprocal stored as `target` (appended last).
///
/// Returns `false` and leaves the frame untouched when `source` is absent.
pub fn invert_pair(frame: &mut Frame, source: &str, target: &str) -> Result<bool, AppError> {
    let Some(values) = frame.column(source) else {
        debug!(source, "pair not present, skipping inversion");
        return Ok(false);
    };
    let inverted: Vec<Option<f64>> = values
        .iter()
        .map(|cell| cell.and_then(|v| Some(1.0 / v).filter(|r| r.is_finite())))
        .collect();
    frame.remove_column(source);
    frame.set_column(target, inverted)?;
    Ok(true)
}

/// One derived cross pair: `target = base * rates[source]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossPair {
    pub source: String,
    pub target: String,
}

impl CrossPair {
    /// `EURPLN` quoted against a `USDEUR` base becomes `USDPLN`.
    ///
    /// The quote currency is the last three characters, or the whole name
    /// when it is shorter.
    pub fn usd_from(source: &str) -> Self {
        let ccy = source
            .char_indices()
            .rev()
            .nth(2)
            .map_or(source, |(i, _)| &source[i..]);
        Self {
            source: source.to_string(),
            target: format!("USD{ccy}"),
        }
    }
}

/// Append each `pair.target` as `base[t] * rates[pair.source][t]`, matching
/// `rates` to the frame by exact date.
///
/// Pairs whose source column is missing from `rates` are skipped. Returns the
/// names of the columns added; nothing is added when `base` is absent.
pub fn derive_cross_rates(
    frame: &mut Frame,
    base: &str,
    rates: &Frame,
    pairs: &[CrossPair],
) -> Result<Vec<String>, AppError> {
    let Some(base_values) = frame.column(base).map(|v| v.to_vec()) else {
        debug!(base, "base pair not present, skipping cross rates");
        return Ok(Vec::new());
    };

    let mut added = Vec::new();
    for pair in pairs {
        let Some(cross) = rates.reindexed(&pair.source, frame.index()) else {
            debug!(source = %pair.source, "cross rate column missing");
            continue;
        };
        let derived = base_values
            .iter()
            .zip(cross)
            .map(|(b, c)| Some((*b)? * c?))
            .collect();
        frame.set_column(&pair.target, derived)?;
        added.push(pair.target.clone());
    }
    Ok(added)
}
