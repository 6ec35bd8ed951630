//! Frequency conversion and gap handling.

use chrono::NaiveDate;

use crate::domain::{Column, Frame, Frequency};

/// Resample every column to `freq`, keeping the last present value per bin.
///
/// Bins run consecutively from the label of the first index date to the label
/// of the last, so a bin with no observations becomes a row of missing cells.
pub fn resample_last(frame: &Frame, freq: Frequency) -> Frame {
    let (Some(first), Some(last)) = (frame.first_date(), frame.last_date()) else {
        return frame.clone();
    };

    let mut labels: Vec<NaiveDate> = Vec::new();
    let mut label = freq.label(first);
    let end = freq.label(last);
    loop {
        labels.push(label);
        if label >= end {
            break;
        }
        match freq.next(label) {
            Some(next) => label = next,
            None => break,
        }
    }

    // Both the index and the labels are sorted, so one forward walk maps rows to bins.
    let mut bin_of_row = Vec::with_capacity(frame.len());
    let mut bin = 0usize;
    for date in frame.index() {
        let target = freq.label(*date);
        while labels[bin] < target {
            bin += 1;
        }
        bin_of_row.push(bin);
    }

    let columns = frame
        .columns()
        .iter()
        .map(|col| {
            let mut values = vec![None; labels.len()];
            for (row, cell) in col.values.iter().enumerate() {
                if let Some(v) = cell {
                    values[bin_of_row[row]] = Some(*v);
                }
            }
            Column {
                name: col.name.clone(),
                values,
            }
        })
        .collect();

    Frame::from_parts(labels, columns)
}

/// Replace each missing cell with the last earlier present value in its column.
/// Leading gaps stay missing.
pub fn forward_fill(frame: &mut Frame) {
    let names: Vec<String> = frame.columns().iter().map(|c| c.name.clone()).collect();
    for name in names {
        let Some(values) = frame.column(&name) else {
            continue;
        };
        let mut last = None;
        let filled: Vec<Option<f64>> = values
            .iter()
            .map(|cell| {
                if cell.is_some() {
                    last = *cell;
                }
                last
            })
            .collect();
        // Lengths match by construction.
        let _ = frame.set_column(&name, filled);
    }
}

/// Percent change against the value `periods` rows earlier:
/// `(v[t] / v[t - periods] - 1) * 100`.
///
/// Missing when there is no earlier row, either operand is missing, or the
/// result is not finite.
pub fn pct_change(values: &[Option<f64>], periods: usize) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(t, cur)| {
            let prev = t.checked_sub(periods).and_then(|p| values[p])?;
            let change = (cur.as_ref()? / prev - 1.0) * 100.0;
            change.is_finite().then_some(change)
        })
        .collect()
}

/// Apply [`pct_change`] to every column.
pub fn year_over_year(frame: &mut Frame, periods: usize) {
    let names: Vec<String> = frame.columns().iter().map(|c| c.name.clone()).collect();
    for name in names {
        let Some(values) = frame.column(&name) else {
            continue;
        };
        let changed = pct_change(values, periods);
        let _ = frame.set_column(&name, changed);
    }
}
