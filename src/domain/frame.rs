//! Date-indexed table of named `f64` columns.
//!
//! A `Frame` is the in-memory shape of every dataset: one strictly increasing
//! date index and any number of equally long columns whose cells may be
//! missing (`None`). Transform stages mutate frames in place; the pipeline
//! guarantees that returned frames are dense.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::domain::{DateRange, Series};
use crate::error::AppError;

/// A named column. `values[i]` belongs to `index[i]` of the owning frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    index: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl Frame {
    /// Build a frame, validating that the index is strictly increasing and
    /// that every column matches its length.
    pub fn new(index: Vec<NaiveDate>, columns: Vec<Column>) -> Result<Self, AppError> {
        if index.windows(2).any(|w| w[0] >= w[1]) {
            return Err(AppError::runtime("Frame index must be strictly increasing."));
        }
        for col in &columns {
            if col.values.len() != index.len() {
                return Err(AppError::runtime(format!(
                    "Column '{}' has {} values for an index of {} rows.",
                    col.name,
                    col.values.len(),
                    index.len()
                )));
            }
        }
        let mut seen = BTreeSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(AppError::runtime(format!("Duplicate column '{}'.", col.name)));
            }
        }
        Ok(Self { index, columns })
    }

    /// Outer-join named series on the union of their dates.
    ///
    /// Column order follows `series`; cells are `None` where a series has no
    /// observation on a date another series has.
    pub fn from_series(series: &[(String, Series)]) -> Self {
        let index: Vec<NaiveDate> = series
            .iter()
            .flat_map(|(_, s)| s.dates())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let columns = series
            .iter()
            .map(|(name, s)| Column {
                name: name.clone(),
                values: index.iter().map(|d| s.get(*d)).collect(),
            })
            .collect();

        Self { index, columns }
    }

    /// Replace index and columns wholesale. Callers uphold the invariants.
    pub(crate) fn from_parts(index: Vec<NaiveDate>, columns: Vec<Column>) -> Self {
        debug_assert!(index.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(columns.iter().all(|c| c.values.len() == index.len()));
        Self { index, columns }
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.index.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.index.last().copied()
    }

    /// Value of `name` on `date`, if both exist and the cell is present.
    pub fn value_at(&self, name: &str, date: NaiveDate) -> Option<f64> {
        let row = self.index.binary_search(&date).ok()?;
        self.column(name)?.get(row).copied().flatten()
    }

    /// Cells of `name` looked up at each date of `index` (exact match only).
    pub fn reindexed(&self, name: &str, index: &[NaiveDate]) -> Option<Vec<Option<f64>>> {
        let values = self.column(name)?;
        Some(
            index
                .iter()
                .map(|d| {
                    self.index
                        .binary_search(d)
                        .ok()
                        .and_then(|row| values[row])
                })
                .collect(),
        )
    }

    /// Set a column, replacing one with the same name in place or appending.
    pub fn set_column(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<(), AppError> {
        if values.len() != self.index.len() {
            return Err(AppError::runtime(format!(
                "Column '{name}' has {} values for an index of {} rows.",
                values.len(),
                self.index.len()
            )));
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(col) => col.values = values,
            None => self.columns.push(Column {
                name: name.to_string(),
                values,
            }),
        }
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let pos = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(pos))
    }

    /// Move `name` to the first position. Returns `false` if it is absent.
    pub fn move_first(&mut self, name: &str) -> bool {
        match self.columns.iter().position(|c| c.name == name) {
            Some(pos) => {
                let col = self.columns.remove(pos);
                self.columns.insert(0, col);
                true
            }
            None => false,
        }
    }

    /// Keep rows for which `keep(row)` is true.
    fn retain_rows(&mut self, keep: impl Fn(usize) -> bool) {
        let rows: Vec<usize> = (0..self.index.len()).filter(|&i| keep(i)).collect();
        self.index = rows.iter().map(|&i| self.index[i]).collect();
        for col in &mut self.columns {
            col.values = rows.iter().map(|&i| col.values[i]).collect();
        }
    }

    fn row_is_complete(&self, row: usize) -> bool {
        self.columns.iter().all(|c| c.values[row].is_some())
    }

    /// Drop every row with at least one missing cell. Returns rows dropped.
    pub fn drop_incomplete(&mut self) -> usize {
        let before = self.len();
        let complete: Vec<bool> = (0..before).map(|i| self.row_is_complete(i)).collect();
        self.retain_rows(|i| complete[i]);
        before - self.len()
    }

    /// Keep only rows inside `range` (inclusive).
    pub fn restrict(&mut self, range: DateRange) {
        let dates = self.index.clone();
        self.retain_rows(|i| range.contains(dates[i]));
    }

    /// True when no cell is missing.
    pub fn is_dense(&self) -> bool {
        self.columns
            .iter()
            .all(|c| c.values.iter().all(Option::is_some))
    }

    /// Cells of one row in column order.
    pub fn row(&self, row: usize) -> Vec<Option<f64>> {
        self.columns.iter().map(|c| c.values[row]).collect()
    }
}
