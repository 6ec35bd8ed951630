//! Shared domain types.
//!
//! - calendar helpers for the two resample frequencies (`Frequency`)
//! - raw provider observations (`Series`)
//! - fetch bookkeeping (`Provider`, `FetchFailure`)
//! - pipeline outputs (`Dataset`)

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::domain::Frame;
use crate::error::AppError;

/// Target frequency of a resample stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    /// One row per calendar month, labelled with the month's last day.
    MonthEnd,
    /// One row per weekday. Weekend observations fall into the preceding Friday.
    BusinessDay,
}

impl Frequency {
    /// The bin label a date belongs to.
    pub fn label(self, date: NaiveDate) -> NaiveDate {
        match self {
            Frequency::MonthEnd => month_end(date),
            Frequency::BusinessDay => match date.weekday() {
                Weekday::Sat => date.pred_opt().unwrap_or(date),
                Weekday::Sun => date.pred_opt().and_then(|d| d.pred_opt()).unwrap_or(date),
                _ => date,
            },
        }
    }

    /// The label following `label`, or `None` past the end of the calendar.
    pub fn next(self, label: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::MonthEnd => label.succ_opt().map(month_end),
            Frequency::BusinessDay => {
                let mut d = label.succ_opt()?;
                while matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
                    d = d.succ_opt()?;
                }
                Some(d)
            }
        }
    }

    /// Whether `date` is itself a valid label at this frequency.
    pub fn is_label(self, date: NaiveDate) -> bool {
        self.label(date) == date
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Frequency::MonthEnd => "month-end",
            Frequency::BusinessDay => "business-day",
        }
    }
}

fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

/// Inclusive date window used to align datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::config(format!(
                "Invalid date range: start {start} is after end {end}."
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl Default for DateRange {
    /// 2015-01-01 through 2025-12-31.
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap_or_default(),
        }
    }
}

/// Raw observations for one provider series, keyed and ordered by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    points: BTreeMap<NaiveDate, f64>,
}

impl Series {
    /// Build from `(date, value)` pairs. A later duplicate date wins.
    pub fn from_points(points: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        Self {
            points: points.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points.get(&date).copied()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.keys().copied()
    }
}

/// Which external provider a fetch went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Fred,
    Ecb,
}

impl Provider {
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Fred => "FRED",
            Provider::Ecb => "ECB",
        }
    }
}

/// A series (or archive) that could not be fetched and was left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub provider: Provider,
    pub id: String,
    pub reason: String,
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let provider = self.provider.display_name();
        write!(f, "{provider} {}: {}", self.id, self.reason)
    }
}

/// One cleaned, dense table plus what went missing while building it.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub frequency: Frequency,
    pub frame: Frame,
    pub failures: Vec<FetchFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn month_end_labels_handle_leap_years_and_december() {
        let month = Frequency::MonthEnd;
        assert_eq!(month.label(d(2024, 2, 3)), d(2024, 2, 29));
        assert_eq!(month.label(d(2023, 2, 28)), d(2023, 2, 28));
        assert_eq!(month.label(d(2023, 12, 1)), d(2023, 12, 31));
        assert_eq!(month.next(d(2023, 12, 31)), Some(d(2024, 1, 31)));
        assert_eq!(month.next(d(2024, 1, 31)), Some(d(2024, 2, 29)));
    }

    #[test]
    fn business_day_labels_fold_weekends_into_friday() {
        // 2024-03-08 is a Friday.
        let bday = Frequency::BusinessDay;
        assert_eq!(bday.label(d(2024, 3, 9)), d(2024, 3, 8));
        assert_eq!(bday.label(d(2024, 3, 10)), d(2024, 3, 8));
        assert_eq!(bday.label(d(2024, 3, 11)), d(2024, 3, 11));
        assert_eq!(bday.next(d(2024, 3, 8)), Some(d(2024, 3, 11)));
        assert!(!bday.is_label(d(2024, 3, 9)));
    }

    #[test]
    fn date_range_rejects_inverted_bounds() {
        let err = DateRange::new(d(2025, 1, 1), d(2024, 1, 1)).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let range = DateRange::default();
        assert!(range.contains(d(2015, 1, 1)));
        assert!(range.contains(d(2025, 12, 31)));
        assert!(!range.contains(d(2026, 1, 1)));
    }

    #[test]
    fn series_keeps_last_duplicate_and_sorts() {
        let s = Series::from_points([
            (d(2024, 2, 1), 2.0),
            (d(2024, 1, 1), 1.0),
            (d(2024, 2, 1), 3.0),
        ]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.get(d(2024, 2, 1)), Some(3.0));
        assert_eq!(s.dates().next(), Some(d(2024, 1, 1)));
    }
}
