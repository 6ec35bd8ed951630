//! Shared "load pipeline" logic used by the binary and by library callers.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fetch batch -> plan (resample, fill, transform, drop) -> align
//!
//! Network access goes through `SeriesSource` / `RateTableSource` so the whole
//! flow can run against in-memory sources.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::config::LoaderConfig;
use crate::data::catalog::{
    BASE_PAIR, CPI_SERIES, ECB_CROSS_SERIES, FX_SERIES, INVERTED_PAIR, YOY_PERIODS,
};
use crate::data::{EcbClient, FredClient, RateTableSource, SeriesBatch, SeriesSource, fetch_batch};
use crate::domain::{Dataset, DateRange, FetchFailure, Frame, Frequency, Provider};
use crate::error::AppError;
use crate::transform::{CleaningPolicy, CrossPair, Plan, Stage};

pub const CPI: &str = "cpi";
pub const FX: &str = "fx";

/// Id used to report a failed ECB archive fetch.
const ECB_ARCHIVE_ID: &str = "eurofxref-hist";

pub struct DataLoader<S = FredClient, R = EcbClient> {
    series: S,
    rates: R,
    range: DateRange,
}

impl DataLoader {
    /// Network-backed loader. The FRED key comes from `config`.
    pub fn new(config: &LoaderConfig) -> Result<Self, AppError> {
        let series = FredClient::with_base_url(&config.fred_api_key, &config.fred_url);
        let rates = EcbClient::new(&config.ecb_url, config.ecb_insecure_tls)?;
        Ok(Self::with_sources(series, rates, config.range))
    }
}

impl<S: SeriesSource, R: RateTableSource> DataLoader<S, R> {
    pub fn with_sources(series: S, rates: R, range: DateRange) -> Self {
        Self {
            series,
            rates,
            range,
        }
    }

    /// CPI year-over-year % for every catalog country, monthly.
    pub fn load_cpi(&self) -> Result<Dataset, AppError> {
        let batch = fetch_batch(&self.series, CPI_SERIES);
        let policy = CleaningPolicy {
            frequency: Frequency::MonthEnd,
            yoy_periods: Some(YOY_PERIODS),
        };
        let frame = clean(&batch, policy)?;
        Ok(Dataset {
            name: CPI.to_string(),
            frequency: policy.frequency,
            frame,
            failures: batch.failures,
        })
    }

    /// FX pairs, all quoted as foreign units per USD, monthly.
    ///
    /// The ECB cross rates are best-effort: if the archive cannot be fetched
    /// or parsed the dataset holds only the FRED pairs.
    pub fn load_fx(&self) -> Result<Dataset, AppError> {
        let batch = fetch_batch(&self.series, FX_SERIES);
        let mut failures = batch.failures.clone();

        let cross = match self.rates.fetch_rates(ECB_CROSS_SERIES) {
            Ok(rates) => Some(rates),
            Err(e) => {
                warn!(error = %e, "could not load ECB cross rates, continuing without them");
                failures.push(FetchFailure {
                    provider: Provider::Ecb,
                    id: ECB_ARCHIVE_ID.to_string(),
                    reason: e.to_string(),
                });
                None
            }
        };

        let plan = Plan::new(fx_stages(cross))?;
        let frame = plan.run(Frame::from_series(&batch.series))?;
        Ok(Dataset {
            name: FX.to_string(),
            frequency: Frequency::MonthEnd,
            frame,
            failures,
        })
    }

    /// Load every dataset and restrict each to the configured range.
    pub fn load_all(&self) -> Result<BTreeMap<String, Dataset>, AppError> {
        let mut datasets = BTreeMap::new();
        for dataset in [self.load_cpi()?, self.load_fx()?] {
            datasets.insert(dataset.name.clone(), dataset);
        }
        align(&mut datasets, self.range);
        Ok(datasets)
    }
}

/// Join a batch and run the plain cleaning plan over it.
pub fn clean(batch: &SeriesBatch, policy: CleaningPolicy) -> Result<Frame, AppError> {
    let plan = Plan::new(policy.stages())?;
    plan.run(Frame::from_series(&batch.series))
}

/// FX stage sequence. Cross-rate stages are included only when `cross` is set.
pub fn fx_stages(cross: Option<Frame>) -> Vec<Stage> {
    let mut stages = vec![
        Stage::Resample(Frequency::BusinessDay),
        Stage::ForwardFill,
        Stage::InvertPair {
            source: INVERTED_PAIR.to_string(),
            target: BASE_PAIR.to_string(),
        },
        Stage::DropIncomplete,
    ];
    if let Some(rates) = cross {
        stages.push(Stage::DeriveCrossRates {
            base: BASE_PAIR.to_string(),
            rates,
            pairs: ECB_CROSS_SERIES
                .iter()
                .map(|&(_, column)| CrossPair::usd_from(column))
                .collect(),
        });
        stages.push(Stage::DropIncomplete);
    }
    stages.extend([
        Stage::MoveFirst(BASE_PAIR.to_string()),
        Stage::Resample(Frequency::MonthEnd),
        // Keeps the output dense if a whole month had no rows.
        Stage::DropIncomplete,
    ]);
    stages
}

/// Restrict every dataset to `range`, each independently.
pub fn align(datasets: &mut BTreeMap<String, Dataset>, range: DateRange) {
    for dataset in datasets.values_mut() {
        dataset.frame.restrict(range);
    }
    let names: Vec<&str> = datasets.keys().map(String::as_str).collect();
    info!(datasets = ?names, start = %range.start, end = %range.end, "datasets loaded");
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{Datelike, NaiveDate, Weekday};

    use super::*;
    use crate::domain::{Column, Series};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[derive(Default)]
    struct FakeFred(HashMap<String, Series>);

    impl SeriesSource for FakeFred {
        fn fetch_series(&self, series_id: &str) -> Result<Series, AppError> {
            match self.0.get(series_id) {
                Some(series) => Ok(series.clone()),
                None => Err(AppError::runtime(format!(
                    "FRED request failed with status 400 Bad Request: {series_id}"
                ))),
            }
        }
    }

    enum FakeEcb {
        Up(Frame),
        Down,
    }

    impl RateTableSource for FakeEcb {
        fn fetch_rates(&self, _columns: &[(&str, &str)]) -> Result<Frame, AppError> {
            match self {
                FakeEcb::Up(frame) => Ok(frame.clone()),
                FakeEcb::Down => Err(AppError::runtime("ECB request failed: connection refused")),
            }
        }
    }

    fn monthly(start_year: i32, end_year: i32, f: impl Fn(usize) -> f64) -> Series {
        let mut points = Vec::new();
        let mut i = 0;
        for y in start_year..=end_year {
            for m in 1..=12 {
                points.push((d(y, m, 1), f(i)));
                i += 1;
            }
        }
        Series::from_points(points)
    }

    fn weekdays(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        start
            .iter_days()
            .take_while(|day| *day <= end)
            .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
            .collect()
    }

    fn daily(days: &[NaiveDate], f: impl Fn(usize) -> f64) -> Series {
        Series::from_points(days.iter().enumerate().map(|(i, day)| (*day, f(i))))
    }

    fn cpi_source() -> FakeFred {
        let mut fred = FakeFred::default();
        for (k, (_, id)) in CPI_SERIES.iter().enumerate() {
            fred.0.insert(
                id.to_string(),
                monthly(2010, 2025, move |i| {
                    100.0 * (1.0 + 0.002 * (k + 1) as f64).powi(i as i32)
                }),
            );
        }
        fred
    }

    fn fx_source(days: &[NaiveDate]) -> FakeFred {
        let mut fred = FakeFred::default();
        fred.0.insert(
            "DEXUSEU".into(),
            daily(days, |i| 1.25 + 0.0001 * (i % 50) as f64),
        );
        fred.0.insert("DEXUSUK".into(), daily(days, |_| 0.8));
        fred.0.insert("DEXSZUS".into(), daily(days, |_| 0.9));
        fred.0.insert("DEXSDUS".into(), daily(days, |_| 10.5));
        fred.0.insert("DEXNOUS".into(), daily(days, |_| 10.8));
        fred
    }

    fn ecb_frame(days: &[NaiveDate]) -> Frame {
        Frame::new(
            days.to_vec(),
            vec![
                Column {
                    name: "EURPLN".into(),
                    values: vec![Some(4.3); days.len()],
                },
                Column {
                    name: "EURHUF".into(),
                    values: vec![Some(390.0); days.len()],
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn cpi_has_all_countries_as_dense_yoy_from_2011() {
        let loader = DataLoader::with_sources(cpi_source(), FakeEcb::Down, DateRange::default());
        let cpi = loader.load_cpi().unwrap();

        assert_eq!(cpi.frame.width(), 8);
        assert_eq!(cpi.frame.column_names()[0], "EuroArea");
        assert_eq!(cpi.frame.first_date(), Some(d(2011, 1, 31)));
        assert_eq!(cpi.frame.last_date(), Some(d(2025, 12, 31)));
        assert!(cpi.frame.is_dense());
        assert!(cpi.failures.is_empty());

        let us = cpi.frame.column("US").unwrap();
        let expected = ((1.0f64 + 0.002 * 8.0).powi(12) - 1.0) * 100.0;
        assert!(us.iter().all(|v| (v.unwrap() - expected).abs() < 1e-9));
        assert!(
            cpi.frame
                .index()
                .iter()
                .all(|day| Frequency::MonthEnd.is_label(*day))
        );
    }

    #[test]
    fn cpi_omits_failed_series_and_reports_them() {
        let mut fred = cpi_source();
        fred.0.remove("HUNCPIALLMINMEI");
        let loader = DataLoader::with_sources(fred, FakeEcb::Down, DateRange::default());
        let cpi = loader.load_cpi().unwrap();

        assert_eq!(cpi.frame.width(), 7);
        assert!(!cpi.frame.has_column("Hungary"));
        assert_eq!(cpi.failures.len(), 1);
        assert_eq!(cpi.failures[0].id, "HUNCPIALLMINMEI");
    }

    #[test]
    fn fx_derives_usd_pairs_from_ecb_crosses() {
        let days = weekdays(d(2024, 1, 1), d(2024, 3, 31));
        let loader = DataLoader::with_sources(
            fx_source(&days),
            FakeEcb::Up(ecb_frame(&days)),
            DateRange::default(),
        );
        let fx = loader.load_fx().unwrap();

        let names = fx.frame.column_names();
        let primary = ["USDEUR", "USDGBP", "USDCHF", "USDSEK", "USDNOK"];
        assert_eq!(names[..5], primary);
        assert_eq!(names[5..], ["USDPLN", "USDHUF"]);
        assert_eq!(
            fx.frame.index(),
            &[d(2024, 1, 31), d(2024, 2, 29), d(2024, 3, 31)]
        );
        assert!(fx.frame.is_dense());
        assert!(fx.failures.is_empty());

        for day in fx.frame.index() {
            let usdeur = fx.frame.value_at("USDEUR", *day).unwrap();
            let pln = fx.frame.value_at("USDPLN", *day).unwrap();
            let huf = fx.frame.value_at("USDHUF", *day).unwrap();
            assert!((pln - usdeur * 4.3).abs() < 1e-12);
            assert!((huf - usdeur * 390.0).abs() < 1e-9);
        }

        // Last business day of January: index 22 of the weekday list.
        let jan_last = days.iter().position(|day| *day == d(2024, 1, 31)).unwrap();
        let raw = 1.25 + 0.0001 * (jan_last % 50) as f64;
        let usdeur = fx.frame.value_at("USDEUR", d(2024, 1, 31)).unwrap();
        assert!((usdeur - 1.0 / raw).abs() < 1e-12);
    }

    #[test]
    fn fx_without_ecb_keeps_primary_pairs() {
        let days = weekdays(d(2024, 1, 1), d(2024, 2, 29));
        let loader =
            DataLoader::with_sources(fx_source(&days), FakeEcb::Down, DateRange::default());
        let fx = loader.load_fx().unwrap();

        assert_eq!(fx.frame.column_names()[0], "USDEUR");
        assert_eq!(fx.frame.width(), 5);
        assert!(!fx.frame.has_column("USDPLN"));
        assert!(!fx.frame.has_column("USDHUF"));
        assert!(fx.frame.is_dense());
        assert_eq!(fx.failures.len(), 1);
        assert_eq!(fx.failures[0].provider, Provider::Ecb);
    }

    #[test]
    fn fx_drops_business_days_missing_from_ecb() {
        // The ECB skips 2024-01-01 (TARGET holiday); FRED has it.
        let days = weekdays(d(2024, 1, 1), d(2024, 2, 29));
        let ecb_days: Vec<NaiveDate> = days
            .iter()
            .copied()
            .filter(|day| *day != d(2024, 1, 1))
            .collect();
        let loader = DataLoader::with_sources(
            fx_source(&days),
            FakeEcb::Up(ecb_frame(&ecb_days)),
            DateRange::default(),
        );
        let fx = loader.load_fx().unwrap();
        assert_eq!(fx.frame.len(), 2);
        assert!(fx.frame.is_dense());
    }

    #[test]
    fn fx_without_eurusd_skips_inversion_and_crosses() {
        let days = weekdays(d(2024, 1, 1), d(2024, 1, 31));
        let mut fred = fx_source(&days);
        fred.0.remove("DEXUSEU");
        let loader =
            DataLoader::with_sources(fred, FakeEcb::Up(ecb_frame(&days)), DateRange::default());
        let fx = loader.load_fx().unwrap();

        assert_eq!(
            fx.frame.column_names(),
            vec!["USDGBP", "USDCHF", "USDSEK", "USDNOK"]
        );
        assert_eq!(fx.failures.len(), 1);
        assert_eq!(fx.failures[0].id, "DEXUSEU");
    }

    #[test]
    fn load_all_aligns_each_dataset_to_range() {
        let days = weekdays(d(2014, 6, 1), d(2016, 2, 29));
        let mut fred = cpi_source();
        fred.0.extend(fx_source(&days).0);
        let range = DateRange::new(d(2015, 1, 1), d(2015, 12, 31)).unwrap();
        let loader = DataLoader::with_sources(fred, FakeEcb::Up(ecb_frame(&days)), range);

        let all = loader.load_all().unwrap();
        assert_eq!(
            all.keys().map(String::as_str).collect::<Vec<_>>(),
            vec![CPI, FX]
        );
        for dataset in all.values() {
            assert_eq!(dataset.frame.first_date(), Some(d(2015, 1, 31)));
            assert_eq!(dataset.frame.last_date(), Some(d(2015, 12, 31)));
            assert!(dataset.frame.is_dense());
            assert!(dataset.frame.index().windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn everything_failing_yields_empty_frames_not_errors() {
        let loader =
            DataLoader::with_sources(FakeFred::default(), FakeEcb::Down, DateRange::default());
        let all = loader.load_all().unwrap();
        assert!(all.values().all(|ds| ds.frame.is_empty()));
        assert_eq!(all[CPI].failures.len(), CPI_SERIES.len());
        assert_eq!(all[FX].failures.len(), FX_SERIES.len() + 1);
    }

    #[test]
    fn fx_plan_is_valid_with_and_without_crosses() {
        assert!(Plan::new(fx_stages(None)).is_ok());
        assert!(Plan::new(fx_stages(Some(Frame::default()))).is_ok());
    }
}
