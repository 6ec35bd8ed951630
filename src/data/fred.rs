//! FRED API integration: per-series observation fetches.

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{FetchFailure, Provider, Series};
use crate::error::AppError;

pub const BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
const OBS_LIMIT: usize = 100_000;

/// Anything that can return the full history of a series by provider id.
///
/// `FredClient` is the network implementation; tests substitute in-memory ones.
pub trait SeriesSource {
    fn fetch_series(&self, series_id: &str) -> Result<Series, AppError>;
}

pub struct FredClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl FredClient {
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

impl SeriesSource for FredClient {
    fn fetch_series(&self, series_id: &str) -> Result<Series, AppError> {
        debug!(series_id, "requesting FRED series");
        let limit = OBS_LIMIT.to_string();
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("series_id", series_id),
                ("api_key", self.api_key.as_str()),
                ("file_type", "json"),
                ("sort_order", "asc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .map_err(|e| AppError::runtime(format!("FRED request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            // FRED reports the cause in a JSON body; fall back to the status alone.
            let detail = resp
                .json::<ErrorResponse>()
                .ok()
                .and_then(|body| body.error_message)
                .map(|msg| format!(": {msg}"))
                .unwrap_or_default();
            return Err(AppError::runtime(format!(
                "FRED request failed with status {status}{detail}"
            )));
        }

        let body: ObservationsResponse = resp
            .json()
            .map_err(|e| AppError::runtime(format!("Failed to parse FRED response: {e}")))?;

        parse_observations(body.observations)
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error_message: Option<String>,
}

fn parse_observations(observations: Vec<Observation>) -> Result<Series, AppError> {
    let mut out = Vec::with_capacity(observations.len());
    for obs in observations {
        let Some(value) = parse_value(&obs.value) else {
            continue;
        };
        let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d")
            .map_err(|e| AppError::runtime(format!("Invalid FRED date '{}': {e}", obs.date)))?;
        out.push((date, value));
    }
    Ok(Series::from_points(out))
}

/// FRED marks missing observations with `"."`.
fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "." || trimmed.is_empty() {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Successful series of a batch, in request order, plus what was left out.
#[derive(Debug, Clone, Default)]
pub struct SeriesBatch {
    pub series: Vec<(String, Series)>,
    pub failures: Vec<FetchFailure>,
}

impl SeriesBatch {
    pub fn names(&self) -> Vec<&str> {
        self.series.iter().map(|(name, _)| name.as_str()).collect()
    }
}

/// Fetch `(column, series_id)` pairs one after another.
///
/// A failed or empty series is logged, recorded in `failures` and left out;
/// it never aborts the rest of the batch.
pub fn fetch_batch<S: SeriesSource + ?Sized>(source: &S, codes: &[(&str, &str)]) -> SeriesBatch {
    let mut batch = SeriesBatch::default();
    for &(name, series_id) in codes {
        let reason = match source.fetch_series(series_id) {
            Ok(series) if !series.is_empty() => {
                debug!(series_id, n_obs = series.len(), "fetched series");
                batch.series.push((name.to_string(), series));
                continue;
            }
            Ok(_) => "no observations returned".to_string(),
            Err(e) => e.to_string(),
        };
        warn!(series_id, column = name, %reason, "skipping series");
        batch.failures.push(FetchFailure {
            provider: Provider::Fred,
            id: series_id.to_string(),
            reason,
        });
    }
    batch
}
