//! Loader configuration.
//!
//! Values come from the caller directly or from the environment (with `.env`
//! support). CLI flags are applied on top by `app`.

use chrono::NaiveDate;

use crate::data::{ecb, fred};
use crate::domain::DateRange;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    pub fred_api_key: String,
    pub fred_url: String,
    pub ecb_url: String,
    /// Skip certificate verification for the ECB download only.
    pub ecb_insecure_tls: bool,
    /// Window every dataset is restricted to by `load_all`.
    pub range: DateRange,
}

impl LoaderConfig {
    pub fn new(fred_api_key: impl Into<String>) -> Self {
        Self {
            fred_api_key: fred_api_key.into(),
            fred_url: fred::BASE_URL.to_string(),
            ecb_url: ecb::ARCHIVE_URL.to_string(),
            ecb_insecure_tls: false,
            range: DateRange::default(),
        }
    }

    /// Read `FRED_API_KEY` (required), `ECB_INSECURE_TLS`, `MACRO_START` and
    /// `MACRO_END` from the environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let api_key = lookup("FRED_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::config("Missing FRED_API_KEY in environment (.env)."))?;
        let mut config = Self::new(api_key.trim());

        if let Some(raw) = lookup("ECB_INSECURE_TLS") {
            config.ecb_insecure_tls = parse_flag("ECB_INSECURE_TLS", &raw)?;
        }

        let start = match lookup("MACRO_START") {
            Some(raw) => parse_date("MACRO_START", &raw)?,
            None => config.range.start,
        };
        let end = match lookup("MACRO_END") {
            Some(raw) => parse_date("MACRO_END", &raw)?,
            None => config.range.end,
        };
        config.range = DateRange::new(start, end)?;

        Ok(config)
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(AppError::config(format!(
            "Invalid {name} value '{other}' (expected true/false)."
        ))),
    }
}

pub fn parse_date(name: &str, raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| AppError::config(format!("Invalid {name} date '{raw}': {e}")))
}
