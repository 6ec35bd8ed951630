//! ECB euro reference rates: bulk historical archive download + parsing.
//!
//! The ECB publishes its full history as a zip holding a single CSV:
//! a `Date` column followed by one column per currency (units per EUR),
//! with `N/A` for days a currency was not quoted.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use chrono::NaiveDate;
use reqwest::blocking::Client;
use tracing::{debug, info};
use zip::ZipArchive;

use crate::domain::{Column, Frame};
use crate::error::AppError;
use crate::transform::forward_fill;

pub const ARCHIVE_URL: &str = "https://www.ecb.europa.eu/stats/eurofxref/eurofxref-hist.zip";
pub const CSV_ENTRY: &str = "eurofxref-hist.csv";

/// Anything that can produce the cross-rate table.
///
/// `columns` maps ECB currency codes to output column names, e.g.
/// `("PLN", "EURPLN")`. The returned frame is sorted and forward-filled.
pub trait RateTableSource {
    fn fetch_rates(&self, columns: &[(&str, &str)]) -> Result<Frame, AppError>;
}

pub struct EcbClient {
    client: Client,
    url: String,
}

impl EcbClient {
    /// `insecure_tls` disables certificate verification for this client only.
    pub fn new(url: impl Into<String>, insecure_tls: bool) -> Result<Self, AppError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(insecure_tls)
            .build()
            .map_err(|e| AppError::runtime(format!("Failed to build ECB HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    fn download(&self) -> Result<Vec<u8>, AppError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| AppError::runtime(format!("ECB request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::runtime(format!(
                "ECB request failed with status {}.",
                resp.status()
            )));
        }

        let bytes = resp
            .bytes()
            .map_err(|e| AppError::runtime(format!("Failed to read ECB archive: {e}")))?;
        info!(bytes = bytes.len(), "downloaded ECB archive");
        Ok(bytes.to_vec())
    }
}

impl RateTableSource for EcbClient {
    fn fetch_rates(&self, columns: &[(&str, &str)]) -> Result<Frame, AppError> {
        let bytes = self.download()?;
        parse_archive(&bytes, columns)
    }
}

/// Extract the rate CSV from the archive bytes and parse it.
pub fn parse_archive(bytes: &[u8], columns: &[(&str, &str)]) -> Result<Frame, AppError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AppError::runtime(format!("Invalid ECB archive: {e}")))?;
    let entry = archive
        .by_name(CSV_ENTRY)
        .map_err(|e| AppError::runtime(format!("ECB archive has no '{CSV_ENTRY}': {e}")))?;
    parse_rates_csv(entry, columns)
}

/// Parse the ECB rate CSV, keeping `columns` under their new names.
///
/// Every requested currency must be present in the header. Rows with an
/// unparseable date are skipped; `N/A` and empty cells are missing values and
/// get forward-filled.
pub fn parse_rates_csv<R: Read>(reader: R, columns: &[(&str, &str)]) -> Result<Frame, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::runtime(format!("Failed to read ECB CSV headers: {e}")))?
        .clone();

    let date_idx = headers
        .iter()
        .position(|h| h == "Date")
        .ok_or_else(|| AppError::runtime("ECB CSV has no 'Date' column."))?;

    let mut wanted = Vec::with_capacity(columns.len());
    for &(code, _) in columns {
        let idx = headers
            .iter()
            .position(|h| h == code)
            .ok_or_else(|| AppError::runtime(format!("ECB CSV has no '{code}' column.")))?;
        wanted.push(idx);
    }

    let mut rows: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        let record =
            result.map_err(|e| AppError::runtime(format!("ECB CSV parse error: {e}")))?;
        let date = record
            .get(date_idx)
            .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok());
        let Some(date) = date else {
            skipped += 1;
            continue;
        };
        let values = wanted
            .iter()
            .map(|&idx| record.get(idx).and_then(parse_rate))
            .collect();
        rows.insert(date, values);
    }
    if skipped > 0 {
        debug!(skipped, "ECB rows with unparseable dates skipped");
    }

    let index: Vec<NaiveDate> = rows.keys().copied().collect();
    let mut cols: Vec<Column> = columns
        .iter()
        .map(|&(_, name)| Column {
            name: name.to_string(),
            values: Vec::with_capacity(index.len()),
        })
        .collect();
    for values in rows.into_values() {
        for (col, value) in cols.iter_mut().zip(values) {
            col.values.push(value);
        }
    }

    let mut frame = Frame::new(index, cols)?;
    forward_fill(&mut frame);
    Ok(frame)
}

fn parse_rate(raw: &str) -> Option<f64> {
    let v = raw.trim().parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    use super::*;

    const COLUMNS: &[(&str, &str)] = &[("PLN", "EURPLN"), ("HUF", "EURHUF")];

    // Newest first, trailing comma, as published.
    const CSV: &str = "\
Date,USD,JPY,HUF,PLN,CYP,
2024-01-04,1.0953,158.8,378.5,4.3565,N/A,
2024-01-03,1.0919,155.7,N/A,4.3638,N/A,
not-a-date,1.0,1.0,1.0,1.0,N/A,
2024-01-02,1.0956,155.6,379.1,4.3520,N/A,
";

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn zipped(name: &str, body: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file(name, options).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn csv_is_sorted_renamed_and_forward_filled() {
        let frame = parse_rates_csv(CSV.as_bytes(), COLUMNS).unwrap();

        assert_eq!(
            frame.index(),
            &[d(2024, 1, 2), d(2024, 1, 3), d(2024, 1, 4)]
        );
        assert_eq!(frame.column_names(), vec!["EURPLN", "EURHUF"]);
        assert_eq!(
            frame.column("EURHUF").unwrap(),
            &[Some(379.1), Some(379.1), Some(378.5)]
        );
        assert_eq!(frame.value_at("EURPLN", d(2024, 1, 3)), Some(4.3638));
    }

    #[test]
    fn missing_currency_column_is_an_error() {
        let err = parse_rates_csv(CSV.as_bytes(), &[("XYZ", "EURXYZ")]).unwrap_err();
        assert!(err.message().contains("XYZ"));
    }

    #[test]
    fn archive_round_trip_through_zip() {
        let bytes = zipped(CSV_ENTRY, CSV);
        let frame = parse_archive(&bytes, COLUMNS).unwrap();
        assert_eq!(frame.len(), 3);
        assert!(frame.is_dense());
    }

    #[test]
    fn archive_without_expected_entry_or_garbage_fails() {
        let bytes = zipped("other.csv", CSV);
        assert!(parse_archive(&bytes, COLUMNS).is_err());
        assert!(parse_archive(b"<html>maintenance</html>", COLUMNS).is_err());
    }
}
