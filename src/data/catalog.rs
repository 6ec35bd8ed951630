//! The fixed series this loader knows about.

/// Monthly CPI index levels: `(column, FRED id)`.
pub const CPI_SERIES: &[(&str, &str)] = &[
    ("EuroArea", "CP0000EZ19M086NEST"),
    ("UK", "GBRCPIALLMINMEI"),
    ("Switzerland", "CHNCPIALLMINMEI"),
    ("Sweden", "SWECPIALLMINMEI"),
    ("Norway", "NORCPIALLMINMEI"),
    ("Poland", "POLCPIALLMINMEI"),
    ("Hungary", "HUNCPIALLMINMEI"),
    ("US", "USACPIALLMINMEI"),
];

/// Daily FX noon rates: `(column, FRED id)`.
///
/// `DEXUSEU` is quoted as USD per EUR and gets inverted into [`BASE_PAIR`];
/// the rest are published as foreign units per USD.
pub const FX_SERIES: &[(&str, &str)] = &[
    ("EURUSD", "DEXUSEU"),
    ("USDGBP", "DEXUSUK"),
    ("USDCHF", "DEXSZUS"),
    ("USDSEK", "DEXSDUS"),
    ("USDNOK", "DEXNOUS"),
];

/// Column inverted to get the USD-based euro rate.
pub const INVERTED_PAIR: &str = "EURUSD";
/// USD-based euro rate; also the multiplier for ECB cross rates.
pub const BASE_PAIR: &str = "USDEUR";

/// ECB currencies pulled from the reference-rate archive: `(ECB code, column)`.
pub const ECB_CROSS_SERIES: &[(&str, &str)] = &[("PLN", "EURPLN"), ("HUF", "EURHUF")];

/// Periods for the CPI year-over-year change on monthly data.
pub const YOY_PERIODS: usize = 12;
