//! Text formatting of dataset summaries.
//!
//! Formatting lives here so the pipeline stays free of presentation code and
//! output changes stay localized.

use crate::domain::{Dataset, Frame};

/// Header, shape, date span, fetch failures and the last `tail` rows.
pub fn format_dataset(dataset: &Dataset, tail: usize) -> String {
    let frame = &dataset.frame;
    let mut out = String::new();

    let frequency = dataset.frequency.display_name();
    out.push_str(&format!("=== {} ({frequency}) ===\n", dataset.name));
    match (frame.first_date(), frame.last_date()) {
        (Some(first), Some(last)) => out.push_str(&format!(
            "Rows: {} | Columns: {} | Span: {first} .. {last}\n",
            frame.len(),
            frame.width()
        )),
        _ => out.push_str(&format!("Rows: 0 | Columns: {}\n", frame.width())),
    }

    if !dataset.failures.is_empty() {
        out.push_str("Missing sources:\n");
        for failure in &dataset.failures {
            out.push_str(&format!("  - {failure}\n"));
        }
    }

    if tail > 0 && !frame.is_empty() && frame.width() > 0 {
        out.push('\n');
        out.push_str(&format_tail(frame, tail));
    }

    out
}

/// Format the last `n` rows as an aligned table.
pub fn format_tail(frame: &Frame, n: usize) -> String {
    let mut out = String::new();
    let names = frame.column_names();
    let widths: Vec<usize> = names.iter().map(|name| name.len().max(10)).collect();

    let mut header = format!("{:<10}", "date");
    for (name, &w) in names.iter().zip(&widths) {
        header.push_str(&format!(" {name:>w$}"));
    }
    out.push_str(header.trim_end());
    out.push('\n');

    let mut rule = format!("{:-<10}", "");
    for &w in &widths {
        rule.push_str(&format!(" {:-<w$}", ""));
    }
    out.push_str(&rule);
    out.push('\n');

    let start = frame.len().saturating_sub(n);
    for row in start..frame.len() {
        let mut line = format!("{:<10}", frame.index()[row]);
        for (cell, &w) in frame.row(row).iter().zip(&widths) {
            line.push_str(&format!(" {:>w$}", fmt_cell(*cell)));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

fn fmt_cell(cell: Option<f64>) -> String {
    match cell {
        Some(v) if v.is_finite() => format!("{v:.4}"),
        _ => "-".to_string(),
    }
}
