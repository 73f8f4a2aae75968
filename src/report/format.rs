//! Formatted terminal output: metric cards, caption, long-form series, and
//! the merged-data table.
//!
//! Formatting lives here so the TUI and the `summary` command print the same
//! numbers the same way.

use chrono::Datelike;

use crate::domain::{Derived, MergedRow, Metric, ViewPoint, YearRange};
use crate::error::DataError;
use crate::report::{MetricSummary, Summary};

/// Card title, formatted value, and formatted delta for one metric.
pub fn format_card(card: &MetricSummary) -> (String, String, Option<String>) {
    let value = match card.metric {
        Metric::Housing => format!("{:.1}", card.value),
        Metric::Income => format!("${}", fmt_thousands(card.value)),
        Metric::Population => fmt_thousands(card.value),
    };
    let delta = card.delta_pct.map(fmt_delta);
    (card.metric.card_title().to_string(), value, delta)
}

/// `+4.0% YoY`, or `n/a YoY` when the YoY cell is undefined.
pub fn fmt_delta(delta: Derived) -> String {
    match delta.value() {
        Some(v) => format!("{v:+.1}% YoY"),
        None => "n/a YoY".to_string(),
    }
}

/// `Showing 2013–2023 (latest = 2023)`.
pub fn format_caption(range: YearRange, summary: &Result<Summary, DataError>) -> String {
    match summary {
        Ok(s) => format!("Showing {}–{} (latest = {})", range.lo, range.hi, s.latest_year),
        Err(_) => format!("Showing {}–{} (no data in range)", range.lo, range.hi),
    }
}

/// Metric cards as plain text, one per line.
pub fn format_summary(summary: &Summary) -> String {
    let mut out = String::new();
    for card in &summary.metrics {
        let (title, value, delta) = format_card(card);
        out.push_str(&format!("{title:<22} {value:>14}"));
        if let Some(delta) = delta {
            out.push_str(&format!("  {delta}"));
        }
        out.push('\n');
    }
    out
}

/// Long-form points as a `year  series  value` listing.
pub fn format_points(points: &[ViewPoint], decimals: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<6} {:<22} {:>14}\n", "year", "series", "value"));
    out.push_str(&format!("{:-<6} {:-<22} {:-<14}\n", "", "", ""));
    for p in points {
        out.push_str(&format!(
            "{:<6} {:<22} {:>14}\n",
            p.time.year(),
            p.series.label(),
            fmt_derived(p.value, decimals)
        ));
    }
    out
}

/// The merged-data table with every raw, index, and YoY column.
pub fn format_table(rows: &[MergedRow]) -> String {
    let mut out = String::new();

    let mut header = format!("{:<6}", "year");
    for metric in Metric::ALL {
        header.push_str(&format!(" {:>20}", metric.column()));
    }
    for metric in Metric::ALL {
        header.push_str(&format!(" {:>11}", metric.index_column()));
    }
    for metric in Metric::ALL {
        header.push_str(&format!(" {:>14}", metric.yoy_column()));
    }
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(&"-".repeat(header.trim_end().chars().count()));
    out.push('\n');

    for row in rows {
        let mut line = format!("{:<6}", row.year);
        for metric in Metric::ALL {
            line.push_str(&format!(" {:>20.2}", row.raw.get(metric)));
        }
        for metric in Metric::ALL {
            line.push_str(&format!(" {:>11}", fmt_derived(*row.index.get(metric), 2)));
        }
        for metric in Metric::ALL {
            line.push_str(&format!(" {:>14}", fmt_derived(*row.yoy.get(metric), 2)));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

/// A derived cell with `decimals` places, or `-` when undefined.
pub fn fmt_derived(value: Derived, decimals: usize) -> String {
    match value.value() {
        Some(v) => format!("{v:.decimals$}"),
        None => "-".to_string(),
    }
}

/// Rounded to a whole number with `,` thousands separators.
pub fn fmt_thousands(v: f64) -> String {
    let rounded = v.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PerMetric;

    #[test]
    fn thousands_grouping() {
        assert_eq!(fmt_thousands(0.0), "0");
        assert_eq!(fmt_thousands(999.4), "999");
        assert_eq!(fmt_thousands(1_000.0), "1,000");
        assert_eq!(fmt_thousands(446_475.0), "446,475");
        assert_eq!(fmt_thousands(92_664.6), "92,665");
        assert_eq!(fmt_thousands(-1_234_567.0), "-1,234,567");
    }

    #[test]
    fn cards_use_metric_specific_formats() {
        let card = MetricSummary {
            metric: Metric::Income,
            value: 52_000.0,
            delta_pct: Some(Derived::Value(4.0)),
        };
        let (title, value, delta) = format_card(&card);
        assert_eq!(title, "Median Income (USD)");
        assert_eq!(value, "$52,000");
        assert_eq!(delta.as_deref(), Some("+4.0% YoY"));

        let hpi = MetricSummary {
            metric: Metric::Housing,
            value: 312.456,
            delta_pct: None,
        };
        let (_, value, delta) = format_card(&hpi);
        assert_eq!(value, "312.5");
        assert_eq!(delta, None);
    }

    #[test]
    fn undefined_cells_render_as_placeholders() {
        assert_eq!(fmt_delta(Derived::DivisionEdgeCase), "n/a YoY");
        assert_eq!(fmt_delta(Derived::Value(-2.24)), "-2.2% YoY");
        assert_eq!(fmt_derived(Derived::FirstYear, 2), "-");
        assert_eq!(fmt_derived(Derived::Value(104.0), 2), "104.00");
    }

    #[test]
    fn caption_mentions_latest_year_or_empty_range() {
        let range = YearRange::new(2013, 2023);
        let summary = Ok(Summary {
            latest_year: 2022,
            metrics: Vec::new(),
        });
        assert_eq!(format_caption(range, &summary), "Showing 2013–2023 (latest = 2022)");

        let empty = Err(DataError::NoDataInRange { lo: 2013, hi: 2023 });
        assert_eq!(format_caption(range, &empty), "Showing 2013–2023 (no data in range)");
    }

    #[test]
    fn table_has_header_and_one_line_per_row() {
        let row = MergedRow {
            year: 2020,
            raw: PerMetric {
                housing: 100.0,
                income: 50_000.0,
                population: 1_000.0,
            },
            index: PerMetric::from_fn(|_| Derived::Value(100.0)),
            yoy: PerMetric::from_fn(|_| Derived::FirstYear),
        };
        let table = format_table(&[row]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("year"));
        assert!(lines[0].ends_with("Pop_yoy_pct"));
        assert!(lines[2].starts_with("2020"));
        assert!(lines[2].contains("50000.00"));
        assert!(lines[2].ends_with('-'));
    }
}
