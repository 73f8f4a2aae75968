//! Presentation shaping: summary metrics and long-form chart series.
//!
//! Everything here works on an already-filtered row slice and never fails
//! on empty input; the only "error" is [`DataError::NoDataInRange`] from
//! [`summarize`], which front-ends render as a placeholder.

use chrono::NaiveDate;

use crate::domain::{Derived, MergedRow, Metric, ValueScale, ViewPoint, YearRange};
use crate::error::DataError;

pub mod format;

pub use format::*;

/// One summary metric card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSummary {
    pub metric: Metric,
    /// Raw value in the latest row.
    pub value: f64,
    /// YoY of the latest row; `None` when the range holds a single row.
    pub delta_pct: Option<Derived>,
}

/// The three metric cards plus the year they describe.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub latest_year: i32,
    pub metrics: Vec<MetricSummary>,
}

/// Summarize the last row of `rows` (and its delta against the row before).
///
/// All three metrics are summarized regardless of the chart selection.
pub fn summarize(rows: &[MergedRow], range: YearRange) -> Result<Summary, DataError> {
    let Some(latest) = rows.last() else {
        return Err(DataError::NoDataInRange {
            lo: range.lo,
            hi: range.hi,
        });
    };
    let has_previous = rows.len() >= 2;

    let metrics = Metric::ALL
        .iter()
        .map(|&metric| MetricSummary {
            metric,
            value: *latest.raw.get(metric),
            delta_pct: has_previous.then(|| *latest.yoy.get(metric)),
        })
        .collect();

    Ok(Summary {
        latest_year: latest.year,
        metrics,
    })
}

/// Long-form trend series: raw or indexed values per selected metric.
///
/// Ordered by selection order, then ascending year.
pub fn trend_points(rows: &[MergedRow], metrics: &[Metric], scale: ValueScale) -> Vec<ViewPoint> {
    long_form(rows, metrics, |row, metric| row.scaled(metric, scale))
}

/// Long-form YoY series. Independent of the value scale.
pub fn yoy_points(rows: &[MergedRow], metrics: &[Metric]) -> Vec<ViewPoint> {
    long_form(rows, metrics, |row, metric| *row.yoy.get(metric))
}

fn long_form(
    rows: &[MergedRow],
    metrics: &[Metric],
    pick: impl Fn(&MergedRow, Metric) -> Derived,
) -> Vec<ViewPoint> {
    let mut out = Vec::with_capacity(rows.len() * metrics.len());
    for &metric in metrics {
        for row in rows {
            // Years outside chrono's calendar cannot be charted.
            let Some(time) = year_start(row.year) else {
                continue;
            };
            out.push(ViewPoint {
                time,
                value: pick(row, metric),
                series: metric,
            });
        }
    }
    out
}

/// January 1st of `year`.
pub fn year_start(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::merge::merge;
    use crate::domain::{MergedTable, PerMetric, SeriesPoint, SeriesTable};

    fn example() -> MergedTable {
        let series = |points: &[(i32, f64)]| -> Vec<SeriesPoint> {
            points.iter().map(|&(year, value)| SeriesPoint { year, value }).collect()
        };
        merge(&PerMetric {
            housing: SeriesTable {
                metric: Metric::Housing,
                points: series(&[(2020, 100.0), (2021, 110.0), (2022, 121.0)]),
            },
            income: SeriesTable {
                metric: Metric::Income,
                points: series(&[(2020, 50_000.0), (2021, 52_000.0), (2022, 54_080.0)]),
            },
            population: SeriesTable {
                metric: Metric::Population,
                points: series(&[(2020, 1_000.0), (2021, 1_010.0), (2022, 1_020.1)]),
            },
        })
    }

    #[test]
    fn summary_uses_latest_row_and_its_yoy() {
        let t = example();
        let summary = summarize(t.rows(), YearRange::new(2020, 2022)).unwrap();
        assert_eq!(summary.latest_year, 2022);
        assert_eq!(summary.metrics.len(), 3);

        let hpi = summary.metrics[0];
        assert_eq!(hpi.metric, Metric::Housing);
        assert_eq!(hpi.value, 121.0);
        let delta = hpi.delta_pct.and_then(Derived::value).unwrap();
        assert!((delta - 10.0).abs() < 1e-9);
    }

    #[test]
    fn single_row_summary_has_no_delta() {
        let t = example();
        let rows = &t.rows()[1..2];
        let summary = summarize(rows, YearRange::new(2021, 2021)).unwrap();
        assert_eq!(summary.latest_year, 2021);
        assert!(summary.metrics.iter().all(|m| m.delta_pct.is_none()));
        assert_eq!(summary.metrics[1].value, 52_000.0);
    }

    #[test]
    fn empty_rows_report_no_data_in_range() {
        let err = summarize(&[], YearRange::new(1990, 1991)).unwrap_err();
        assert!(matches!(err, DataError::NoDataInRange { lo: 1990, hi: 1991 }));
    }

    #[test]
    fn trend_points_follow_selection_order_then_year() {
        let t = example();
        let points = trend_points(t.rows(), &[Metric::Population, Metric::Housing], ValueScale::Raw);
        assert_eq!(points.len(), 6);

        let order: Vec<(Metric, i32)> = points
            .iter()
            .map(|p| (p.series, chrono::Datelike::year(&p.time)))
            .collect();
        assert_eq!(
            order,
            vec![
                (Metric::Population, 2020),
                (Metric::Population, 2021),
                (Metric::Population, 2022),
                (Metric::Housing, 2020),
                (Metric::Housing, 2021),
                (Metric::Housing, 2022),
            ]
        );
        assert_eq!(points[3].value, Derived::Value(100.0));
        assert_eq!(points[0].time, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    }

    #[test]
    fn indexed_trend_reads_index_column() {
        let t = example();
        let points = trend_points(t.rows(), &[Metric::Income], ValueScale::Indexed);
        let values: Vec<f64> = points.iter().filter_map(|p| p.value.value()).collect();
        assert!((values[0] - 100.0).abs() < 1e-9);
        assert!((values[1] - 104.0).abs() < 1e-9);
        assert!((values[2] - 108.16).abs() < 1e-9);
    }

    #[test]
    fn yoy_points_ignore_scale_and_mark_first_year() {
        let t = example();
        let points = yoy_points(t.rows(), &[Metric::Housing]);
        assert_eq!(points[0].value, Derived::FirstYear);
        assert!((points[1].value.value().unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn empty_metric_selection_yields_no_points() {
        let t = example();
        assert!(trend_points(t.rows(), &[], ValueScale::Indexed).is_empty());
        assert!(yoy_points(t.rows(), &[]).is_empty());
        assert!(trend_points(&[], &Metric::ALL, ValueScale::Raw).is_empty());
    }
}
