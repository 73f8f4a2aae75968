//! Shared dashboard pipeline used by the CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load (cached) -> clamp selection -> filter -> summary + long-form series
//!
//! The front-ends then focus on presentation (printing vs widgets).

use std::path::Path;
use std::sync::Arc;

use crate::data::{MergedCache, clamp_selection, filter_rows};
use crate::domain::{MergedRow, MergedTable, Selection, ViewPoint};
use crate::error::{AppError, DataError};
use crate::report::{Summary, summarize, trend_points, yoy_points};

/// Everything one render pass needs.
#[derive(Debug)]
pub struct DashboardView {
    /// The selection after clamping to the table's years.
    pub selection: Selection,
    /// Filtered merged rows, ascending by year.
    pub rows: Vec<MergedRow>,
    /// Metric cards, or `NoDataInRange` when the range is empty.
    pub summary: Result<Summary, DataError>,
    pub trend: Vec<ViewPoint>,
    /// `None` when the YoY view is switched off.
    pub yoy: Option<Vec<ViewPoint>>,
}

/// Load and merge the sources in `data_dir` through the process-wide cache.
pub fn load_merged(data_dir: &Path) -> Result<Arc<MergedTable>, AppError> {
    Ok(MergedCache::global().get_or_load(data_dir)?)
}

/// Run one filter + shape pass. Never fails: empty selections produce an
/// empty view with `NoDataInRange` in place of the summary.
pub fn render_pass(table: &MergedTable, selection: &Selection) -> DashboardView {
    let selection = clamp_selection(selection, table);
    let rows = filter_rows(table.rows(), selection.range);

    let summary = summarize(rows, selection.range);
    let trend = trend_points(rows, &selection.metrics, selection.scale);
    let yoy = selection
        .show_yoy
        .then(|| yoy_points(rows, &selection.metrics));

    DashboardView {
        rows: rows.to_vec(),
        summary,
        trend,
        yoy,
        selection,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{default_selection, merge};
    use crate::domain::{Metric, PerMetric, SeriesPoint, SeriesTable, ValueScale, YearRange};

    fn table() -> MergedTable {
        let points: Vec<SeriesPoint> = (2000..=2020)
            .map(|year| SeriesPoint {
                year,
                value: (year - 1990) as f64,
            })
            .collect();
        merge(&PerMetric::from_fn(|metric| SeriesTable {
            metric,
            points: points.clone(),
        }))
    }

    #[test]
    fn default_pass_shows_last_decade_for_all_metrics() {
        let t = table();
        let view = render_pass(&t, &default_selection(&t));
        assert_eq!(view.selection.range, YearRange::new(2010, 2020));
        assert_eq!(view.rows.len(), 11);
        assert_eq!(view.trend.len(), 33);
        assert_eq!(view.yoy.as_ref().map(Vec::len), Some(33));
        assert_eq!(view.summary.unwrap().latest_year, 2020);
    }

    #[test]
    fn out_of_bounds_range_is_clamped() {
        let t = table();
        let mut selection = default_selection(&t);
        selection.range = YearRange::new(1900, 2100);
        let view = render_pass(&t, &selection);
        assert_eq!(view.selection.range, YearRange::new(2000, 2020));
        assert_eq!(view.rows.len(), 21);
    }

    #[test]
    fn yoy_toggle_and_empty_metrics_never_fail() {
        let t = table();
        let mut selection = default_selection(&t);
        selection.show_yoy = false;
        selection.metrics.clear();
        selection.scale = ValueScale::Indexed;

        let view = render_pass(&t, &selection);
        assert!(view.yoy.is_none());
        assert!(view.trend.is_empty());
        assert!(view.summary.is_ok());
    }

    #[test]
    fn empty_table_renders_no_data() {
        let empty = MergedTable::default();
        let view = render_pass(&empty, &default_selection(&empty));
        assert!(view.rows.is_empty());
        assert!(view.trend.is_empty());
        assert!(matches!(view.summary, Err(DataError::NoDataInRange { .. })));
    }

    #[test]
    fn single_year_range_has_values_without_deltas() {
        let t = table();
        let mut selection = default_selection(&t);
        selection.range = YearRange::new(2015, 2015);
        selection.metrics = vec![Metric::Income];

        let view = render_pass(&t, &selection);
        let summary = view.summary.unwrap();
        assert_eq!(summary.latest_year, 2015);
        assert!(summary.metrics.iter().all(|m| m.delta_pct.is_none()));
        assert_eq!(view.trend.len(), 1);
    }
}
