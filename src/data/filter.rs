//! Year-range filtering and selection defaults.
//!
//! Filtering is a view over the merged table: rows are borrowed, never
//! re-derived, so index values keep their full-table base.

use crate::domain::{MergedRow, MergedTable, Metric, Selection, ValueScale, YearBounds, YearRange};

/// Years shown by default: the last decade of data.
pub const DEFAULT_WINDOW_YEARS: i32 = 10;

/// Rows with `lo <= year <= hi`, in ascending year order.
///
/// An inverted or out-of-data range simply selects nothing.
pub fn filter_rows(rows: &[MergedRow], range: YearRange) -> &[MergedRow] {
    // Rows are sorted by year, so the selection is one contiguous slice.
    let start = rows.partition_point(|r| r.year < range.lo);
    let end = rows.partition_point(|r| r.year <= range.hi).max(start);
    &rows[start..end]
}

impl YearRange {
    /// Clamp both ends into `bounds`, swapping them if they are inverted.
    pub fn clamp_to(self, bounds: YearBounds) -> YearRange {
        let (lo, hi) = if self.lo <= self.hi {
            (self.lo, self.hi)
        } else {
            (self.hi, self.lo)
        };
        YearRange {
            lo: lo.clamp(bounds.min, bounds.max),
            hi: hi.clamp(bounds.min, bounds.max),
        }
    }
}

/// `(max(min_year, max_year - 10), max_year)`.
pub fn default_range(bounds: YearBounds) -> YearRange {
    YearRange {
        lo: bounds.min.max(bounds.max - DEFAULT_WINDOW_YEARS),
        hi: bounds.max,
    }
}

/// Initial dashboard state for `table`: last decade, raw values, YoY on,
/// every metric selected.
pub fn default_selection(table: &MergedTable) -> Selection {
    let range = table
        .bounds()
        .map(default_range)
        .unwrap_or(YearRange { lo: 0, hi: 0 });
    Selection {
        range,
        scale: ValueScale::Raw,
        show_yoy: true,
        metrics: Metric::ALL.to_vec(),
    }
}

/// Clamp a selection's range to the table's years.
///
/// An empty table leaves the selection untouched.
pub fn clamp_selection(selection: &Selection, table: &MergedTable) -> Selection {
    let mut out = selection.clone();
    if let Some(bounds) = table.bounds() {
        out.range = out.range.clamp_to(bounds);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::merge::merge;
    use crate::domain::{PerMetric, SeriesPoint, SeriesTable};

    fn table(years: std::ops::RangeInclusive<i32>) -> MergedTable {
        let points: Vec<SeriesPoint> = years
            .map(|year| SeriesPoint {
                year,
                value: 100.0 + (year % 100) as f64,
            })
            .collect();
        merge(&PerMetric::from_fn(|metric| SeriesTable {
            metric,
            points: points.clone(),
        }))
    }

    #[test]
    fn filter_is_inclusive_and_ordered() {
        let t = table(2000..=2010);
        let rows = filter_rows(t.rows(), YearRange::new(2003, 2005));
        let years: Vec<i32> = rows.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2003, 2004, 2005]);
    }

    #[test]
    fn filter_is_idempotent() {
        let t = table(2000..=2010);
        let range = YearRange::new(2002, 2007);
        let once = filter_rows(t.rows(), range);
        let twice = filter_rows(once, range);
        assert_eq!(once, twice);
    }

    #[test]
    fn filter_keeps_full_table_index_base() {
        let t = table(2000..=2010);
        let rows = filter_rows(t.rows(), YearRange::new(2005, 2010));
        assert_ne!(rows[0].index.housing.value(), Some(100.0));
        assert_eq!(rows[0].index, t.rows()[5].index);
    }

    #[test]
    fn empty_and_inverted_ranges_select_nothing() {
        let t = table(2000..=2010);
        assert!(filter_rows(t.rows(), YearRange::new(1990, 1995)).is_empty());
        assert!(filter_rows(t.rows(), YearRange::new(2008, 2004)).is_empty());
        assert!(filter_rows(&[], YearRange::new(2000, 2010)).is_empty());
    }

    #[test]
    fn clamp_pulls_range_into_bounds() {
        let bounds = YearBounds { min: 2000, max: 2010 };
        assert_eq!(YearRange::new(1990, 2050).clamp_to(bounds), YearRange::new(2000, 2010));
        assert_eq!(YearRange::new(2008, 2004).clamp_to(bounds), YearRange::new(2004, 2008));
        assert_eq!(YearRange::new(2020, 2030).clamp_to(bounds), YearRange::new(2010, 2010));
    }

    #[test]
    fn default_range_is_last_decade() {
        assert_eq!(
            default_range(YearBounds { min: 1975, max: 2023 }),
            YearRange::new(2013, 2023)
        );
        assert_eq!(
            default_range(YearBounds { min: 2018, max: 2023 }),
            YearRange::new(2018, 2023)
        );
    }

    #[test]
    fn default_selection_picks_every_metric() {
        let t = table(2000..=2020);
        let selection = default_selection(&t);
        assert_eq!(selection.range, YearRange::new(2010, 2020));
        assert_eq!(selection.metrics, Metric::ALL.to_vec());
        assert!(selection.show_yoy);
        assert_eq!(selection.scale, ValueScale::Raw);
    }
}
