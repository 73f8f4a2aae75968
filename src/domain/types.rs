//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - built once by the loaders and the merge step
//! - sliced per interaction by the filter step
//! - handed to any front-end (TUI, text summary, CSV export)

use chrono::NaiveDate;
use clap::ValueEnum;

/// One of the three tracked county metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum)]
pub enum Metric {
    /// Regional house-price index (FRED all-transactions HPI).
    Housing,
    /// Median household income (USD).
    Income,
    /// Resident population.
    Population,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Housing, Metric::Income, Metric::Population];

    /// Series label used in chart legends and the settings panel.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Housing => "Housing Price Index",
            Metric::Income => "Median Income (USD)",
            Metric::Population => "Population (people)",
        }
    }

    /// Title of the summary metric card.
    pub fn card_title(self) -> &'static str {
        match self {
            Metric::Housing => "HPI (index points)",
            Metric::Income => "Median Income (USD)",
            Metric::Population => "Population",
        }
    }

    /// Raw value column name (as written by the data-acquisition scripts).
    pub fn column(self) -> &'static str {
        match self {
            Metric::Housing => "housing_price_index",
            Metric::Income => "median_income",
            Metric::Population => "population",
        }
    }

    pub fn index_column(self) -> &'static str {
        match self {
            Metric::Housing => "HPI_idx",
            Metric::Income => "Income_idx",
            Metric::Population => "Pop_idx",
        }
    }

    pub fn yoy_column(self) -> &'static str {
        match self {
            Metric::Housing => "HPI_yoy_pct",
            Metric::Income => "Income_yoy_pct",
            Metric::Population => "Pop_yoy_pct",
        }
    }
}

/// Which value column the trend chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValueScale {
    /// Raw values in each metric's own unit.
    Raw,
    /// Each metric rescaled so its first merged year equals 100.
    Indexed,
}

impl ValueScale {
    pub fn display_name(self) -> &'static str {
        match self {
            ValueScale::Raw => "Raw values",
            ValueScale::Indexed => "Indexed (first year = 100)",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            ValueScale::Raw => ValueScale::Indexed,
            ValueScale::Indexed => ValueScale::Raw,
        }
    }
}

/// A derived (index or YoY) cell.
///
/// Undefined cells are explicit markers, never NaN or infinity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Derived {
    Value(f64),
    /// YoY on the first merged row: there is no prior year.
    FirstYear,
    /// The denominator (index base or prior-year value) was zero.
    DivisionEdgeCase,
}

impl Derived {
    pub fn value(self) -> Option<f64> {
        match self {
            Derived::Value(v) => Some(v),
            Derived::FirstYear | Derived::DivisionEdgeCase => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Derived::Value(_))
    }
}

/// A value per metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerMetric<T> {
    pub housing: T,
    pub income: T,
    pub population: T,
}

impl<T> PerMetric<T> {
    pub fn from_fn(mut f: impl FnMut(Metric) -> T) -> Self {
        Self {
            housing: f(Metric::Housing),
            income: f(Metric::Income),
            population: f(Metric::Population),
        }
    }

    pub fn get(&self, metric: Metric) -> &T {
        match metric {
            Metric::Housing => &self.housing,
            Metric::Income => &self.income,
            Metric::Population => &self.population,
        }
    }
}

/// One normalized observation from a single source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub year: i32,
    pub value: f64,
}

/// A normalized source table: one metric, ascending unique years.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesTable {
    pub metric: Metric,
    pub points: Vec<SeriesPoint>,
}

impl SeriesTable {
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.points.iter().map(|p| p.year)
    }
}

/// One row of the merged table: a year present in all three sources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergedRow {
    pub year: i32,
    pub raw: PerMetric<f64>,
    pub index: PerMetric<Derived>,
    pub yoy: PerMetric<Derived>,
}

impl MergedRow {
    /// The trend-chart value for `metric` under `scale`.
    pub fn scaled(&self, metric: Metric, scale: ValueScale) -> Derived {
        match scale {
            ValueScale::Raw => Derived::Value(*self.raw.get(metric)),
            ValueScale::Indexed => *self.index.get(metric),
        }
    }
}

/// Inclusive bounds of the years present in a merged table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearBounds {
    pub min: i32,
    pub max: i32,
}

/// The canonical merged table: ascending by year, no duplicate years.
///
/// Only the merge step constructs it, so the ordering and the index base
/// (first row of the full table) always hold.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergedTable {
    rows: Vec<MergedRow>,
}

impl MergedTable {
    pub(crate) fn from_sorted_rows(rows: Vec<MergedRow>) -> Self {
        debug_assert!(rows.windows(2).all(|w| w[0].year < w[1].year));
        Self { rows }
    }

    pub fn rows(&self) -> &[MergedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.rows.iter().map(|r| r.year)
    }

    pub fn bounds(&self) -> Option<YearBounds> {
        let first = self.rows.first()?;
        let last = self.rows.last()?;
        Some(YearBounds {
            min: first.year,
            max: last.year,
        })
    }
}

/// Closed year interval `[lo, hi]` chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub lo: i32,
    pub hi: i32,
}

impl YearRange {
    pub fn new(lo: i32, hi: i32) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.lo <= year && year <= self.hi
    }
}

/// One long-form chart observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewPoint {
    /// January 1st of the observation year.
    pub time: NaiveDate,
    pub value: Derived,
    pub series: Metric,
}

/// Dashboard control state.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub range: YearRange,
    pub scale: ValueScale,
    pub show_yoy: bool,
    /// Metrics to chart, in the order the user picked them.
    pub metrics: Vec<Metric>,
}

impl Selection {
    /// Selects `metric` if absent, deselects it otherwise.
    pub fn toggle_metric(&mut self, metric: Metric) {
        if let Some(pos) = self.metrics.iter().position(|m| *m == metric) {
            self.metrics.remove(pos);
        } else {
            self.metrics.push(metric);
        }
    }

    pub fn is_selected(&self, metric: Metric) -> bool {
        self.metrics.contains(&metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_metric_preserves_pick_order() {
        let mut selection = Selection {
            range: YearRange::new(2010, 2020),
            scale: ValueScale::Raw,
            show_yoy: true,
            metrics: vec![Metric::Population],
        };
        selection.toggle_metric(Metric::Housing);
        assert_eq!(selection.metrics, vec![Metric::Population, Metric::Housing]);

        selection.toggle_metric(Metric::Population);
        assert_eq!(selection.metrics, vec![Metric::Housing]);
        assert!(!selection.is_selected(Metric::Population));
    }

    #[test]
    fn scaled_reads_raw_or_index_column() {
        let row = MergedRow {
            year: 2021,
            raw: PerMetric::from_fn(|_| 110.0),
            index: PerMetric::from_fn(|_| Derived::Value(110.0)),
            yoy: PerMetric::from_fn(|_| Derived::FirstYear),
        };
        assert_eq!(row.scaled(Metric::Income, ValueScale::Raw), Derived::Value(110.0));
        assert_eq!(row.scaled(Metric::Income, ValueScale::Indexed), Derived::Value(110.0));
        assert_eq!(row.yoy.get(Metric::Income).value(), None);
    }
}
