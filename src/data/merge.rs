//! Merge & derive: join the three sources on year and add index/YoY columns.
//!
//! The join is an inner join (a year must be present in every source), so
//! the result does not depend on which source is visited first.

use std::collections::{BTreeMap, HashMap};

use crate::domain::{Derived, MergedRow, MergedTable, Metric, PerMetric, SeriesTable};

/// Build the canonical merged table from the three normalized sources.
pub fn merge(sources: &PerMetric<SeriesTable>) -> MergedTable {
    let lookups: PerMetric<HashMap<i32, f64>> =
        PerMetric::from_fn(|metric| sources.get(metric).points.iter().map(|p| (p.year, p.value)).collect());

    // Walk the housing years in order; keep those the other two sources share.
    let mut joined: BTreeMap<i32, PerMetric<f64>> = BTreeMap::new();
    for &year in lookups.housing.keys() {
        let values = Metric::ALL.map(|metric| lookups.get(metric).get(&year).copied());
        if let [Some(housing), Some(income), Some(population)] = values {
            joined.insert(
                year,
                PerMetric {
                    housing,
                    income,
                    population,
                },
            );
        }
    }

    MergedTable::from_sorted_rows(derive(joined.into_iter().collect()))
}

/// Add index and YoY columns to year-ascending raw rows.
///
/// The index base is the first row passed in.
fn derive(raw_rows: Vec<(i32, PerMetric<f64>)>) -> Vec<MergedRow> {
    let Some(&(_, base)) = raw_rows.first() else {
        return Vec::new();
    };

    let mut rows: Vec<MergedRow> = Vec::with_capacity(raw_rows.len());
    let mut prev: Option<PerMetric<f64>> = None;
    for (year, raw) in raw_rows {
        let index = PerMetric::from_fn(|m| index_value(*raw.get(m), *base.get(m)));
        let yoy = PerMetric::from_fn(|m| match &prev {
            Some(p) => pct_change(*raw.get(m), *p.get(m)),
            None => Derived::FirstYear,
        });
        rows.push(MergedRow { year, raw, index, yoy });
        prev = Some(raw);
    }
    rows
}

/// `value / base * 100`.
pub fn index_value(value: f64, base: f64) -> Derived {
    if base == 0.0 {
        return Derived::DivisionEdgeCase;
    }
    finite(value / base * 100.0)
}

/// `(current - previous) / previous * 100`.
pub fn pct_change(current: f64, previous: f64) -> Derived {
    if previous == 0.0 {
        return Derived::DivisionEdgeCase;
    }
    finite((current - previous) / previous * 100.0)
}

fn finite(v: f64) -> Derived {
    if v.is_finite() {
        Derived::Value(v)
    } else {
        Derived::DivisionEdgeCase
    }
}
