//! Date-keyed merge of independently fetched series.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use valuation_core::{ChartData, MergedPoint, MetricSeries};

/// Merge named series into one ascending sequence of per-date records.
///
/// Every date seen in any series appears exactly once. Each record carries a
/// slot for every input series name; a series with no observation on that
/// date leaves its slot `None`. Within a single series a repeated date
/// overwrites the earlier value.
pub fn merge_series(series: &[MetricSeries]) -> Vec<MergedPoint> {
    let mut names: Vec<&str> = Vec::new();
    for s in series {
        if !names.contains(&s.name.as_str()) {
            names.push(s.name.as_str());
        }
    }

    let mut by_date: BTreeMap<NaiveDate, MergedPoint> = BTreeMap::new();

    for s in series {
        let mut seen: HashSet<NaiveDate> = HashSet::with_capacity(s.points.len());
        for point in &s.points {
            if !seen.insert(point.date) {
                tracing::debug!(
                    "Duplicate date {} in series '{}', keeping the later value",
                    point.date,
                    s.name
                );
            }

            let record = by_date.entry(point.date).or_insert_with(|| {
                let mut p = MergedPoint::new(point.date);
                for name in &names {
                    p.values.insert((*name).to_string(), None);
                }
                p
            });
            record.values.insert(s.name.clone(), point.value);
        }
    }

    by_date.into_values().collect()
}

/// Merge series into chart data for one ticker
pub fn merge_chart(series: &[MetricSeries], data_point_count: usize) -> ChartData {
    let mut names: Vec<String> = Vec::new();
    for s in series {
        if !names.contains(&s.name) {
            names.push(s.name.clone());
        }
    }

    ChartData {
        series: names,
        points: merge_series(series),
        data_point_count,
    }
}
