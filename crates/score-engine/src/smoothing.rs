//! Trailing moving-average smoothing for chart series.

use valuation_core::{MetricSeries, SeriesPoint};

/// Trailing mean over the last `window` observations, in date order.
///
/// The window counts rows, gaps included, and averages whatever values it
/// holds (a partial window at the start still yields a value). Gap rows stay
/// gaps so the chart keeps its line breaks. A window of 0 or 1 returns the
/// points unchanged apart from sorting.
pub fn rolling_mean(points: &[SeriesPoint], window: usize) -> Vec<SeriesPoint> {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.date);

    if window <= 1 {
        return sorted;
    }

    sorted
        .iter()
        .enumerate()
        .map(|(i, point)| {
            if point.value.is_none() {
                return *point;
            }
            let start = (i + 1).saturating_sub(window);
            let observed: Vec<f64> = sorted[start..=i].iter().filter_map(|p| p.value).collect();
            let mean = observed.iter().sum::<f64>() / observed.len() as f64;
            SeriesPoint::new(point.date, mean)
        })
        .collect()
}

pub fn smooth_series(series: &MetricSeries, window: usize) -> MetricSeries {
    MetricSeries::new(series.name.clone(), rolling_mean(&series.points, window))
}
