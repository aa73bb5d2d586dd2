//! Summary statistics over metric windows.

/// Compute the mean of a data slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Smallest and largest value, or `None` for an empty slice.
pub fn min_max(data: &[f64]) -> Option<(f64, f64)> {
    let mut iter = data.iter().copied();
    let first = iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), x| (lo.min(x), hi.max(x))))
}

/// Clamp into [0, 1].
pub fn clamp_unit(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}
