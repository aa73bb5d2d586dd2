use serde::Serialize;
use std::fmt;

/// A point in screen coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", fmt_coord(self.x), fmt_coord(self.y))
    }
}

/// Format a coordinate with at most two decimals, without trailing zeros
/// and without a negative zero.
pub fn fmt_coord(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    let s = format!("{:.2}", rounded);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

/// Bring an arbitrary score into the gauge domain. NaN reads as 0.
pub fn normalize_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

/// 0% sits at 180° (left end), 100% at 0° (right end).
pub fn percent_to_angle(percent: f64) -> f64 {
    180.0 - (normalize_percent(percent) / 100.0) * 180.0
}

/// Polar to screen coordinates; y is inverted so larger angles rise upward.
pub fn angle_to_point(angle_deg: f64, center: Point, radius: f64) -> Point {
    let rad = angle_deg.to_radians();
    Point::new(
        center.x + radius * rad.cos(),
        center.y - radius * rad.sin(),
    )
}
