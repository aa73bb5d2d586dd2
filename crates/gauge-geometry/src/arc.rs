use serde::Serialize;
use std::f64::consts::PI;
use std::fmt;

use crate::point::{angle_to_point, fmt_coord, normalize_percent, percent_to_angle, Point};

/// An arc of the gauge, always drawn from the lower percent to the higher one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArcPath {
    pub start_percent: f64,
    pub end_percent: f64,
    pub start: Point,
    pub end: Point,
    pub radius: f64,
    /// SVG large-arc flag: set only when the arc sweeps more than 180°
    pub large_arc: bool,
    /// SVG sweep flag: left-to-right over the top is clockwise on screen
    pub sweep: bool,
}

impl ArcPath {
    /// Angular extent of the arc in degrees
    pub fn sweep_degrees(&self) -> f64 {
        (self.end_percent - self.start_percent) / 100.0 * 180.0
    }

    /// SVG `d` attribute
    pub fn to_svg(&self) -> String {
        self.to_string()
    }

    /// Equivalent parameters for a canvas `arc()` call
    pub fn to_canvas(&self, center: Point) -> CanvasArc {
        CanvasArc {
            center,
            radius: self.radius,
            // Canvas angles run clockwise from +x, so the math angle flips sign.
            start_angle: -percent_to_angle(self.start_percent).to_radians(),
            end_angle: -percent_to_angle(self.end_percent).to_radians(),
            anticlockwise: false,
        }
    }
}

impl fmt::Display for ArcPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "M {} A {} {} 0 {} {} {}",
            self.start,
            fmt_coord(self.radius),
            fmt_coord(self.radius),
            u8::from(self.large_arc),
            u8::from(self.sweep),
            self.end
        )
    }
}

/// Canvas-style arc descriptor (angles in radians)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CanvasArc {
    pub center: Point,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub anticlockwise: bool,
}

/// Build the arc covering `[start_percent, end_percent]`.
///
/// The bounds are ordered first, so `arc_path(a, b, ..)` and
/// `arc_path(b, a, ..)` describe the same arc.
///
/// `large_arc` follows the swept angle (over 180°), not the percent span:
/// a span over 50 points is still a minor arc on a half-circle gauge.
pub fn arc_path(start_percent: f64, end_percent: f64, radius: f64, center: Point) -> ArcPath {
    let a = normalize_percent(start_percent);
    let b = normalize_percent(end_percent);
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

    let start = angle_to_point(percent_to_angle(lo), center, radius);
    let end = angle_to_point(percent_to_angle(hi), center, radius);
    let degrees = (hi - lo) / 100.0 * 180.0;

    ArcPath {
        start_percent: lo,
        end_percent: hi,
        start,
        end,
        radius,
        large_arc: degrees > 180.0,
        sweep: true,
    }
}

/// Radians covered by a canvas arc, for callers animating along it
pub fn canvas_span(arc: &CanvasArc) -> f64 {
    let span = arc.end_angle - arc.start_angle;
    if span < 0.0 {
        span + 2.0 * PI
    } else {
        span
    }
}
