//! Gauge Geometry
//!
//! Pure geometry for a 180° score gauge: percent → angle → screen point,
//! arc path descriptors, fixed colour zones, tick labels and layout presets.
//! Nothing here holds state; identical inputs always yield identical output.

pub mod arc;
pub mod layout;
pub mod point;
pub mod zones;

pub use arc::{arc_path, canvas_span, ArcPath, CanvasArc};
pub use layout::{
    GaugeGeometry, GaugeLayout, LabelTick, Needle, ScoreTextPlacement, TICK_PERCENTS,
};
pub use point::{angle_to_point, fmt_coord, normalize_percent, percent_to_angle, Point};
pub use zones::{Zone, ZONES};
