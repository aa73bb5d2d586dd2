use serde::Serialize;

use crate::arc::{arc_path, ArcPath};
use crate::point::{angle_to_point, normalize_percent, percent_to_angle, Point};
use crate::zones::{Zone, ZONES};

/// Percent positions that carry a tick label
pub const TICK_PERCENTS: [f64; 5] = [0.0, 25.0, 50.0, 75.0, 100.0];

/// Endpoint labels sit below the baseline, interior labels above the arc.
const ENDPOINT_LABEL_DY: f64 = 15.0;
const INTERIOR_LABEL_DY: f64 = -8.0;

/// Where the numeric score is printed
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ScoreTextPlacement {
    /// Beyond the arc along the needle direction, `offset` past the radius
    Radial { offset: f64 },
    /// Under the center point
    Centered { dy: f64 },
}

/// Size and spacing of one gauge variant
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GaugeLayout {
    pub width: f64,
    pub height: f64,
    pub center: Point,
    pub radius: f64,
    pub stroke_width: f64,
    pub needle_width: f64,
    pub score_text: ScoreTextPlacement,
    pub score_font_size: f64,
    /// `None` hides the tick labels
    pub label_font_size: Option<f64>,
}

impl GaugeLayout {
    /// Detail-view gauge
    pub fn full() -> Self {
        Self {
            width: 240.0,
            height: 140.0,
            center: Point::new(120.0, 120.0),
            radius: 100.0,
            stroke_width: 20.0,
            needle_width: 3.0,
            score_text: ScoreTextPlacement::Radial { offset: 35.0 },
            score_font_size: 16.0,
            label_font_size: Some(11.0),
        }
    }

    /// List-view gauge; thicker stroke relative to its size
    pub fn compact() -> Self {
        Self {
            width: 100.0,
            height: 60.0,
            center: Point::new(50.0, 50.0),
            radius: 40.0,
            stroke_width: 12.0,
            needle_width: 2.0,
            score_text: ScoreTextPlacement::Centered { dy: 8.0 },
            score_font_size: 10.0,
            label_font_size: None,
        }
    }

    pub fn point_at(&self, percent: f64) -> Point {
        angle_to_point(percent_to_angle(percent), self.center, self.radius)
    }

    pub fn arc(&self, start_percent: f64, end_percent: f64) -> ArcPath {
        arc_path(start_percent, end_percent, self.radius, self.center)
    }

    pub fn score_text_position(&self, percent: f64) -> Point {
        match self.score_text {
            ScoreTextPlacement::Radial { offset } => {
                angle_to_point(percent_to_angle(percent), self.center, self.radius + offset)
            }
            ScoreTextPlacement::Centered { dy } => self.center.offset(0.0, dy),
        }
    }

    pub fn tick_labels(&self) -> Vec<LabelTick> {
        TICK_PERCENTS
            .iter()
            .map(|&percent| {
                let on_arc = self.point_at(percent);
                let dy = if percent == 0.0 || percent == 100.0 {
                    ENDPOINT_LABEL_DY
                } else {
                    INTERIOR_LABEL_DY
                };
                LabelTick {
                    percent,
                    text: format!("{}%", percent as u32),
                    position: on_arc.offset(0.0, dy),
                }
            })
            .collect()
    }
}

impl Default for GaugeLayout {
    fn default() -> Self {
        Self::full()
    }
}

/// A tick label and its anchor point (text is centred on it)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelTick {
    pub percent: f64,
    pub text: String,
    pub position: Point,
}

/// Line from the gauge center to the score point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Needle {
    pub from: Point,
    pub to: Point,
}

/// Complete geometry of one gauge at one score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeGeometry {
    pub percent: f64,
    pub angle: f64,
    pub zone: Zone,
    pub track: ArcPath,
    pub zones: Vec<(Zone, ArcPath)>,
    pub needle: Needle,
    pub score_text: String,
    pub score_text_position: Point,
    pub labels: Vec<LabelTick>,
}

impl GaugeGeometry {
    pub fn compute(layout: &GaugeLayout, percent: f64) -> Self {
        let percent = normalize_percent(percent);
        let zones = ZONES
            .iter()
            .map(|zone| {
                let (start, end) = zone.bounds();
                (*zone, layout.arc(start, end))
            })
            .collect();

        let labels = if layout.label_font_size.is_some() {
            layout.tick_labels()
        } else {
            Vec::new()
        };

        Self {
            percent,
            angle: percent_to_angle(percent),
            zone: Zone::for_percent(percent),
            track: layout.arc(0.0, 100.0),
            zones,
            needle: Needle {
                from: layout.center,
                to: layout.point_at(percent),
            },
            score_text: format!("{:.0}%", percent),
            score_text_position: layout.score_text_position(percent),
            labels,
        }
    }
}
