use serde::Serialize;

use crate::point::normalize_percent;

/// Fixed colour bands of the gauge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Zone {
    /// [0, 50)
    Red,
    /// [50, 75)
    Amber,
    /// [75, 100]
    Green,
}

/// Zones in drawing order, left to right
pub const ZONES: [Zone; 3] = [Zone::Red, Zone::Amber, Zone::Green];

impl Zone {
    /// Percent bounds as (start, end)
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Zone::Red => (0.0, 50.0),
            Zone::Amber => (50.0, 75.0),
            Zone::Green => (75.0, 100.0),
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Zone::Red => "#dc3545",
            Zone::Amber => "#ffc107",
            Zone::Green => "#28a745",
        }
    }

    pub fn for_percent(percent: f64) -> Zone {
        let p = normalize_percent(percent);
        if p < 50.0 {
            Zone::Red
        } else if p < 75.0 {
            Zone::Amber
        } else {
            Zone::Green
        }
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            Zone::Red => "Expensive",
            Zone::Amber => "Fair",
            Zone::Green => "Cheap",
        }
    }
}
