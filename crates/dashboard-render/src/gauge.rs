//! Stateful gauge widget over the pure gauge geometry.
//!
//! A widget is built once per displayed gauge and updated through
//! [`GaugeWidget::set_value`]. Theme changes arrive through a [`ThemeBus`]
//! subscription; nothing is read from ambient global state.

use gauge_geometry::{fmt_coord, normalize_percent, GaugeGeometry, GaugeLayout};
use std::fmt::Write;
use tokio::sync::watch;

use crate::theme::{Theme, ThemeBus};

/// Everything needed to draw one frame of a gauge
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeScene {
    pub layout: GaugeLayout,
    pub geometry: GaugeGeometry,
    pub theme: Theme,
    pub title: Option<String>,
}

impl GaugeScene {
    pub fn to_svg(&self) -> String {
        let layout = &self.layout;
        let geometry = &self.geometry;
        let palette = self.theme.palette();
        let stroke = fmt_coord(layout.stroke_width);

        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" role="img">"#,
            w = fmt_coord(layout.width),
            h = fmt_coord(layout.height),
        );
        if let Some(title) = &self.title {
            let _ = writeln!(svg, "  <title>{}</title>", escape_xml(title));
        }
        let _ = writeln!(
            svg,
            r#"  <path d="{}" fill="none" stroke="{}" stroke-width="{}" stroke-linecap="round"/>"#,
            geometry.track,
            palette.track,
            stroke
        );
        for (zone, arc) in &geometry.zones {
            let _ = writeln!(
                svg,
                r#"  <path d="{}" fill="none" stroke="{}" stroke-width="{}" stroke-linecap="round"/>"#,
                arc,
                zone.color(),
                stroke
            );
        }
        let _ = writeln!(
            svg,
            r#"  <line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}" stroke-linecap="round"/>"#,
            fmt_coord(geometry.needle.from.x),
            fmt_coord(geometry.needle.from.y),
            fmt_coord(geometry.needle.to.x),
            fmt_coord(geometry.needle.to.y),
            palette.needle,
            fmt_coord(layout.needle_width)
        );
        let _ = writeln!(
            svg,
            r#"  <circle cx="{}" cy="{}" r="{}" fill="{}"/>"#,
            fmt_coord(layout.center.x),
            fmt_coord(layout.center.y),
            fmt_coord(layout.needle_width * 2.0),
            palette.needle
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{}" y="{}" text-anchor="middle" font-size="{}" font-weight="bold" fill="{}">{}</text>"#,
            fmt_coord(geometry.score_text_position.x),
            fmt_coord(geometry.score_text_position.y),
            fmt_coord(layout.score_font_size),
            geometry.zone.color(),
            geometry.score_text
        );
        if let Some(font_size) = layout.label_font_size {
            for label in &geometry.labels {
                let _ = writeln!(
                    svg,
                    r#"  <text x="{}" y="{}" text-anchor="middle" font-size="{}" fill="{}">{}</text>"#,
                    fmt_coord(label.position.x),
                    fmt_coord(label.position.y),
                    fmt_coord(font_size),
                    palette.text,
                    label.text
                );
            }
        }
        svg.push_str("</svg>\n");
        svg
    }
}

pub struct GaugeWidget {
    layout: GaugeLayout,
    geometry: GaugeGeometry,
    theme_rx: watch::Receiver<Theme>,
    title: Option<String>,
    dirty: bool,
}

impl GaugeWidget {
    pub fn new(layout: GaugeLayout, themes: &ThemeBus) -> Self {
        Self {
            geometry: GaugeGeometry::compute(&layout, 0.0),
            layout,
            theme_rx: themes.subscribe(),
            title: None,
            dirty: true,
        }
    }

    /// Detail-view gauge
    pub fn full(themes: &ThemeBus) -> Self {
        Self::new(GaugeLayout::full(), themes)
    }

    /// List-view gauge
    pub fn compact(themes: &ThemeBus) -> Self {
        Self::new(GaugeLayout::compact(), themes)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn value(&self) -> f64 {
        self.geometry.percent
    }

    pub fn geometry(&self) -> &GaugeGeometry {
        &self.geometry
    }

    /// Move the needle. Returns false when the clamped value is unchanged.
    pub fn set_value(&mut self, percent: f64) -> bool {
        let percent = normalize_percent(percent);
        if percent == self.geometry.percent {
            return false;
        }
        self.geometry = GaugeGeometry::compute(&self.layout, percent);
        self.dirty = true;
        true
    }

    /// True after a value change or a theme change not yet rendered
    pub fn needs_redraw(&self) -> bool {
        self.dirty || self.theme_rx.has_changed().unwrap_or(false)
    }

    /// Produce the current frame and mark it as drawn
    pub fn render(&mut self) -> GaugeScene {
        let theme = *self.theme_rx.borrow_and_update();
        self.dirty = false;
        GaugeScene {
            layout: self.layout,
            geometry: self.geometry.clone(),
            theme,
            title: self.title.clone(),
        }
    }

    pub fn to_svg(&mut self) -> String {
        self.render().to_svg()
    }
}

pub(crate) fn escape_xml(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
