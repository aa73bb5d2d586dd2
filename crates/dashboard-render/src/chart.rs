//! P/E and price line chart over merged series.

use chrono::NaiveDate;
use gauge_geometry::{fmt_coord, Point};
use std::fmt::Write;
use tokio::sync::watch;
use valuation_core::{series_names, ChartData};

use crate::gauge::escape_xml;
use crate::theme::{Theme, ThemeBus};

const MAX_X_TICKS: usize = 8;
const Y_TICKS: usize = 5;
const LINE_WIDTH: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSide {
    /// P/E ratio axis
    Left,
    /// Price axis
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStyle {
    pub key: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub dash: Option<&'static str>,
    pub axis: AxisSide,
}

/// Drawing order and styling of the known series
pub const SERIES_STYLES: [SeriesStyle; 3] = [
    SeriesStyle {
        key: series_names::PE_TTM,
        label: "TTM P/E",
        color: "#1f77b4",
        dash: None,
        axis: AxisSide::Left,
    },
    SeriesStyle {
        key: series_names::PE_FORWARD,
        label: "Forward P/E",
        color: "#2ca02c",
        dash: Some("5 5"),
        axis: AxisSide::Left,
    },
    SeriesStyle {
        key: series_names::PRICE,
        label: "Price",
        color: "#ff7f0e",
        dash: None,
        axis: AxisSide::Right,
    },
];

pub fn series_style(key: &str) -> Option<&'static SeriesStyle> {
    SERIES_STYLES.iter().find(|s| s.key == key)
}

/// Date tick label, e.g. `Jan 2023`
pub fn format_tick(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartOptions {
    pub width: f64,
    pub height: f64,
    /// Hides axes, grid, legend and tooltip
    pub compact: bool,
}

impl ChartOptions {
    pub fn full() -> Self {
        Self {
            width: 800.0,
            height: 400.0,
            compact: false,
        }
    }

    pub fn compact() -> Self {
        Self {
            width: 300.0,
            height: 100.0,
            compact: true,
        }
    }

    fn plot_area(&self) -> PlotArea {
        if self.compact {
            PlotArea {
                left: 5.0,
                top: 5.0,
                right: self.width - 5.0,
                bottom: self.height - 5.0,
            }
        } else {
            // Room for the title, both value axes and slanted date labels
            PlotArea {
                left: 60.0,
                top: 30.0,
                right: self.width - 60.0,
                bottom: self.height - 80.0,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl PlotArea {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    fn from_values(values: impl Iterator<Item = f64>) -> Option<Self> {
        let (min, max) = values.fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;
        if min == max {
            return Some(Self {
                min: min - 1.0,
                max: max + 1.0,
            });
        }
        Some(Self { min, max })
    }

    fn y(&self, value: f64, area: &PlotArea) -> f64 {
        area.bottom - (value - self.min) / (self.max - self.min) * area.height()
    }

    fn ticks(&self) -> Vec<f64> {
        (0..Y_TICKS)
            .map(|i| self.min + (self.max - self.min) * i as f64 / (Y_TICKS - 1) as f64)
            .collect()
    }
}

/// One drawn series; a new segment starts after every gap
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLine {
    pub style: SeriesStyle,
    pub segments: Vec<Vec<Point>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XTick {
    pub index: usize,
    pub x: f64,
    pub label: String,
}

/// Laid-out chart, independent of theme
#[derive(Debug, Clone, PartialEq)]
pub struct ChartModel {
    pub title: Option<String>,
    pub options: ChartOptions,
    pub area: PlotArea,
    pub lines: Vec<ChartLine>,
    pub x_ticks: Vec<XTick>,
    pub pe_axis: Option<AxisRange>,
    pub price_axis: Option<AxisRange>,
    pub show_axes: bool,
    pub show_grid: bool,
    pub show_legend: bool,
    pub show_tooltip: bool,
}

impl ChartModel {
    pub fn build(ticker: &str, chart: &ChartData, options: ChartOptions) -> Self {
        let area = options.plot_area();
        let n = chart.points.len();

        let x_for = |index: usize| -> f64 {
            if n <= 1 {
                area.left + area.width() / 2.0
            } else {
                area.left + area.width() * index as f64 / (n - 1) as f64
            }
        };

        // Only subscribed series with at least one value are drawn
        let drawn: Vec<&SeriesStyle> = SERIES_STYLES
            .iter()
            .filter(|style| chart.series.iter().any(|s| s == style.key))
            .filter(|style| chart.points.iter().any(|p| p.has(style.key)))
            .collect();

        let axis_values = |side: AxisSide| {
            let keys: Vec<&str> = drawn.iter().filter(|s| s.axis == side).map(|s| s.key).collect();
            AxisRange::from_values(
                chart
                    .points
                    .iter()
                    .flat_map(move |p| keys.iter().filter_map(|k| p.get(k)).collect::<Vec<f64>>()),
            )
        };
        let pe_axis = axis_values(AxisSide::Left);
        let price_axis = axis_values(AxisSide::Right);

        let lines = drawn
            .iter()
            .filter_map(|style| {
                let range = match style.axis {
                    AxisSide::Left => pe_axis?,
                    AxisSide::Right => price_axis?,
                };
                let mut segments: Vec<Vec<Point>> = Vec::new();
                let mut current: Vec<Point> = Vec::new();
                for (i, point) in chart.points.iter().enumerate() {
                    match point.get(style.key) {
                        Some(v) => current.push(Point::new(x_for(i), range.y(v, &area))),
                        None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                        None => {}
                    }
                }
                if !current.is_empty() {
                    segments.push(current);
                }
                Some(ChartLine {
                    style: **style,
                    segments,
                })
            })
            .collect();

        let x_ticks = if n == 0 {
            Vec::new()
        } else {
            let step = n.div_ceil(MAX_X_TICKS).max(1);
            (0..n)
                .step_by(step)
                .map(|i| XTick {
                    index: i,
                    x: x_for(i),
                    label: format_tick(chart.points[i].date),
                })
                .collect()
        };

        let full = !options.compact;
        Self {
            title: full.then(|| format!("{} P/E Ratios", ticker)),
            options,
            area,
            lines,
            x_ticks,
            pe_axis,
            price_axis,
            show_axes: full,
            show_grid: full,
            show_legend: full,
            show_tooltip: full,
        }
    }

    /// Hover text for the record at `index`: the date, then one line per
    /// drawn series. `None` in compact mode.
    pub fn tooltip(&self, chart: &ChartData, index: usize) -> Option<Vec<String>> {
        if !self.show_tooltip {
            return None;
        }
        let point = chart.points.get(index)?;
        let mut lines = vec![format_tick(point.date)];
        for line in &self.lines {
            let value = point.get(line.style.key);
            match (line.style.key, value) {
                (series_names::PRICE, Some(v)) => lines.push(format!("Price: ${:.2}", v)),
                (series_names::PRICE, None) => lines.push("Price: $N/A".to_string()),
                (_, Some(v)) => lines.push(format!("{}: {:.2}", line.style.label, v)),
                (_, None) => {}
            }
        }
        Some(lines)
    }

    pub fn to_svg(&self, theme: Theme) -> String {
        let palette = theme.palette();
        let area = &self.area;
        let mut svg = String::new();

        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" role="img">"#,
            w = fmt_coord(self.options.width),
            h = fmt_coord(self.options.height),
        );
        let _ = writeln!(
            svg,
            r#"  <rect width="100%" height="100%" fill="{}"/>"#,
            palette.background
        );

        if let Some(title) = &self.title {
            let _ = writeln!(
                svg,
                r#"  <text x="{}" y="20" text-anchor="middle" font-size="16" font-weight="bold" fill="{}">{}</text>"#,
                fmt_coord(self.options.width / 2.0),
                palette.text,
                escape_xml(title)
            );
        }

        if self.show_grid {
            let rows = self.pe_axis.or(self.price_axis);
            if let Some(range) = rows {
                for t in range.ticks() {
                    let y = fmt_coord(range.y(t, area));
                    let _ = writeln!(
                        svg,
                        r#"  <line x1="{}" y1="{y}" x2="{}" y2="{y}" stroke="{}" stroke-dasharray="3 3"/>"#,
                        fmt_coord(area.left),
                        fmt_coord(area.right),
                        palette.grid
                    );
                }
            }
            for tick in &self.x_ticks {
                let x = fmt_coord(tick.x);
                let _ = writeln!(
                    svg,
                    r#"  <line x1="{x}" y1="{}" x2="{x}" y2="{}" stroke="{}" stroke-dasharray="3 3"/>"#,
                    fmt_coord(area.top),
                    fmt_coord(area.bottom),
                    palette.grid
                );
            }
        }

        if self.show_axes {
            self.write_axes(&mut svg, theme);
        }

        for line in &self.lines {
            let dash = line
                .style
                .dash
                .map(|d| format!(r#" stroke-dasharray="{}""#, d))
                .unwrap_or_default();
            for segment in &line.segments {
                let points: Vec<String> = segment
                    .iter()
                    .map(|p| format!("{},{}", fmt_coord(p.x), fmt_coord(p.y)))
                    .collect();
                let _ = writeln!(
                    svg,
                    r#"  <polyline points="{}" fill="none" stroke="{}" stroke-width="{}"{}/>"#,
                    points.join(" "),
                    line.style.color,
                    fmt_coord(LINE_WIDTH),
                    dash
                );
            }
        }

        if self.show_legend {
            let mut x = area.left;
            let y = self.options.height - 10.0;
            for line in &self.lines {
                let _ = writeln!(
                    svg,
                    r#"  <text x="{}" y="{}" font-size="12" fill="{}">{}</text>"#,
                    fmt_coord(x),
                    fmt_coord(y),
                    line.style.color,
                    line.style.label
                );
                x += 110.0;
            }
        }

        svg.push_str("</svg>\n");
        svg
    }

    fn write_axes(&self, svg: &mut String, theme: Theme) {
        let palette = theme.palette();
        let area = &self.area;

        let _ = writeln!(
            svg,
            r#"  <line x1="{}" y1="{b}" x2="{}" y2="{b}" stroke="{}"/>"#,
            fmt_coord(area.left),
            fmt_coord(area.right),
            palette.text,
            b = fmt_coord(area.bottom)
        );
        for tick in &self.x_ticks {
            let _ = writeln!(
                svg,
                r#"  <text x="{x}" y="{y}" font-size="11" text-anchor="end" transform="rotate(-45 {x} {y})" fill="{}">{}</text>"#,
                palette.text,
                tick.label,
                x = fmt_coord(tick.x),
                y = fmt_coord(area.bottom + 15.0)
            );
        }

        let sides = [
            (self.pe_axis, area.left, "end", -8.0, "P/E Ratio"),
            (self.price_axis, area.right, "start", 8.0, "Price ($)"),
        ];
        for (range, x, anchor, dx, title) in sides {
            let Some(range) = range else { continue };
            let _ = writeln!(
                svg,
                r#"  <line x1="{x}" y1="{}" x2="{x}" y2="{}" stroke="{}"/>"#,
                fmt_coord(area.top),
                fmt_coord(area.bottom),
                palette.text,
                x = fmt_coord(x)
            );
            for t in range.ticks() {
                let _ = writeln!(
                    svg,
                    r#"  <text x="{}" y="{}" font-size="11" text-anchor="{}" fill="{}">{}</text>"#,
                    fmt_coord(x + dx),
                    fmt_coord(range.y(t, area) + 4.0),
                    anchor,
                    palette.text,
                    fmt_coord(t)
                );
            }
            let _ = writeln!(
                svg,
                r#"  <text x="{}" y="{}" font-size="12" text-anchor="middle" fill="{}">{}</text>"#,
                fmt_coord(x + dx * 5.0),
                fmt_coord(area.top - 10.0),
                palette.text,
                title
            );
        }
    }
}

/// Scene handed to a drawing surface
#[derive(Debug, Clone, PartialEq)]
pub struct ChartScene {
    pub model: ChartModel,
    pub theme: Theme,
}

impl ChartScene {
    pub fn to_svg(&self) -> String {
        self.model.to_svg(self.theme)
    }
}

pub struct ChartWidget {
    options: ChartOptions,
    theme_rx: watch::Receiver<Theme>,
    data: Option<(String, ChartData)>,
    model: Option<ChartModel>,
    dirty: bool,
}

impl ChartWidget {
    pub fn new(options: ChartOptions, themes: &ThemeBus) -> Self {
        Self {
            options,
            theme_rx: themes.subscribe(),
            data: None,
            model: None,
            dirty: true,
        }
    }

    /// Replace the data wholesale and lay the chart out again
    pub fn set_data(&mut self, ticker: &str, chart: ChartData) {
        self.model = Some(ChartModel::build(ticker, &chart, self.options));
        self.data = Some((ticker.to_string(), chart));
        self.dirty = true;
    }

    pub fn model(&self) -> Option<&ChartModel> {
        self.model.as_ref()
    }

    pub fn tooltip(&self, index: usize) -> Option<Vec<String>> {
        let (_, chart) = self.data.as_ref()?;
        self.model.as_ref()?.tooltip(chart, index)
    }

    pub fn needs_redraw(&self) -> bool {
        self.dirty || self.theme_rx.has_changed().unwrap_or(false)
    }

    /// `None` until data has been set
    pub fn render(&mut self) -> Option<ChartScene> {
        let theme = *self.theme_rx.borrow_and_update();
        self.dirty = false;
        self.model.as_ref().map(|model| ChartScene {
            model: model.clone(),
            theme,
        })
    }

    pub fn to_svg(&mut self) -> Option<String> {
        self.render().map(|scene| scene.to_svg())
    }
}
