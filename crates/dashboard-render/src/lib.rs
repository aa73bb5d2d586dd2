//! Dashboard Render
//!
//! Owned widgets that turn gauge geometry and merged chart series into
//! drawable scenes and SVG. Theme changes are pushed through a [`ThemeBus`].

pub mod chart;
pub mod gauge;
pub mod theme;

pub use chart::{
    format_tick, series_style, AxisSide, ChartModel, ChartOptions, ChartScene, ChartWidget,
    SeriesStyle, SERIES_STYLES,
};
pub use gauge::{GaugeScene, GaugeWidget};
pub use theme::{Palette, Theme, ThemeBus};
