//! Front-end configuration constants.

// Endpoints
pub const API_BASE: &str = "";
pub const WORLD_ATLAS_URL: &str = "https://cdn.jsdelivr.net/npm/world-atlas@2/countries-110m.json";

// Map
pub const MAP_CONTAINER_ID: &str = "map-container";
pub const NO_DATA_FILL: &str = "#ccc";
pub const LEGEND_WIDTH: f64 = 300.0;
pub const LEGEND_HEIGHT: f64 = 20.0;

// Hover history graph
pub const HISTORY_WIDTH: f64 = 250.0;
pub const HISTORY_HEIGHT: f64 = 150.0;

// Country line chart
pub const LINE_CHART_WIDTH: f64 = 900.0;
pub const LINE_CHART_HEIGHT: f64 = 500.0;
pub const CROSSHAIR_BOX_WIDTH: f64 = 220.0;
pub const SUNBURST_CONTAINER_ID: &str = "sunburst-chart";

// Drill-down bar chart
pub const BAR_CHART_WIDTH: f64 = 900.0;
pub const BAR_CHART_MIN_HEIGHT: f64 = 400.0;
pub const BAR_ROW_HEIGHT: f64 = 40.0;

/// d3 `schemeCategory10`, used for line and bar colours.
pub const CATEGORY_COLOURS: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

pub fn category_colour(index: usize) -> &'static str {
    CATEGORY_COLOURS[index % CATEGORY_COLOURS.len()]
}
