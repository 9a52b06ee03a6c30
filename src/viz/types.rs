//! Public types and constants for the visualization module.

/// Legend placement options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendMode {
    /// Overlay legend inside the plotting area (may overlap data).
    Inside,
    /// Separate panel to the right of the plot area.
    Right,
}

/// Qualitative color palettes for the row series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    /// ColorBrewer "Set2", sampled evenly across the number of rows.
    Set2,
    /// Microsoft Office chart palette, assigned in row order and cycled.
    Office,
}

/// Default legend placement: outside the plot, so lines are never covered.
pub const DEFAULT_LEGEND_MODE: LegendMode = LegendMode::Right;

/// Resolution used when saving without an explicit DPI.
pub const DEFAULT_DPI: u32 = 300;

/// Resolution of the preview opened by `Figure::show`.
pub const SCREEN_DPI: u32 = 100;

/// Chart styling. Sizes are in points (1/72 inch) and scale with the output DPI.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Plot area size (width, height) in inches; an outside legend widens the canvas.
    pub fig_size_in: (f64, f64),
    /// Font family name; must be known to plotters (`sans-serif` is bundled).
    pub font_family: String,
    pub font_size_pt: f64,
    pub title_size_pt: f64,
    pub axis_label_size_pt: f64,
    pub tick_label_size_pt: f64,
    pub line_width_pt: f64,
    /// Marker diameter.
    pub marker_size_pt: f64,
    pub grid: bool,
    pub palette: Palette,
    pub legend: LegendMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fig_size_in: (12.0, 6.0),
            font_family: "sans-serif".into(),
            font_size_pt: 11.0,
            title_size_pt: 14.0,
            axis_label_size_pt: 12.0,
            tick_label_size_pt: 10.0,
            line_width_pt: 2.0,
            marker_size_pt: 6.0,
            grid: true,
            palette: Palette::Set2,
            legend: DEFAULT_LEGEND_MODE,
        }
    }
}
