//! Visualization: one line per ATC code across the year columns of a [`ResultTable`].
//!
//! - [`render`] builds a resolution-independent [`Figure`] in memory
//! - [`Figure::save`] writes **SVG** or a tightly cropped **PNG** at a given DPI
//! - [`Figure::show`] opens a PNG preview in the system image viewer
//!
//! Missing values break the line instead of being drawn as zero.
//!
//! ```no_run
//! # use medstat_rs::viz::{self, RenderConfig};
//! # fn demo(table: &medstat_rs::ResultTable) -> anyhow::Result<()> {
//! let fig = viz::render(table, &RenderConfig::default())?;
//! fig.save("n06a.png", viz::DEFAULT_DPI)?;
//! fig.show()?;
//! # Ok(()) }
//! ```

pub mod legend;
pub mod text;
pub mod types;
pub mod util;

pub use types::{DEFAULT_DPI, DEFAULT_LEGEND_MODE, LegendMode, Palette, RenderConfig, SCREEN_DPI};

use crate::models::{ResultTable, Unit};
use anyhow::{Context, Result, anyhow, bail};

use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::LineSeries;
use plotters::style::{FontFamily, FontStyle, FontTransform};

use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use std::path::{Path, PathBuf};
use std::sync::Once;

use legend::{LegendMetrics, draw_legend_panel, legend_panel_height_px, legend_panel_width_px};
use text::estimate_text_width_px;
use util::{compute_left_label_area_px, content_bounds, format_tick, padded_range, pt_to_px, series_color};

/// Font families backed by the bundled DejaVu Sans face.
/// `ab_glyph` doesn't discover OS fonts, so nothing else can be drawn.
pub const BUNDLED_FAMILIES: [&str; 2] = ["sans-serif", "DejaVu Sans"];

static INIT_FONTS: Once = Once::new();

fn ensure_fonts_registered() {
    INIT_FONTS.call_once(|| {
        for family in BUNDLED_FAMILIES {
            let _ = plotters::style::register_font(
                family,
                FontStyle::Normal,
                include_bytes!("../../assets/DejaVuSans.ttf"),
            );
        }
    });
}

/// `family` if it is bundled, otherwise the default bundled family.
fn resolve_font_family(family: &str) -> &str {
    if BUNDLED_FAMILIES.iter().any(|f| f.eq_ignore_ascii_case(family)) {
        family
    } else {
        log::warn!(
            "font family {family:?} is not available, using {:?}",
            BUNDLED_FAMILIES[0]
        );
        BUNDLED_FAMILIES[0]
    }
}

/// Category label for an x tick, if `x` sits on a category index.
fn category_at(categories: &[String], x: f64) -> Option<&str> {
    let i = x.round();
    if (x - i).abs() > 1e-6 || i < 0.0 {
        return None;
    }
    categories.get(i as usize).map(String::as_str)
}

/// One plotted line: a value (or gap) per year column.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub color: RGBColor,
    pub values: Vec<Option<f64>>,
}

impl Series {
    /// Contiguous runs of present values as `(column index, value)` pairs.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut out = Vec::new();
        let mut cur: Vec<(f64, f64)> = Vec::new();
        for (i, v) in self.values.iter().enumerate() {
            match v {
                Some(y) => cur.push((i as f64, *y)),
                None if !cur.is_empty() => out.push(std::mem::take(&mut cur)),
                None => {}
            }
        }
        if !cur.is_empty() {
            out.push(cur);
        }
        out
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|y| (i as f64, y)))
    }
}

/// A chart ready to be rasterized; produced by [`render`].
#[derive(Debug, Clone)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// X-axis categories (the year columns), in column order.
    pub categories: Vec<String>,
    pub series: Vec<Series>,
    pub config: RenderConfig,
    y_range: (f64, f64),
}

/// Build the chart for `table`: one series per row, legend labels = ATC codes.
///
/// Fails when the table has no year columns or no numeric values at all.
pub fn render(table: &ResultTable, config: &RenderConfig) -> Result<Figure> {
    if table.years.is_empty() {
        bail!("no year columns to plot");
    }
    let values: Vec<f64> = table
        .rows
        .iter()
        .flat_map(|r| r.values.iter().flatten().copied())
        .collect();
    if values.is_empty() {
        return Err(anyhow!("no numeric values to plot"));
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let unit = match table.unit {
        Unit::Ddd => "DDD",
        Unit::Sales => "Sales",
    };
    let n = table.rows.len();
    let series = table
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| Series {
            label: row.atc_code.clone(),
            color: series_color(config.palette, idx, n),
            values: row.values.clone(),
        })
        .collect();

    let mut config = config.clone();
    config.font_family = resolve_font_family(&config.font_family).to_string();

    Ok(Figure {
        title: format!("{}: {} by ATC Code", table.setting, unit),
        x_label: "Year".into(),
        y_label: unit.into(),
        categories: table.years.clone(),
        series,
        config,
        y_range: padded_range(min, max),
    })
}

impl Figure {
    /// Canvas size in pixels at `dpi`, including room for an outside legend.
    ///
    /// An outside legend taller than the plot extends the canvas downwards.
    pub fn canvas_size(&self, dpi: u32) -> (u32, u32) {
        let dpi = dpi as f64;
        let (w_in, h_in) = self.config.fig_size_in;
        let plot_w = (w_in * dpi).round() as i32;
        let plot_h = (h_in * dpi).round().max(1.0) as i32;
        let (legend_w, legend_bottom) = match self.config.legend {
            LegendMode::Right => {
                let m = self.legend_metrics(dpi);
                let bottom =
                    self.legend_top_px(dpi) + legend_panel_height_px(self.series.len(), m) + m.pad;
                (self.legend_width_px(dpi, plot_w), bottom)
            }
            LegendMode::Inside => (0, 0),
        };
        (
            (plot_w + legend_w).max(1) as u32,
            plot_h.max(legend_bottom) as u32,
        )
    }

    /// Top edge of the outside legend, level with the plotting area.
    fn legend_top_px(&self, dpi: f64) -> i32 {
        let px = |pt: f64| pt_to_px(pt, dpi).round().max(1.0) as i32;
        px(self.config.font_size_pt) + px(self.config.title_size_pt) * 2
    }

    /// Whether year labels are too crowded to sit horizontally.
    fn rotate_x_labels(&self, tick_px: u32, plot_w: i32) -> bool {
        let needed: u32 = self
            .categories
            .iter()
            .map(|c| estimate_text_width_px(c, tick_px) + tick_px)
            .sum();
        needed as f64 > plot_w as f64 * 0.8
    }

    fn legend_metrics(&self, dpi: f64) -> LegendMetrics {
        LegendMetrics::for_font(pt_to_px(self.config.font_size_pt, dpi).round().max(1.0) as u32)
    }

    fn legend_width_px(&self, dpi: f64, plot_w: i32) -> i32 {
        let labels: Vec<String> = self.series.iter().map(|s| s.label.clone()).collect();
        legend_panel_width_px(&labels, self.legend_metrics(dpi), plot_w * 2 / 5)
    }

    fn font(&self, pt: f64, dpi: f64) -> FontDesc<'_> {
        FontDesc::new(
            FontFamily::from(self.config.font_family.as_str()),
            pt_to_px(pt, dpi),
            FontStyle::Normal,
        )
    }

    /// Write the chart to `path`.
    ///
    /// `.svg` produces an SVG of the full canvas; any other extension produces
    /// a PNG with a white background, cropped to the drawn content.
    pub fn save<P: AsRef<Path>>(&self, path: P, dpi: u32) -> Result<()> {
        if dpi == 0 {
            bail!("dpi must be positive");
        }
        ensure_fonts_registered();
        let path = path.as_ref();
        let (w, h) = self.canvas_size(dpi);

        if path.extension().and_then(|s| s.to_str()) == Some("svg") {
            let root = SVGBackend::new(path, (w, h)).into_drawing_area();
            self.draw(root, dpi as f64)?;
            return Ok(());
        }

        let mut buf = vec![255u8; (w as usize) * (h as usize) * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
            self.draw(root, dpi as f64)?;
        }
        let pad = (dpi / 10).max(1); // 0.1 inch
        let (x, y, cw, ch) = content_bounds(&buf, w, h, pad).unwrap_or((0, 0, w, h));
        let img = image::RgbImage::from_raw(w, h, buf)
            .ok_or_else(|| anyhow!("bitmap buffer does not match {w}x{h}"))?;
        image::imageops::crop_imm(&img, x, y, cw, ch)
            .to_image()
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    /// Save a PNG preview to a temporary file and open it in the system viewer.
    ///
    /// Returns the preview path; the file is left in place for the viewer.
    pub fn show(&self) -> Result<PathBuf> {
        let tmp = tempfile::Builder::new()
            .prefix("medstat-")
            .suffix(".png")
            .tempfile()
            .context("create preview file")?;
        let path = tmp.into_temp_path().keep().context("keep preview file")?;
        self.save(&path, SCREEN_DPI)?;
        open::that(&path).with_context(|| format!("open {}", path.display()))?;
        Ok(path)
    }

    fn draw<DB>(&self, root: DrawingArea<DB, Shift>, dpi: f64) -> Result<()>
    where
        DB: DrawingBackend,
    {
        let cfg = &self.config;
        let px = |pt: f64| pt_to_px(pt, dpi).round().max(1.0) as u32;
        let margin = px(cfg.font_size_pt);
        let tick_px = px(cfg.tick_label_size_pt);
        let desc_px = px(cfg.axis_label_size_pt);
        let stroke_px = px(cfg.line_width_pt);
        let marker_px = (pt_to_px(cfg.marker_size_pt, dpi) / 2.0).round().max(1.0) as u32;

        root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

        let (root_w, root_h) = root.dim_in_pixel();
        let plot_w = (cfg.fig_size_in.0 * dpi).round() as i32;
        let plot_h = (cfg.fig_size_in.1 * dpi).round().max(1.0) as i32;
        let (plot_area, legend_area) = match cfg.legend {
            LegendMode::Right if (root_w as i32) > plot_w => {
                let (plot, legend) = root.split_horizontally(plot_w);
                (plot, Some(legend))
            }
            _ => (root, None),
        };
        // A tall legend grows the canvas; the plot keeps its configured height.
        let plot_area = if (root_h as i32) > plot_h {
            plot_area.split_vertically(plot_h).0
        } else {
            plot_area
        };

        let k = self.categories.len();
        let (ymin, ymax) = self.y_range;
        let y_label_count = 8usize;
        let left_px = compute_left_label_area_px(ymin, ymax, y_label_count, tick_px, desc_px);

        let rotate = self.rotate_x_labels(tick_px, plot_w);
        let x_tick_h = if rotate {
            self.categories
                .iter()
                .map(|c| estimate_text_width_px(c, tick_px))
                .max()
                .unwrap_or(0)
                + tick_px
        } else {
            tick_px * 2
        };

        let mut chart = ChartBuilder::on(&plot_area)
            .margin(margin)
            .caption(self.title.as_str(), self.font(cfg.title_size_pt, dpi))
            .set_label_area_size(LabelAreaPosition::Left, left_px)
            .set_label_area_size(LabelAreaPosition::Bottom, x_tick_h + desc_px * 2)
            .build_cartesian_2d(-0.5..k as f64 - 0.5, ymin..ymax)
            .map_err(|e| anyhow!("{:?}", e))?;

        let categories = &self.categories;
        let x_label_fmt =
            |x: &f64| category_at(categories, *x).map(str::to_string).unwrap_or_default();
        let y_label_fmt = |v: &f64| format_tick(*v);
        let x_label_font = if rotate {
            self.font(cfg.tick_label_size_pt, dpi)
                .transform(FontTransform::Rotate90)
        } else {
            self.font(cfg.tick_label_size_pt, dpi)
        };

        let mut mesh = chart.configure_mesh();
        // Over `-0.5..k-0.5`, `k` labels fall exactly on the category indices.
        mesh.x_desc(self.x_label.as_str())
            .y_desc(self.y_label.as_str())
            .x_labels(k)
            .y_labels(y_label_count)
            .x_label_formatter(&x_label_fmt)
            .y_label_formatter(&y_label_fmt)
            .label_style(self.font(cfg.tick_label_size_pt, dpi))
            .x_label_style(x_label_font)
            .axis_desc_style(self.font(cfg.axis_label_size_pt, dpi))
            .light_line_style(TRANSPARENT)
            .bold_line_style(BLACK.mix(0.15).stroke_width(1));
        if !cfg.grid {
            mesh.disable_mesh();
        }
        mesh.draw().map_err(|e| anyhow!("{:?}", e))?;

        let inside = legend_area.is_none();
        for s in &self.series {
            let line = ShapeStyle {
                color: s.color.to_rgba(),
                filled: false,
                stroke_width: stroke_px,
            };
            for seg in s.segments() {
                chart
                    .draw_series(LineSeries::new(seg, line))
                    .map_err(|e| anyhow!("{:?}", e))?;
            }
            let color = s.color;
            let elem = chart
                .draw_series(s.points().map(|p| Circle::new(p, marker_px, color.filled())))
                .map_err(|e| anyhow!("{:?}", e))?;
            if inside {
                let sample_w = (tick_px * 2) as i32;
                elem.label(s.label.clone()).legend(move |(x, y)| {
                    EmptyElement::at((x, y))
                        + PathElement::new(vec![(0, 0), (sample_w, 0)], color.stroke_width(stroke_px))
                        + Circle::new((sample_w / 2, 0), marker_px, color.filled())
                });
            }
        }

        if inside {
            chart
                .configure_series_labels()
                .border_style(BLACK.mix(0.3))
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.85))
                .label_font(self.font(cfg.font_size_pt, dpi))
                .draw()
                .map_err(|e| anyhow!("{:?}", e))?;
        } else if let Some(ref legend_area) = legend_area {
            let items: Vec<(String, RGBColor)> =
                self.series.iter().map(|s| (s.label.clone(), s.color)).collect();
            draw_legend_panel(
                legend_area,
                &items,
                self.font(cfg.font_size_pt, dpi),
                self.legend_top_px(dpi),
                stroke_px,
                marker_px,
            )?;
        }

        plot_area.present().map_err(|e| anyhow!("{:?}", e))?;
        if let Some(ref legend_area) = legend_area {
            legend_area.present().map_err(|e| anyhow!("{:?}", e))?;
        }
        Ok(())
    }
}

/// Render `table` and write it to `out_path` at `dpi` in one call.
pub fn plot_table<P: AsRef<Path>>(
    table: &ResultTable,
    out_path: P,
    dpi: u32,
    config: &RenderConfig,
) -> Result<()> {
    render(table, config)?.save(out_path, dpi)
}
