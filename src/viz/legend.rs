//! Legend panel drawn beside the plot area.

use anyhow::Result;
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::text::{estimate_text_width_px, truncate_to_width};

/// Pixel geometry of one legend entry, derived from the label font size.
#[derive(Debug, Clone, Copy)]
pub struct LegendMetrics {
    pub font_px: u32,
    pub line_h: i32,
    pub pad: i32,
    /// Length of the line sample drawn before each label.
    pub sample_w: i32,
    pub sample_gap: i32,
}

impl LegendMetrics {
    pub fn for_font(font_px: u32) -> Self {
        let f = font_px as i32;
        Self {
            font_px,
            line_h: f + f / 2,
            pad: (f / 2).max(4),
            sample_w: f * 2,
            sample_gap: (f / 2).max(4),
        }
    }
}

/// Width the right-hand panel needs for `labels`, capped at `max_px`.
pub fn legend_panel_width_px(labels: &[String], m: LegendMetrics, max_px: i32) -> i32 {
    let text_w = labels
        .iter()
        .map(|l| estimate_text_width_px(l, m.font_px) as i32)
        .max()
        .unwrap_or(0);
    // outer gap + frame padding on both sides + sample + gap + text
    let needed = m.pad * 2 + m.pad * 2 + m.sample_w + m.sample_gap + text_w;
    needed.min(max_px).max(m.sample_w * 2)
}

/// Height of the framed panel holding `entries` rows.
pub fn legend_panel_height_px(entries: usize, m: LegendMetrics) -> i32 {
    m.pad * 2 + m.line_h * entries as i32
}

/// Draw a framed single-column legend at the top of `area`.
///
/// Each entry shows a short line with a marker in the series color followed
/// by its label; labels too wide for the panel are truncated.
pub fn draw_legend_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    items: &[(String, RGBColor)],
    font: FontDesc<'_>,
    top_px: i32,
    stroke_px: u32,
    marker_px: u32,
) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    let m = LegendMetrics::for_font(font.get_size().round().max(1.0) as u32);
    let (w_u32, _) = area.dim_in_pixel();
    let w = w_u32 as i32;

    let frame_x0 = m.pad;
    let frame_x1 = w - 1;
    let frame_y0 = top_px;
    let frame_y1 = top_px + legend_panel_height_px(items.len(), m);

    area.draw(&Rectangle::new(
        [(frame_x0, frame_y0), (frame_x1, frame_y1)],
        WHITE.filled(),
    ))
    .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    area.draw(&Rectangle::new(
        [(frame_x0, frame_y0), (frame_x1, frame_y1)],
        BLACK.mix(0.3).stroke_width(1),
    ))
    .map_err(|e| anyhow::anyhow!("{:?}", e))?;

    let sample_x0 = frame_x0 + m.pad;
    let sample_x1 = sample_x0 + m.sample_w;
    let text_x = sample_x1 + m.sample_gap;
    let max_text_w = (frame_x1 - m.pad - text_x).max(1) as u32;
    let style = TextStyle::from(font).pos(Pos::new(HPos::Left, VPos::Center));

    for (i, (label, color)) in items.iter().enumerate() {
        let cy = frame_y0 + m.pad + m.line_h * i as i32 + m.line_h / 2;
        area.draw(&PathElement::new(
            vec![(sample_x0, cy), (sample_x1, cy)],
            color.stroke_width(stroke_px),
        ))
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        area.draw(&Circle::new(
            ((sample_x0 + sample_x1) / 2, cy),
            marker_px,
            color.filled(),
        ))
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let text = truncate_to_width(label, m.font_px, max_text_w);
        area.draw(&Text::new(text, (text_x, cy), style.clone()))
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    }
    Ok(())
}
