//! Utility functions for visualization: colors, tick labels, sizing, cropping.

use num_format::{Locale, ToFormattedString};
use plotters::prelude::*;

use super::text::estimate_text_width_px;
use super::types::Palette;

/// ColorBrewer "Set2" (8 qualitative colors).
const SET2: [RGBColor; 8] = [
    RGBColor(102, 194, 165), // #66C2A5
    RGBColor(252, 141, 98),  // #FC8D62
    RGBColor(141, 160, 203), // #8DA0CB
    RGBColor(231, 138, 195), // #E78AC3
    RGBColor(166, 216, 84),  // #A6D854
    RGBColor(255, 217, 47),  // #FFD92F
    RGBColor(229, 196, 148), // #E5C494
    RGBColor(179, 179, 179), // #B3B3B3
];

/// Microsoft Office (2013+) chart series palette.
const OFFICE10: [RGBColor; 10] = [
    RGBColor(68, 114, 196),  // blue      (#4472C4)
    RGBColor(237, 125, 49),  // orange    (#ED7D31)
    RGBColor(165, 165, 165), // gray      (#A5A5A5)
    RGBColor(255, 192, 0),   // gold      (#FFC000)
    RGBColor(91, 155, 213),  // light blue(#5B9BD5)
    RGBColor(112, 173, 71),  // green     (#70AD47)
    RGBColor(38, 68, 120),   // dark blue (#264478)
    RGBColor(158, 72, 14),   // dark org. (#9E480E)
    RGBColor(99, 99, 99),    // dark gray (#636363)
    RGBColor(153, 115, 0),   // brownish  (#997300)
];

/// Color for series `idx` out of `n`.
///
/// `Set2` spreads the rows evenly over the palette (first row gets the first
/// color, last row the last), so neighbouring rows only share a color once
/// there are more rows than palette entries. `Office` cycles in order.
pub fn series_color(palette: Palette, idx: usize, n: usize) -> RGBColor {
    match palette {
        Palette::Set2 => {
            let t = if n > 1 {
                idx as f64 / (n - 1) as f64
            } else {
                0.0
            };
            let j = ((t * SET2.len() as f64) as usize).min(SET2.len() - 1);
            SET2[j]
        }
        Palette::Office => OFFICE10[idx % OFFICE10.len()],
    }
}

/// Points → pixels at the given resolution.
#[inline]
pub fn pt_to_px(pt: f64, dpi: f64) -> f64 {
    pt * dpi / 72.0
}

/// Y tick label: thousands separators for large values, a few decimals for small ones.
pub fn format_tick(v: f64) -> String {
    let a = v.abs();
    if a >= 1000.0 {
        (v.round() as i64).to_formatted_string(&Locale::en)
    } else {
        let prec = if a >= 100.0 {
            0
        } else if a >= 10.0 {
            1
        } else {
            2
        };
        format!("{:.*}", prec, v)
    }
}

/// Y range with 5% headroom on both sides; flat data gets ±1.
pub fn padded_range(min: f64, max: f64) -> (f64, f64) {
    if (max - min).abs() < f64::EPSILON {
        return (min - 1.0, max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

/// Width of the left label area: widest tick label plus room for the axis title.
pub fn compute_left_label_area_px(
    ymin: f64,
    ymax: f64,
    ticks: usize,
    tick_font_px: u32,
    desc_font_px: u32,
) -> u32 {
    let mut max_px = 0u32;
    for i in 0..=ticks {
        let t = if ticks == 0 {
            0.0
        } else {
            i as f64 / ticks as f64
        };
        let v = ymin + (ymax - ymin) * t;
        max_px = max_px.max(estimate_text_width_px(&format_tick(v), tick_font_px));
    }
    max_px + desc_font_px * 2 + tick_font_px
}

/// Bounding box `(x, y, w, h)` of everything that is not pure white in an RGB
/// buffer, grown by `pad` pixels and clamped to the image. `None` when blank.
pub fn content_bounds(buf: &[u8], width: u32, height: u32, pad: u32) -> Option<(u32, u32, u32, u32)> {
    let (mut x0, mut y0, mut x1, mut y1) = (u32::MAX, u32::MAX, 0u32, 0u32);
    for y in 0..height {
        let row = &buf[(y * width * 3) as usize..((y + 1) * width * 3) as usize];
        for (x, px) in row.chunks_exact(3).enumerate() {
            if *px != [255, 255, 255] {
                let x = x as u32;
                x0 = x0.min(x);
                x1 = x1.max(x);
                y0 = y0.min(y);
                y1 = y1.max(y);
            }
        }
    }
    if x0 == u32::MAX {
        return None;
    }
    let x0 = x0.saturating_sub(pad);
    let y0 = y0.saturating_sub(pad);
    let x1 = (x1 + pad).min(width - 1);
    let y1 = (y1 + pad).min(height - 1);
    Some((x0, y0, x1 - x0 + 1, y1 - y0 + 1))
}
