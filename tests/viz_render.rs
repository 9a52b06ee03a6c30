use medstat_rs::models::{ResultRow, ResultTable, Unit};
use medstat_rs::viz::{self, LegendMode, Palette, RenderConfig};
use tempfile::tempdir;

fn table(n: usize, k: usize) -> ResultTable {
    ResultTable {
        setting: "Primary sector".into(),
        unit: Unit::Ddd,
        years: (0..k).map(|i| (2015 + i).to_string()).collect(),
        rows: (0..n)
            .map(|r| ResultRow {
                atc_code: format!("N06A{r}"),
                values: (0..k)
                    .map(|c| {
                        if (r + c) % 4 == 3 {
                            None
                        } else {
                            Some(1000.0 * (r + 1) as f64 + c as f64 * 37.5)
                        }
                    })
                    .collect(),
            })
            .collect(),
        removed_years: vec![],
    }
}

#[test]
fn render_builds_one_series_per_row() {
    let t = table(3, 5);
    let fig = viz::render(&t, &RenderConfig::default()).unwrap();
    assert_eq!(fig.title, "Primary sector: DDD by ATC Code");
    assert_eq!(fig.x_label, "Year");
    assert_eq!(fig.categories, t.years);
    assert_eq!(fig.series.len(), 3);
    let labels: Vec<&str> = fig.series.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["N06A0", "N06A1", "N06A2"]);
    for s in &fig.series {
        assert_eq!(s.values.len(), 5);
    }
    assert_ne!(fig.series[0].color, fig.series[1].color);
}

#[test]
fn gaps_split_lines_into_segments() {
    let t = table(1, 6);
    let fig = viz::render(&t, &RenderConfig::default()).unwrap();
    // Row 0 is missing at column 3.
    let segs = fig.series[0].segments();
    assert_eq!(segs.len(), 2);
    assert_eq!(segs[0].len(), 3);
    assert_eq!(segs[1].len(), 2);
    assert_eq!(fig.series[0].points().count(), 5);
}

#[test]
fn saves_png_and_svg() {
    let dir = tempdir().unwrap();
    let fig = viz::render(&table(4, 3), &RenderConfig::default()).unwrap();

    let png = dir.path().join("chart.png");
    fig.save(&png, 50).unwrap();
    let img = image::open(&png).unwrap();
    let (w, h) = fig.canvas_size(50);
    assert!(img.width() > 0 && img.width() <= w);
    assert!(img.height() > 0 && img.height() <= h);

    let svg = dir.path().join("chart.svg");
    fig.save(&svg, 50).unwrap();
    let text = std::fs::read_to_string(&svg).unwrap();
    assert!(text.contains("<svg"));
}

#[test]
fn inside_legend_and_office_palette_render() {
    let dir = tempdir().unwrap();
    let cfg = RenderConfig {
        legend: LegendMode::Inside,
        palette: Palette::Office,
        grid: false,
        ..RenderConfig::default()
    };
    let out = dir.path().join("inside.png");
    viz::plot_table(&table(2, 4), &out, 40, &cfg).unwrap();
    assert!(out.exists());
}

#[test]
fn canvas_scales_with_dpi() {
    let inside = RenderConfig {
        legend: LegendMode::Inside,
        ..RenderConfig::default()
    };
    let fig = viz::render(&table(1, 2), &inside).unwrap();
    assert_eq!(fig.canvas_size(100), (1200, 600));
    assert_eq!(fig.canvas_size(300), (3600, 1800));

    // An outside legend only adds width.
    let fig = viz::render(&table(1, 2), &RenderConfig::default()).unwrap();
    let (w, h) = fig.canvas_size(100);
    assert!(w > 1200);
    assert_eq!(h, 600);
}

#[test]
fn empty_tables_are_rejected() {
    let mut t = table(2, 3);
    t.years.clear();
    for r in &mut t.rows {
        r.values.clear();
    }
    assert!(viz::render(&t, &RenderConfig::default()).is_err());

    let mut t = table(2, 3);
    for r in &mut t.rows {
        r.values.iter_mut().for_each(|v| *v = None);
    }
    assert!(viz::render(&t, &RenderConfig::default()).is_err());
}

#[test]
fn zero_dpi_is_rejected() {
    let dir = tempdir().unwrap();
    let fig = viz::render(&table(1, 2), &RenderConfig::default()).unwrap();
    assert!(fig.save(dir.path().join("x.png"), 0).is_err());
}

fn small_values(n: usize, k: usize) -> ResultTable {
    let mut t = table(n, k);
    for (r, row) in t.rows.iter_mut().enumerate() {
        for (c, v) in row.values.iter_mut().enumerate() {
            *v = Some(1.0 + (r + c) as f64 * 0.25);
        }
    }
    t
}

#[test]
fn svg_labels_each_year_exactly_once() {
    let dir = tempdir().unwrap();
    let t = small_values(2, 7);
    let svg = dir.path().join("years.svg");
    viz::plot_table(&t, &svg, 72, &RenderConfig::default()).unwrap();
    let text = std::fs::read_to_string(&svg).unwrap();
    for year in &t.years {
        let needle = format!(">\n{year}\n</text>");
        assert_eq!(text.matches(&needle).count(), 1, "year {year}");
    }
}

#[test]
fn many_year_columns_still_render() {
    let dir = tempdir().unwrap();
    let t = small_values(3, 28);
    let svg = dir.path().join("wide.svg");
    viz::plot_table(&t, &svg, 72, &RenderConfig::default()).unwrap();
    let text = std::fs::read_to_string(&svg).unwrap();
    assert!(text.contains("rotate(90"));
    for year in &t.years {
        assert!(text.contains(&format!(">\n{year}\n</text>")), "year {year}");
    }
}

#[test]
fn tall_legend_grows_the_png() {
    use medstat_rs::viz::legend::{LegendMetrics, legend_panel_height_px};
    use medstat_rs::viz::util::pt_to_px;

    let dir = tempdir().unwrap();
    let cfg = RenderConfig::default();
    let fig = viz::render(&table(80, 4), &cfg).unwrap();
    let m = LegendMetrics::for_font(pt_to_px(cfg.font_size_pt, 100.0).round() as u32);
    let legend_h = legend_panel_height_px(80, m) as u32;

    let (_, h) = fig.canvas_size(100);
    assert!(h > 600 && h >= legend_h, "canvas height {h}, legend {legend_h}");

    let png = dir.path().join("tall.png");
    fig.save(&png, 100).unwrap();
    let img = image::open(&png).unwrap();
    assert!(img.height() >= legend_h, "png {} < legend {legend_h}", img.height());
}

#[test]
fn unavailable_font_family_falls_back_to_bundled_face() {
    let dir = tempdir().unwrap();
    let cfg = RenderConfig {
        font_family: "Arial".into(),
        ..RenderConfig::default()
    };
    let fig = viz::render(&table(2, 3), &cfg).unwrap();
    assert_eq!(fig.config.font_family, "sans-serif");
    let png = dir.path().join("arial.png");
    fig.save(&png, 50).unwrap();
    assert!(png.exists());
}
