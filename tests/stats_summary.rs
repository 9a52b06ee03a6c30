use medstat_rs::models::{ResultRow, ResultTable, Unit};
use medstat_rs::stats::row_summaries;

fn table(rows: Vec<(&str, Vec<Option<f64>>)>) -> ResultTable {
    let k = rows.first().map(|(_, v)| v.len()).unwrap_or(0);
    ResultTable {
        setting: "Total".into(),
        unit: Unit::Sales,
        years: (0..k).map(|i| (2020 + i).to_string()).collect(),
        rows: rows
            .into_iter()
            .map(|(code, values)| ResultRow {
                atc_code: code.into(),
                values,
            })
            .collect(),
        removed_years: vec![],
    }
}

#[test]
fn summary_skips_missing_values() {
    let t = table(vec![("N06A", vec![Some(4.0), None, Some(1.0), Some(2.0)])]);
    let s = &row_summaries(&t)[0];
    assert_eq!(s.atc_code, "N06A");
    assert_eq!(s.count, 3);
    assert_eq!(s.missing, 1);
    assert_eq!(s.min, Some(1.0));
    assert_eq!(s.max, Some(4.0));
    assert_eq!(s.median, Some(2.0));
    let mean = s.mean.unwrap();
    assert!((mean - 7.0 / 3.0).abs() < 1e-12);
}

#[test]
fn even_count_median_is_midpoint() {
    let t = table(vec![("A", vec![Some(1.0), Some(3.0)])]);
    assert_eq!(row_summaries(&t)[0].median, Some(2.0));
}

#[test]
fn all_missing_row_has_no_stats() {
    let t = table(vec![("A", vec![Some(1.0), None]), ("B", vec![None, None])]);
    let out = row_summaries(&t);
    assert_eq!(out.len(), 2);
    assert_eq!(out[1].count, 0);
    assert_eq!(out[1].missing, 2);
    assert!(out[1].mean.is_none() && out[1].median.is_none() && out[1].min.is_none());
}
