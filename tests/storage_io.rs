use medstat_rs::models::{ResultRow, ResultTable, Unit};
use medstat_rs::storage::{save_csv, save_json};
use std::fs;
use tempfile::tempdir;

fn sample() -> ResultTable {
    ResultTable {
        setting: "Primary sector".into(),
        unit: Unit::Ddd,
        years: vec!["2022".into(), "2023".into()],
        rows: vec![
            ResultRow {
                atc_code: "N06A".into(),
                values: vec![Some(1.5), None],
            },
            ResultRow {
                atc_code: "=HYPERLINK(\"x\")".into(),
                values: vec![Some(2.0), Some(3.25)],
            },
        ],
        removed_years: vec!["2021".into()],
    }
}

#[test]
fn csv_has_header_plus_one_line_per_row() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("out.csv");
    save_csv(&sample(), &p).unwrap();

    let text = fs::read_to_string(&p).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "ATC-code,Setting,Unit,2022,2023");
    assert_eq!(lines[1], "N06A,Primary sector,DDD,1.5,");
}

#[test]
fn csv_neutralizes_formula_cells() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("out.csv");
    save_csv(&sample(), &p).unwrap();

    let mut rdr = csv::Reader::from_path(&p).unwrap();
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(&rows[1][0], "'=HYPERLINK(\"x\")");
    assert_eq!(&rows[1][4], "3.25");
}

#[test]
fn json_round_trips_the_table() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("out.json");
    let table = sample();
    save_json(&table, &p).unwrap();

    let text = fs::read_to_string(&p).unwrap();
    assert!(text.contains("\"unit\": \"DDD\""));
    let back: ResultTable = serde_json::from_str(&text).unwrap();
    assert_eq!(back, table);
}

#[test]
fn save_into_missing_directory_fails() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("nope").join("out.csv");
    assert!(save_csv(&sample(), &p).is_err());
}
