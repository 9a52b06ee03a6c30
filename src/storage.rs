use crate::models::ResultTable;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Prefix cells that a spreadsheet would evaluate as a formula.
fn sanitize(cell: &str) -> String {
    match cell.chars().next() {
        Some('=' | '+' | '-' | '@') => format!("'{cell}"),
        _ => cell.to_string(),
    }
}

/// Save the table as CSV: `ATC-code,Setting,Unit,<years…>`, missing values empty.
pub fn save_csv<P: AsRef<Path>>(table: &ResultTable, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    wtr.write_record(table.columns())?;
    for row in &table.rows {
        let mut record = vec![
            sanitize(&row.atc_code),
            sanitize(&table.setting),
            table.unit.to_string(),
        ];
        record.extend(
            row.values
                .iter()
                .map(|v| v.map(|x| x.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save the table as pretty JSON.
pub fn save_json<P: AsRef<Path>>(table: &ResultTable, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let s = serde_json::to_string_pretty(table)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResultRow, Unit};
    use tempfile::tempdir;

    #[test]
    fn write_csv_and_json() {
        let dir = tempdir().unwrap();
        let csvp = dir.path().join("x.csv");
        let jsonp = dir.path().join("x.json");
        let table = ResultTable {
            setting: "Primary sector".into(),
            unit: Unit::Sales,
            years: vec!["2023".into()],
            rows: vec![ResultRow {
                atc_code: "N06A".into(),
                values: vec![Some(1.5)],
            }],
            removed_years: vec![],
        };
        save_csv(&table, &csvp).unwrap();
        save_json(&table, &jsonp).unwrap();
        assert!(csvp.exists());
        assert!(jsonp.exists());
    }

    #[test]
    fn sanitize_only_touches_formula_starters() {
        assert_eq!(sanitize("=1+1"), "'=1+1");
        assert_eq!(sanitize("N06A"), "N06A");
    }
}
