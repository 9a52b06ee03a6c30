//! HTML table extraction and normalization into a [`ResultTable`].

use crate::error::{Error, Result};
use crate::models::{RawTable, ResultRow, ResultTable, Unit};
use scraper::{ElementRef, Html, Selector};

/// CSS selector of the statistics table on medstat.dk pages.
pub const TABLE_SELECTOR: &str = "table.statistical-data-table";

/// Header row, setting row and at least one data row.
pub const MIN_ROWS: usize = 3;

fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::InvalidArgument(format!("bad selector {css}: {e:?}")))
}

/// Extract the text rows of the statistics table from an HTML document.
///
/// Each `<tr>` becomes one row holding the trimmed text of its direct
/// children; children whose text is empty are dropped rather than kept as
/// blanks, so rows may differ in length.
pub fn extract_table(html: &str) -> Result<RawTable> {
    let doc = Html::parse_document(html);
    let table_sel = selector(TABLE_SELECTOR)?;
    let tr_sel = selector("tr")?;

    let table = doc
        .select(&table_sel)
        .next()
        .ok_or_else(|| Error::NotFound("No table found in the HTML content.".into()))?;

    let rows: RawTable = table.select(&tr_sel).map(row_cells).collect();
    log::debug!("extracted {} table rows", rows.len());

    if rows.len() < MIN_ROWS {
        return Err(too_few_rows(rows.len()));
    }
    Ok(rows)
}

fn row_cells(tr: ElementRef<'_>) -> Vec<String> {
    tr.children()
        .filter_map(|node| {
            if let Some(el) = ElementRef::wrap(node) {
                Some(el.text().map(str::trim).collect::<String>())
            } else {
                node.value().as_text().map(|t| t.trim().to_string())
            }
        })
        .filter(|text| !text.is_empty())
        .collect()
}

fn too_few_rows(n: usize) -> Error {
    Error::Validation(format!(
        "Table data must contain at least {MIN_ROWS} rows, got {n}"
    ))
}

/// Decide the table unit and the index of the first value cell in data rows.
///
/// DDD tables carry an extra label cell (mentioning "DDD") after the ATC
/// code. Only one row is probed: the second data row, or the first when the
/// table has a single data row.
pub fn detect_unit(raw: &RawTable) -> (Unit, usize) {
    let probe = raw.get(3).or_else(|| raw.get(2));
    let is_ddd = probe.is_some_and(|row| row.iter().any(|cell| cell.contains("DDD")));
    if is_ddd { (Unit::Ddd, 2) } else { (Unit::Sales, 1) }
}

/// Turn cell text into a number.
///
/// `"-"` and `""` are missing. Everything except ASCII digits and `.` is
/// stripped before parsing (`"12.5mg"` → `12.5`, `"1,234"` → `1234`), and
/// whatever still fails to parse is missing too.
pub fn clean_cell(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() || text == "-" {
        return None;
    }
    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse::<f64>().ok()
}

/// Build the normalized table from extracted rows.
///
/// Fails only when the raw table is structurally too small; cell-level
/// problems become missing values.
pub fn normalize_table(raw: &RawTable) -> Result<ResultTable> {
    if raw.len() < MIN_ROWS {
        return Err(too_few_rows(raw.len()));
    }

    let year_labels = &raw[0];
    let setting = raw[1]
        .first()
        .cloned()
        .ok_or_else(|| Error::Validation("setting row is empty".into()))?;
    let (unit, offset) = detect_unit(raw);

    let mut rows: Vec<ResultRow> = Vec::with_capacity(raw.len() - 2);
    for (idx, cells) in raw.iter().enumerate().skip(2) {
        let Some(atc_code) = cells.first() else {
            log::debug!("skipping empty table row {idx}");
            continue;
        };
        let data = cells.get(offset..).unwrap_or_default();
        if data.len() > year_labels.len() {
            log::warn!(
                "row {idx} ({atc_code}) has {} values for {} year columns; extra cells ignored",
                data.len(),
                year_labels.len()
            );
        }
        let mut values: Vec<Option<f64>> = data
            .iter()
            .take(year_labels.len())
            .map(|c| clean_cell(c))
            .collect();
        values.resize(year_labels.len(), None);
        rows.push(ResultRow {
            atc_code: atc_code.clone(),
            values,
        });
    }

    // Drop year columns without a single value.
    let keep: Vec<bool> = (0..year_labels.len())
        .map(|col| rows.iter().any(|r| r.values[col].is_some()))
        .collect();
    let removed_years: Vec<String> = year_labels
        .iter()
        .zip(&keep)
        .filter(|(_, k)| !**k)
        .map(|(y, _)| y.clone())
        .collect();
    if !removed_years.is_empty() {
        log::info!("Removed years with no data: {removed_years:?}");
    }

    let years: Vec<String> = year_labels
        .iter()
        .zip(&keep)
        .filter(|(_, k)| **k)
        .map(|(y, _)| y.clone())
        .collect();
    for row in &mut rows {
        row.values = row
            .values
            .iter()
            .zip(&keep)
            .filter(|(_, k)| **k)
            .map(|(v, _)| *v)
            .collect();
    }

    Ok(ResultTable {
        setting,
        unit,
        years,
        rows,
        removed_years,
    })
}
