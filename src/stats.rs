use crate::models::ResultTable;
use serde::{Deserialize, Serialize};

/// Summary statistics over one row's year values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub atc_code: String,
    pub count: usize,
    pub missing: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

/// One summary per table row, in row order.
pub fn row_summaries(table: &ResultTable) -> Vec<Summary> {
    table
        .rows
        .iter()
        .map(|row| {
            let mut vals: Vec<f64> = row.values.iter().flatten().copied().collect();
            vals.sort_by(|a, b| a.total_cmp(b));
            let count = vals.len();
            let mean = if count > 0 {
                Some(vals.iter().sum::<f64>() / count as f64)
            } else {
                None
            };
            let median = if count == 0 {
                None
            } else if count % 2 == 1 {
                Some(vals[count / 2])
            } else {
                Some((vals[count / 2 - 1] + vals[count / 2]) / 2.0)
            };
            Summary {
                atc_code: row.atc_code.clone(),
                count,
                missing: row.values.len() - count,
                min: vals.first().copied(),
                max: vals.last().copied(),
                mean,
                median,
            }
        })
        .collect()
}
