//! Summary statistics of panel columns

use serde::{Deserialize, Serialize};

use crate::models::PanelRow;

/// Moments of one column over its finite values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation
    pub sd: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Summarise `columns` over `rows`. Missing and non-finite values are
/// counted as missing and left out of the moments.
#[must_use]
pub fn summarize(rows: &[PanelRow], columns: &[&str]) -> Vec<ColumnSummary> {
    columns
        .iter()
        .map(|&column| {
            let values: Vec<f64> = rows
                .iter()
                .filter_map(|r| r.value(column))
                .filter(|v| v.is_finite())
                .collect();
            let count = values.len();
            let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
            let sd = mean.filter(|_| count > 1).map(|m| {
                let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
                (ss / (count - 1) as f64).sqrt()
            });
            ColumnSummary {
                column: column.to_string(),
                count,
                missing: rows.len() - count,
                mean,
                sd,
                min: values.iter().copied().reduce(f64::min),
                max: values.iter().copied().reduce(f64::max),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moments_skip_missing_values() {
        let rows: Vec<PanelRow> = [Some(1.0), Some(3.0), None, Some(f64::INFINITY)]
            .into_iter()
            .map(|v| PanelRow {
                migration: 2.0,
                x_import_origin: v,
                ..PanelRow::default()
            })
            .collect();
        let summary = summarize(&rows, &["x_import_origin", "migration"]);

        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[0].missing, 2);
        assert_eq!(summary[0].mean, Some(2.0));
        assert!((summary[0].sd.unwrap() - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!((summary[0].min, summary[0].max), (Some(1.0), Some(3.0)));
        assert_eq!(summary[1].sd, Some(0.0));
    }
}
