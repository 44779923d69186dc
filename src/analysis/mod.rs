//! Regression layer over the assembled panel
//!
//! The panel keeps join misses as `None`. Estimation starts from
//! `finite_rows`, which is the only place rows are dropped for missing or
//! non-finite values. A specification that fails is logged and reported as
//! `None` without stopping the others.

pub mod descriptive;
pub mod iv;
pub mod linalg;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::PanelRow;

pub use descriptive::{ColumnSummary, summarize};
pub use iv::WaldIv;

/// One regression to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    pub name: String,
    pub outcome: String,
    pub endogenous: String,
    pub instrument: String,
    #[serde(default)]
    pub controls: Vec<String>,
    /// Weight rows by `population_weight`
    #[serde(default)]
    pub weighted: bool,
}

impl Specification {
    /// Every column the specification reads
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        let mut columns = vec![
            self.outcome.as_str(),
            self.endogenous.as_str(),
            self.instrument.as_str(),
        ];
        columns.extend(self.controls.iter().map(String::as_str));
        if self.weighted {
            columns.push("population_weight");
        }
        columns
    }
}

/// Result of one specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub specification: String,
    pub coefficient: f64,
    pub std_error: f64,
    pub observations: usize,
    /// Coefficients of the constant and the controls, in order
    pub nuisance: Vec<f64>,
}

/// An estimation engine
pub trait Estimator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Estimate one specification on rows that already passed
    /// `finite_rows`
    fn estimate(&self, spec: &Specification, rows: &[&PanelRow]) -> Result<Estimate>;
}

/// Rows whose every used column is present and finite. Weighted
/// specifications also require a positive weight.
#[must_use]
pub fn finite_rows<'a>(rows: &'a [PanelRow], spec: &Specification) -> Vec<&'a PanelRow> {
    let columns = spec.columns();
    rows.iter()
        .filter(|row| {
            columns
                .iter()
                .all(|c| row.value(c).is_some_and(f64::is_finite))
        })
        .filter(|row| !spec.weighted || row.population_weight.is_some_and(|w| w > 0.0))
        .collect()
}

/// Runs a batch of specifications with one estimator
pub struct EstimationRunner<E: Estimator> {
    estimator: E,
}

impl<E: Estimator> EstimationRunner<E> {
    pub fn new(estimator: E) -> Self {
        Self { estimator }
    }

    /// Estimate every specification; failures become `None`
    pub fn run_all(
        &self,
        rows: &[PanelRow],
        specs: &[Specification],
    ) -> Vec<(String, Option<Estimate>)> {
        specs
            .iter()
            .map(|spec| {
                let usable = finite_rows(rows, spec);
                info!(
                    "{} {}: {} of {} rows usable",
                    self.estimator.name(),
                    spec.name,
                    usable.len(),
                    rows.len()
                );
                let estimate = match self.estimator.estimate(spec, &usable) {
                    Ok(estimate) => Some(estimate),
                    Err(e) => {
                        warn!("Specification {} failed: {e}", spec.name);
                        None
                    }
                };
                (spec.name.clone(), estimate)
            })
            .collect()
    }
}

/// Baseline specifications: migration log change on destination and
/// origin exposure, each flow instrumented by its shift-share counterpart
#[must_use]
pub fn default_specifications() -> Vec<Specification> {
    let mut specs = Vec::new();
    for side in ["destination", "origin"] {
        for flow in ["import", "export"] {
            specs.push(Specification {
                name: format!("{side}_{flow}"),
                outcome: "migration_log_change".into(),
                endogenous: format!("x_{flow}_{side}"),
                instrument: format!("z_{flow}_{side}"),
                controls: vec![
                    "o_manufacturing_share".into(),
                    "d_manufacturing_share".into(),
                    "o_pre_migration_log_change".into(),
                ],
                weighted: true,
            });
        }
    }
    specs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PanelError;

    struct Failing;

    impl Estimator for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn estimate(&self, spec: &Specification, _rows: &[&PanelRow]) -> Result<Estimate> {
            Err(PanelError::estimation(&spec.name, "always fails"))
        }
    }

    fn spec(weighted: bool) -> Specification {
        Specification {
            name: "s".into(),
            outcome: "migration".into(),
            endogenous: "x_import_origin".into(),
            instrument: "z_import_origin".into(),
            controls: vec![],
            weighted,
        }
    }

    #[test]
    fn finite_filter_drops_missing_and_unweighted_rows() {
        let complete = PanelRow {
            x_import_origin: Some(1.0),
            z_import_origin: Some(1.0),
            population_weight: Some(10.0),
            ..PanelRow::default()
        };
        let missing = PanelRow {
            x_import_origin: None,
            ..complete.clone()
        };
        let nan = PanelRow {
            z_import_origin: Some(f64::NAN),
            ..complete.clone()
        };
        let zero_weight = PanelRow {
            population_weight: Some(0.0),
            ..complete.clone()
        };
        let rows = vec![complete, missing, nan, zero_weight];

        assert_eq!(finite_rows(&rows, &spec(false)).len(), 2);
        assert_eq!(finite_rows(&rows, &spec(true)).len(), 1);
    }

    #[test]
    fn failures_do_not_stop_the_batch() {
        let runner = EstimationRunner::new(Failing);
        let results = runner.run_all(&[], &[spec(false), spec(true)]);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, r)| r.is_none()));
    }

    #[test]
    fn default_specifications_pair_exposures_with_instruments() {
        let specs = default_specifications();
        assert_eq!(specs.len(), 4);
        assert!(specs.iter().all(|s| s.endogenous[1..] == s.instrument[1..]));
    }
}
