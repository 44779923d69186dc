//! Weighted just-identified instrumental variables

use crate::error::{PanelError, Result};
use crate::models::PanelRow;

use super::linalg::{Matrix, apply, invert, multiply, transpose};
use super::{Estimate, Estimator, Specification};

/// Just-identified IV with a constant and exogenous controls.
///
/// With regressors `X = [1, x, W]` and instruments `Z = [1, z, W]` the
/// estimate is `b = (Z'ΩX)^-1 Z'Ωy`, `Ω` the diagonal weights. The
/// standard error is the homoskedastic one.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaldIv;

impl WaldIv {
    fn design(spec: &Specification, rows: &[&PanelRow], column: &str) -> Matrix {
        rows.iter()
            .map(|row| {
                let mut line = vec![1.0, row.value(column).unwrap_or(0.0)];
                line.extend(spec.controls.iter().map(|c| row.value(c).unwrap_or(0.0)));
                line
            })
            .collect()
    }
}

impl Estimator for WaldIv {
    fn name(&self) -> &'static str {
        "wald-iv"
    }

    fn estimate(&self, spec: &Specification, rows: &[&PanelRow]) -> Result<Estimate> {
        let k = 2 + spec.controls.len();
        if rows.len() <= k {
            return Err(PanelError::estimation(
                &spec.name,
                format!("{} rows for {k} parameters", rows.len()),
            ));
        }

        let x = Self::design(spec, rows, &spec.endogenous);
        let z = Self::design(spec, rows, &spec.instrument);
        let y: Vec<f64> = rows
            .iter()
            .map(|row| row.value(&spec.outcome).unwrap_or(0.0))
            .collect();
        let w: Vec<f64> = rows
            .iter()
            .map(|row| {
                if spec.weighted {
                    row.population_weight.unwrap_or(0.0)
                } else {
                    1.0
                }
            })
            .collect();

        let zt_weighted: Matrix = transpose(&z)
            .into_iter()
            .map(|col| col.iter().zip(&w).map(|(v, w)| v * w).collect())
            .collect();
        let zwx = multiply(&zt_weighted, &x);
        let zwz = multiply(&zt_weighted, &z);
        let inverse = invert(&zwx)
            .ok_or_else(|| PanelError::estimation(&spec.name, "instrument matrix is singular"))?;
        let beta = apply(&inverse, &apply(&zt_weighted, &y));

        let fitted = apply(&x, &beta);
        let weight_sum: f64 = w.iter().sum();
        let ssr: f64 = y
            .iter()
            .zip(&fitted)
            .zip(&w)
            .map(|((y, f), w)| w * (y - f).powi(2))
            .sum();
        let scale = weight_sum / rows.len() as f64;
        let sigma2 = ssr / scale / (rows.len() - k) as f64;
        let sandwich = multiply(&multiply(&inverse, &zwz), &transpose(&inverse));
        let std_error = (sigma2 * sandwich[1][1] * scale).sqrt();

        if !beta[1].is_finite() {
            return Err(PanelError::estimation(&spec.name, "coefficient is not finite"));
        }

        let mut nuisance = vec![beta[0]];
        nuisance.extend_from_slice(&beta[2..]);
        Ok(Estimate {
            specification: spec.name.clone(),
            coefficient: beta[1],
            std_error,
            observations: rows.len(),
            nuisance,
        })
    }
}
