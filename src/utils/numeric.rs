//! Numeric policies for missing and degenerate values
//!
//! Two rules apply across the pipeline. Exposure terms are summed, so a
//! ratio that is NaN or infinite contributes zero. Covariates are looked
//! at row by row in the regression layer, so a degenerate ratio stays
//! missing.

/// Replace NaN and infinities with zero
#[must_use]
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// `numerator / denominator`, zero when the result is not finite
#[must_use]
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    finite_or_zero(numerator / denominator)
}

/// `numerator / denominator`, `None` when either side is missing or the
/// result is not finite
#[must_use]
pub fn ratio_or_none(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let value = numerator? / denominator?;
    value.is_finite().then_some(value)
}

/// Add `value` into an optional running sum, skipping missing values.
///
/// A sum that only ever saw missing values stays missing.
pub fn add_skipna(total: &mut Option<f64>, value: Option<f64>) {
    if let Some(v) = value.filter(|v| !v.is_nan()) {
        *total = Some(total.unwrap_or(0.0) + v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_ratios() {
        assert_eq!(ratio_or_zero(5.0, 0.0), 0.0);
        assert_eq!(ratio_or_zero(0.0, 0.0), 0.0);
        assert_eq!(ratio_or_zero(1.0, 4.0), 0.25);
        assert_eq!(ratio_or_none(Some(5.0), Some(0.0)), None);
        assert_eq!(ratio_or_none(None, Some(2.0)), None);
        assert_eq!(ratio_or_none(Some(1.0), Some(2.0)), Some(0.5));
    }

    #[test]
    fn skipna_sum_keeps_all_missing_groups_missing() {
        let mut total = None;
        add_skipna(&mut total, None);
        assert_eq!(total, None);
        add_skipna(&mut total, Some(2.0));
        add_skipna(&mut total, None);
        add_skipna(&mut total, Some(f64::NAN));
        add_skipna(&mut total, Some(3.0));
        assert_eq!(total, Some(5.0));
    }
}
