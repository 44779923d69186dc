//! Price deflation of trade values

use std::collections::BTreeMap;

use crate::error::{PanelError, Result};
use crate::models::DeflatorRecord;

/// Cumulative deflator built from annual price ratios
#[derive(Debug, Clone)]
pub struct Deflator {
    ratios: BTreeMap<i32, f64>,
    reference_year: i32,
}

impl Deflator {
    /// Build from annual ratios. A year listed twice is an error.
    pub fn from_ratios(records: &[DeflatorRecord], reference_year: i32) -> Result<Self> {
        let mut ratios = BTreeMap::new();
        for record in records {
            if ratios.insert(record.year, record.ratio).is_some() {
                return Err(PanelError::Config(format!(
                    "deflator lists year {} twice",
                    record.year
                )));
            }
        }
        Ok(Self {
            ratios,
            reference_year,
        })
    }

    #[must_use]
    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    /// Factor converting `year` prices to reference-year prices: the
    /// product of the ratios of `year + 1` through the reference year.
    ///
    /// `None` when a ratio in that span is missing or the year lies after
    /// the reference year.
    #[must_use]
    pub fn factor(&self, year: i32) -> Option<f64> {
        if year > self.reference_year {
            return None;
        }
        ((year + 1)..=self.reference_year)
            .map(|y| self.ratios.get(&y).copied())
            .product::<Option<f64>>()
    }

    /// Value in reference-year prices
    #[must_use]
    pub fn deflate(&self, year: i32, value: f64) -> Option<f64> {
        self.factor(year).map(|f| value * f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deflator() -> Deflator {
        let records: Vec<DeflatorRecord> = (2016..=2019)
            .map(|year| DeflatorRecord { year, ratio: 1.1 })
            .collect();
        Deflator::from_ratios(&records, 2019).unwrap()
    }

    #[test]
    fn factor_compounds_following_years() {
        let d = deflator();
        assert_eq!(d.factor(2019), Some(1.0));
        assert!((d.factor(2017).unwrap() - 1.21).abs() < 1e-12);
        assert!((d.deflate(2018, 100.0).unwrap() - 110.0).abs() < 1e-9);
    }

    #[test]
    fn gaps_and_future_years_have_no_factor() {
        let d = deflator();
        assert_eq!(d.factor(2014), None);
        assert_eq!(d.factor(2020), None);
    }

    #[test]
    fn duplicate_years_are_rejected() {
        let records = [
            DeflatorRecord { year: 2019, ratio: 1.0 },
            DeflatorRecord { year: 2019, ratio: 1.1 },
        ];
        assert!(Deflator::from_ratios(&records, 2019).is_err());
    }
}
