//! Commuting-zone control covariates

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::config::YearRange;
use crate::models::{ControlRecord, DemographicRecord, EmploymentRecord, FlowCount};
use crate::utils::numeric::{add_skipna, ratio_or_none};

/// Two-digit KSIC division of an industry code, ignoring a leading
/// section letter (`C10` and `10` are both division 10)
#[must_use]
pub fn industry_division(code: &str) -> Option<u32> {
    let digits = code.trim().trim_start_matches(|c: char| c.is_ascii_alphabetic());
    digits.get(..2)?.parse().ok()
}

#[derive(Debug, Default)]
struct ZoneTotals {
    employment: Option<f64>,
    manufacturing: Option<f64>,
    population: Option<f64>,
    college: Option<f64>,
    foreign: Option<f64>,
    outflow_start: f64,
    outflow_end: f64,
    has_flows: bool,
}

/// Builds `ControlRecord`s at one benchmark year
#[derive(Debug, Clone, Copy)]
pub struct ControlBuilder<'a> {
    cz_of: &'a FxHashMap<String, u32>,
    year: i32,
    manufacturing: (u32, u32),
    pre_period: YearRange,
}

impl<'a> ControlBuilder<'a> {
    #[must_use]
    pub fn new(
        cz_of: &'a FxHashMap<String, u32>,
        year: i32,
        manufacturing: (u32, u32),
        pre_period: YearRange,
    ) -> Self {
        Self {
            cz_of,
            year,
            manufacturing,
            pre_period,
        }
    }

    fn is_manufacturing(&self, industry: &str) -> bool {
        industry_division(industry)
            .is_some_and(|d| (self.manufacturing.0..=self.manufacturing.1).contains(&d))
    }

    /// One record per commuting zone seen in any input, sorted by zone.
    ///
    /// Shares are `None` when the zone has no denominator. The pre-period
    /// migration log change is `ln(1 + outflow at the window's last year)
    /// - ln(1 + outflow at its first year)`, over moves leaving the zone.
    #[must_use]
    pub fn build(
        &self,
        employment: &[EmploymentRecord],
        demographics: &[DemographicRecord],
        flows: &[FlowCount],
    ) -> Vec<ControlRecord> {
        let mut zones: BTreeMap<u32, ZoneTotals> = BTreeMap::new();

        for record in employment.iter().filter(|r| r.year == self.year) {
            let Some(&cz) = self.cz_of.get(&record.region) else {
                continue;
            };
            let zone = zones.entry(cz).or_default();
            add_skipna(&mut zone.employment, record.employment);
            if self.is_manufacturing(&record.industry) {
                add_skipna(&mut zone.manufacturing, record.employment);
            } else {
                add_skipna(&mut zone.manufacturing, Some(0.0));
            }
        }

        for record in demographics.iter().filter(|r| r.year == self.year) {
            let Some(&cz) = self.cz_of.get(&record.region) else {
                continue;
            };
            let zone = zones.entry(cz).or_default();
            add_skipna(&mut zone.population, record.population);
            add_skipna(&mut zone.college, record.college_educated);
            add_skipna(&mut zone.foreign, record.foreign_born);
        }

        for flow in flows {
            let (Some(&from), Some(&to)) =
                (self.cz_of.get(&flow.origin), self.cz_of.get(&flow.destination))
            else {
                continue;
            };
            if from == to {
                continue;
            }
            let zone = zones.entry(from).or_default();
            if flow.year == self.pre_period.start {
                zone.outflow_start += flow.count;
                zone.has_flows = true;
            } else if flow.year == self.pre_period.end {
                zone.outflow_end += flow.count;
                zone.has_flows = true;
            }
        }

        zones
            .into_iter()
            .map(|(cz, zone)| ControlRecord {
                cz,
                manufacturing_share: ratio_or_none(zone.manufacturing, zone.employment),
                college_share: ratio_or_none(zone.college, zone.population),
                foreign_share: ratio_or_none(zone.foreign, zone.population),
                population: zone.population,
                pre_migration_log_change: zone
                    .has_flows
                    .then(|| zone.outflow_end.ln_1p() - zone.outflow_start.ln_1p()),
            })
            .collect()
    }
}
