//! Local industry employment shares and national industry totals

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;

use crate::models::EmploymentRecord;
use crate::utils::logging::log_drop_summary;
use crate::utils::numeric::ratio_or_zero;

/// Employment structure the exposure terms are weighted with
///
/// Shares come from a single pre-period snapshot. National industry
/// totals are kept for every base year a period normalises against.
#[derive(Debug, Clone, Default)]
pub struct EmploymentShares {
    share_year: i32,
    shares: BTreeMap<u32, Vec<(String, f64)>>,
    national: FxHashMap<(i32, String), f64>,
}

impl EmploymentShares {
    /// Build from the harmonised industry panel.
    ///
    /// `cz_of` maps canonical region codes to commuting zones; regions
    /// without a zone are left out of the shares.
    #[must_use]
    pub fn build(
        panel: &[EmploymentRecord],
        cz_of: &FxHashMap<String, u32>,
        share_year: i32,
        base_years: &[i32],
    ) -> Self {
        let mut cells: BTreeMap<(u32, &str), f64> = BTreeMap::new();
        let mut national: FxHashMap<(i32, String), f64> = FxHashMap::default();
        let mut unzoned = 0;
        let mut snapshot = 0;

        for record in panel {
            let employment = record.employment.unwrap_or(0.0);
            if base_years.contains(&record.year) {
                *national
                    .entry((record.year, record.industry.clone()))
                    .or_insert(0.0) += employment;
            }
            if record.year != share_year {
                continue;
            }
            snapshot += 1;
            match cz_of.get(&record.region) {
                Some(&cz) => *cells.entry((cz, record.industry.as_str())).or_insert(0.0) += employment,
                None => unzoned += 1,
            }
        }
        log_drop_summary("employment shares", "region without commuting zone", unzoned, snapshot);

        let mut totals: FxHashMap<u32, f64> = FxHashMap::default();
        for (&(cz, _), &employment) in &cells {
            *totals.entry(cz).or_insert(0.0) += employment;
        }

        let mut shares: BTreeMap<u32, Vec<(String, f64)>> = BTreeMap::new();
        for ((cz, industry), employment) in cells {
            let total = totals.get(&cz).copied().unwrap_or(0.0);
            shares
                .entry(cz)
                .or_default()
                .push((industry.to_string(), ratio_or_zero(employment, total)));
        }

        Self {
            share_year,
            shares,
            national,
        }
    }

    #[must_use]
    pub fn share_year(&self) -> i32 {
        self.share_year
    }

    /// Industry shares of one commuting zone
    #[must_use]
    pub fn shares_of(&self, cz: u32) -> &[(String, f64)] {
        self.shares.get(&cz).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn share(&self, cz: u32, industry: &str) -> f64 {
        self.shares_of(cz)
            .iter()
            .find(|(i, _)| i == industry)
            .map_or(0.0, |(_, s)| *s)
    }

    /// National employment of an industry at a base year
    #[must_use]
    pub fn national(&self, base_year: i32, industry: &str) -> Option<f64> {
        self.national.get(&(base_year, industry.to_string())).copied()
    }

    #[must_use]
    pub fn commuting_zones(&self) -> BTreeSet<u32> {
        self.shares.keys().copied().collect()
    }
}
