//! Bilateral region-pair panel
//!
//! Every ordered pair of canonical regions in different commuting zones
//! gets one row per regression period. Migration defaults to zero; every
//! other join keeps its miss as `None`.

use std::collections::BTreeMap;

use itertools::Itertools;
use log::info;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::PeriodDefinition;
use crate::models::{ControlRecord, ExposureRecord, PanelRow, PeriodFlow, PopulationRecord, Region};
use crate::utils::numeric::add_skipna;

/// `ln(1 + current) - ln(1 + previous)`
#[must_use]
pub fn log_change(current: f64, previous: f64) -> Option<f64> {
    let value = current.ln_1p() - previous.ln_1p();
    value.is_finite().then_some(value)
}

/// Joins every upstream table onto the region-pair grid
#[derive(Debug)]
pub struct PanelAssembler<'a> {
    regions: &'a [Region],
    periods: Vec<PeriodDefinition>,
    flows: FxHashMap<(&'a str, &'a str, u8), f64>,
    exposures: &'a [ExposureRecord],
    controls: FxHashMap<u32, &'a ControlRecord>,
    population: FxHashMap<&'a str, f64>,
}

impl<'a> PanelAssembler<'a> {
    /// `population` holds the weights of one year, keyed by the region code
    /// as published.
    #[must_use]
    pub fn new(
        regions: &'a [Region],
        periods: &[PeriodDefinition],
        flows: &'a [PeriodFlow],
        exposures: &'a [ExposureRecord],
        controls: &'a [ControlRecord],
        population: &'a [PopulationRecord],
    ) -> Self {
        let mut periods = periods.to_vec();
        periods.sort_by_key(|p| p.index);

        let mut flow_map = FxHashMap::default();
        for flow in flows {
            *flow_map
                .entry((flow.origin.as_str(), flow.destination.as_str(), flow.period))
                .or_insert(0.0) += flow.count;
        }

        let mut weights = FxHashMap::default();
        for record in population {
            *weights.entry(record.region.as_str()).or_insert(0.0) += record.population;
        }

        Self {
            regions,
            periods,
            flows: flow_map,
            exposures,
            controls: controls.iter().map(|c| (c.cz, c)).collect(),
            population: weights,
        }
    }

    fn migration(&self, origin: &str, destination: &str, period: u8) -> f64 {
        self.flows.get(&(origin, destination, period)).copied().unwrap_or(0.0)
    }

    /// Index of the period preceding `index`; 0 (the pre-period) for the first
    fn previous_period(&self, index: u8) -> u8 {
        self.periods
            .iter()
            .map(|p| p.index)
            .filter(|&i| i < index)
            .max()
            .unwrap_or(0)
    }

    /// Number of rows `assemble` produces
    #[must_use]
    pub fn expected_rows(&self) -> usize {
        let regions: Vec<&Region> = self.regions.iter().unique_by(|r| &r.code).collect();
        let pairs = regions
            .iter()
            .cartesian_product(&regions)
            .filter(|(o, d)| o.code != d.code && o.cz != d.cz)
            .count();
        pairs * self.periods.len()
    }

    /// Panel for one instrument variant, sorted by (origin, destination,
    /// period)
    ///
    /// # Arguments
    /// * `variant` - Name of the instrument variant whose exposure rows
    ///   are joined
    ///
    /// # Returns
    /// One row per ordered cross-zone region pair and period. Join misses
    /// are left as `None`.
    #[must_use]
    pub fn assemble(&self, variant: &str) -> Vec<PanelRow> {
        let exposures: FxHashMap<(u32, u8), &ExposureRecord> = self
            .exposures
            .iter()
            .filter(|e| e.variant == variant)
            .map(|e| ((e.cz, e.period), e))
            .collect();

        let mut regions: Vec<&Region> = self.regions.iter().collect();
        regions.sort();
        regions.dedup_by(|a, b| a.code == b.code);

        let rows: Vec<PanelRow> = regions
            .par_iter()
            .flat_map_iter(|origin| {
                let exposures = &exposures;
                regions
                    .iter()
                    .filter(move |d| d.code != origin.code && d.cz != origin.cz)
                    .flat_map(move |destination| {
                        self.periods
                            .iter()
                            .map(move |period| self.row(origin, destination, period.index, exposures))
                    })
            })
            .collect();

        info!("Panel {variant}: {} rows", rows.len());
        rows
    }

    fn row(
        &self,
        origin: &Region,
        destination: &Region,
        period: u8,
        exposures: &FxHashMap<(u32, u8), &ExposureRecord>,
    ) -> PanelRow {
        let migration = self.migration(&origin.code, &destination.code, period);
        let previous = self.migration(&origin.code, &destination.code, self.previous_period(period));
        let o_exp = exposures.get(&(origin.cz, period));
        let d_exp = exposures.get(&(destination.cz, period));
        let o_ctl = self.controls.get(&origin.cz);
        let d_ctl = self.controls.get(&destination.cz);

        PanelRow {
            origin: origin.code.clone(),
            destination: destination.code.clone(),
            origin_cz: origin.cz,
            destination_cz: destination.cz,
            period,
            migration,
            migration_log_change: log_change(migration, previous),

            x_import_origin: o_exp.map(|e| e.x_import),
            x_export_origin: o_exp.map(|e| e.x_export),
            x_import_destination: d_exp.map(|e| e.x_import),
            x_export_destination: d_exp.map(|e| e.x_export),
            z_import_origin: o_exp.map(|e| e.z_import),
            z_export_origin: o_exp.map(|e| e.z_export),
            z_import_destination: d_exp.map(|e| e.z_import),
            z_export_destination: d_exp.map(|e| e.z_export),

            o_manufacturing_share: o_ctl.and_then(|c| c.manufacturing_share),
            o_college_share: o_ctl.and_then(|c| c.college_share),
            o_foreign_share: o_ctl.and_then(|c| c.foreign_share),
            o_population: o_ctl.and_then(|c| c.population),
            o_pre_migration_log_change: o_ctl.and_then(|c| c.pre_migration_log_change),
            d_manufacturing_share: d_ctl.and_then(|c| c.manufacturing_share),
            d_college_share: d_ctl.and_then(|c| c.college_share),
            d_foreign_share: d_ctl.and_then(|c| c.foreign_share),
            d_population: d_ctl.and_then(|c| c.population),
            d_pre_migration_log_change: d_ctl.and_then(|c| c.pre_migration_log_change),

            population_weight: self.population.get(origin.code.as_str()).copied(),
        }
    }

    /// Panels of several variants; every join except the exposures is
    /// shared
    #[must_use]
    pub fn assemble_variants<S: AsRef<str>>(&self, variants: &[S]) -> Vec<(String, Vec<PanelRow>)> {
        variants
            .iter()
            .map(|v| (v.as_ref().to_string(), self.assemble(v.as_ref())))
            .collect()
    }

    /// Collapse a region-pair panel to one row per (origin CZ, destination
    /// CZ, period).
    ///
    /// Migration is summed over member pairs and its log change recomputed
    /// from the summed counts. Zone-level columns are taken from the first
    /// member row. The population weight sums each origin region once.
    /// Region columns carry the zone ids.
    #[must_use]
    pub fn collapse_to_cz(&self, rows: &[PanelRow]) -> Vec<PanelRow> {
        let mut groups: BTreeMap<(u32, u32, u8), (PanelRow, f64, FxHashSet<&str>)> = BTreeMap::new();

        for row in rows {
            let key = (row.origin_cz, row.destination_cz, row.period);
            let (acc, previous, origins) = groups.entry(key).or_insert_with(|| {
                let mut first = row.clone();
                first.origin = row.origin_cz.to_string();
                first.destination = row.destination_cz.to_string();
                first.migration = 0.0;
                first.population_weight = None;
                (first, 0.0, FxHashSet::default())
            });
            acc.migration += row.migration;
            *previous += self.migration(&row.origin, &row.destination, self.previous_period(row.period));
            if origins.insert(row.origin.as_str()) {
                add_skipna(&mut acc.population_weight, row.population_weight);
            }
        }

        groups
            .into_values()
            .map(|(mut row, previous, _)| {
                row.migration_log_change = log_change(row.migration, previous);
                row
            })
            .collect()
    }
}
