//! Realised exposure and shift-share instrument per commuting zone

use log::{debug, info};
use rayon::prelude::*;

use crate::config::{InstrumentVariant, PeriodDefinition};
use crate::error::{PanelError, Result};
use crate::models::{ExposureRecord, FlowDirection, ShockRecord};
use crate::utils::numeric::{finite_or_zero, ratio_or_zero};

use super::shares::EmploymentShares;
use super::shock::ShockIndex;

/// Import and export exposure of one commuting zone in one period
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowExposure {
    pub cz: u32,
    pub period: u8,
    pub import: f64,
    pub export: f64,
}

/// Combines shocks with local employment shares.
///
/// For commuting zone `c` and period `p` the exposure is
/// `sum_i shock(p, i) / L(i, base(p)) * s(c, i)`, where `L` is national
/// industry employment at the period's base year and `s` the zone's
/// industry share at the share year. Non-finite terms count as zero.
#[derive(Debug, Clone, Copy)]
pub struct ExposureBuilder<'a> {
    shares: &'a EmploymentShares,
    periods: &'a [PeriodDefinition],
}

impl<'a> ExposureBuilder<'a> {
    #[must_use]
    pub fn new(shares: &'a EmploymentShares, periods: &'a [PeriodDefinition]) -> Self {
        Self { shares, periods }
    }

    fn term(&self, index: &ShockIndex, cz: u32, period: &PeriodDefinition, flow: FlowDirection) -> f64 {
        self.shares
            .shares_of(cz)
            .iter()
            .map(|(industry, share)| {
                let shock = index.get(flow, industry, period.end_year).unwrap_or(0.0);
                let national = self.shares.national(period.base_year, industry).unwrap_or(0.0);
                ratio_or_zero(shock, national) * finite_or_zero(*share)
            })
            .sum()
    }

    fn exposures(&self, imports: &ShockIndex, exports: &ShockIndex) -> Vec<FlowExposure> {
        let zones: Vec<u32> = self.shares.commuting_zones().into_iter().collect();
        let mut out: Vec<FlowExposure> = zones
            .par_iter()
            .flat_map_iter(|&cz| {
                self.periods.iter().map(move |period| FlowExposure {
                    cz,
                    period: period.index,
                    import: self.term(imports, cz, period, FlowDirection::Import),
                    export: self.term(exports, cz, period, FlowDirection::Export),
                })
            })
            .collect();
        out.sort_by_key(|e| (e.cz, e.period));
        out
    }

    /// Exposure to the reporter's own realised shocks (`x_`)
    #[must_use]
    pub fn treatment(&self, shocks: &[ShockRecord], reporter: &str) -> Vec<FlowExposure> {
        let own = ShockIndex::for_countries(shocks, &[reporter]);
        self.exposures(&own, &own)
    }

    /// Exposure to the donor countries' shocks (`z_`). The reporter may
    /// not be one of the donors.
    pub fn instrument(
        &self,
        shocks: &[ShockRecord],
        reporter: &str,
        variant: &InstrumentVariant,
    ) -> Result<Vec<FlowExposure>> {
        let mut donors = variant.import_donors.iter().chain(&variant.export_donors);
        if let Some(donor) = donors.find(|d| *d == reporter) {
            return Err(PanelError::Config(format!(
                "variant {} uses the reporter {donor} as a donor",
                variant.name
            )));
        }
        let imports = ShockIndex::for_countries(shocks, &variant.import_donors);
        let exports = ShockIndex::for_countries(shocks, &variant.export_donors);
        if imports.is_empty() || exports.is_empty() {
            debug!("variant {} has donors without any shocks", variant.name);
        }
        Ok(self.exposures(&imports, &exports))
    }

    /// Treatment and instrument of every variant, sorted by
    /// (variant, cz, period). The treatment is shared across variants.
    pub fn build(
        &self,
        shocks: &[ShockRecord],
        reporter: &str,
        variants: &[InstrumentVariant],
    ) -> Result<Vec<ExposureRecord>> {
        let treatment = self.treatment(shocks, reporter);
        let mut records = Vec::with_capacity(treatment.len() * variants.len());

        for variant in variants {
            let instrument = self.instrument(shocks, reporter, variant)?;
            for (x, z) in treatment.iter().zip(&instrument) {
                debug_assert_eq!((x.cz, x.period), (z.cz, z.period));
                records.push(ExposureRecord {
                    variant: variant.name.clone(),
                    cz: x.cz,
                    period: x.period,
                    x_import: x.import,
                    x_export: x.export,
                    z_import: z.import,
                    z_export: z.export,
                });
            }
            info!(
                "Exposure variant {}: {} zone-periods",
                variant.name,
                instrument.len()
            );
        }
        Ok(records)
    }
}
