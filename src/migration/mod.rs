//! Internal migration microdata: era layouts, region harmonisation and
//! bilateral flow aggregation.
//!
//! Years are processed one at a time. Each year's records are streamed,
//! harmonised and summed into a year table that is folded into the running
//! total and dropped before the next file is opened.

pub mod aggregate;
pub mod era;
pub mod harmonize;
pub mod loader;

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::crosswalk::region::{RegionResolver, ResolutionStats};
use crate::error::Result;
use crate::models::FlowCount;
use crate::utils::logging::{
    create_main_progress_bar, finish_progress_bar, log_drop_summary, log_warning,
};

pub use aggregate::{FlowAccumulator, aggregate_by_period, aggregate_by_year, period_of};
pub use era::{EraLayout, MigrationEra, default_eras, era_for_year};
pub use harmonize::{HarmonizeStats, MigrantFilter, harmonize, harmonize_record};
pub use loader::{EraLoader, LoadedRow};

/// Output of a harmonisation run
#[derive(Debug, Clone, Default)]
pub struct MigrationFlows {
    pub flows: Vec<FlowCount>,
    pub stats: HarmonizeStats,
    pub regions: ResolutionStats,
    /// Years whose file was absent
    pub missing_years: Vec<i32>,
}

/// Reads every era's files and produces harmonised yearly flows
#[derive(Debug)]
pub struct MigrationHarmonizer<'a> {
    eras: &'a [MigrationEra],
    resolver: &'a RegionResolver,
    filter: MigrantFilter,
}

impl<'a> MigrationHarmonizer<'a> {
    #[must_use]
    pub fn new(eras: &'a [MigrationEra], resolver: &'a RegionResolver) -> Self {
        Self {
            eras,
            resolver,
            filter: MigrantFilter::default(),
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: MigrantFilter) -> Self {
        self.filter = filter;
        self
    }

    fn year_file(dir: &Path, era: &MigrationEra, year: i32) -> PathBuf {
        dir.join(era.file_for(year))
    }

    /// Harmonise one year into its own table
    pub fn harmonize_year(
        &self,
        era: &MigrationEra,
        path: &Path,
        year: i32,
    ) -> Result<(FlowAccumulator, HarmonizeStats, ResolutionStats)> {
        let mut acc = FlowAccumulator::new();
        let mut stats = HarmonizeStats::default();
        let mut regions = ResolutionStats::default();

        EraLoader::new(era).for_each_record(path, year, |row| match row {
            LoadedRow::Record(record) => {
                if let Some(record) =
                    harmonize_record(record, self.resolver, &self.filter, &mut stats, &mut regions)
                {
                    acc.add(&record);
                }
            }
            LoadedRow::InvalidPersons => {
                stats.total += 1;
                stats.invalid_persons += 1;
            }
        })?;
        Ok((acc, stats, regions))
    }

    /// Process every year of every era found under `dir`.
    ///
    /// A missing year file is logged and skipped.
    ///
    /// # Arguments
    /// * `dir` - Directory holding one file per year
    ///
    /// # Returns
    /// Yearly flows with the drop counters and the years without a file
    pub fn run(&self, dir: &Path) -> Result<MigrationFlows> {
        let total_years: u64 = self.eras.iter().map(|e| e.years().count() as u64).sum();
        let pb = create_main_progress_bar(total_years, Some("Harmonising migration years"));

        if !self.filter.is_unrestricted() {
            info!("Restricting migrants to {:?}", self.filter);
        }
        let mut total = FlowAccumulator::new();
        let mut out = MigrationFlows::default();

        for era in self.eras {
            let mut era_table = FlowAccumulator::new();
            for year in era.years() {
                let path = Self::year_file(dir, era, year);
                if !path.exists() {
                    log_warning(&format!("no migration file for {year}"), Some(path.as_path()));
                    out.missing_years.push(year);
                    pb.inc(1);
                    continue;
                }

                let (year_table, stats, regions) = self.harmonize_year(era, &path, year)?;
                debug!(
                    "Migration {year}: {} of {} records kept, {} cells",
                    stats.kept,
                    stats.total,
                    year_table.len()
                );
                era_table.absorb(year_table);
                out.stats.merge(&stats);
                out.regions.merge(&regions);
                pb.inc(1);
            }
            info!("Era {} folded into {} cells", era.name, era_table.len());
            total.absorb(era_table);
        }

        finish_progress_bar(&pb, Some("Migration harmonised"));
        let step = "migration";
        log_drop_summary(step, "excluded by migrant filter", out.stats.filtered, out.stats.total);
        log_drop_summary(step, "invalid mover count", out.stats.invalid_persons, out.stats.total);
        log_drop_summary(step, "unresolved region code", out.stats.unresolved, out.stats.total);
        log_drop_summary(step, "same-region move", out.stats.same_region, out.stats.total);

        out.flows = total.into_flows();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::crosswalk::region::{CodeLookup, CodePair};

    #[test]
    fn run_folds_years_and_skips_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("migration_2001.csv"),
            "pre_addr_code,cur_addr_code,movers\n1101053,2601010,2\n1101053,1101099,1\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("migration_2002.csv"),
            "pre_addr_code,cur_addr_code,movers\n1101053,2601010,3\n1101053,2601010,abc\n",
        )
        .unwrap();

        let eras = vec![MigrationEra {
            start_year: 2001,
            end_year: 2003,
            ..default_eras().remove(1)
        }];
        let kosis = CodeLookup::from_pairs("kosis", Vec::<CodePair>::new()).unwrap();
        let stat = CodeLookup::from_pairs("stat", Vec::<CodePair>::new()).unwrap();
        let resolver = RegionResolver::new(kosis, stat, &BTreeMap::new()).unwrap();

        let out = MigrationHarmonizer::new(&eras, &resolver).run(dir.path()).unwrap();
        assert_eq!(out.missing_years, vec![2003]);
        assert_eq!(out.stats.same_region, 1);
        assert_eq!(out.stats.invalid_persons, 1);
        assert_eq!(out.stats.total, 4);
        assert_eq!(out.flows.len(), 2);
        assert_eq!(out.flows.iter().map(|f| f.count).sum::<f64>(), 5.0);
        assert!(out.flows.iter().all(|f| f.origin == "11010" && f.destination == "26010"));
    }
}
