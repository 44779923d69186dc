//! Stage bodies
//!
//! Each stage reads its raw inputs and staged tables, runs the library
//! operations and writes its staged outputs. Row counts of everything
//! written are returned for the run manifest.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use itertools::Itertools;
use log::info;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;

use crate::algorithm::{
    ControlBuilder, Deflator, EmploymentShares, ExposureBuilder, PanelAssembler, compute_shocks,
};
use crate::analysis::{EstimationRunner, WaldIv, default_specifications, summarize};
use crate::config::PipelineConfig;
use crate::crosswalk::commuting_zone::CZ_LOOKUP_FILE;
use crate::crosswalk::{
    CzAssigner, IndustryPanelBuilder, RegionResolver, ResolutionStats, TradeCrosswalk,
    load_census_year, load_trade_records,
};
use crate::error::util::{create_file, ensure_dir, ensure_file};
use crate::error::Result;
use crate::migration::{MigrationHarmonizer, aggregate_by_period};
use crate::models::panel::NUMERIC_COLUMNS;
use crate::models::{
    ControlRecord, DemographicRecord, DeflatorRecord, EmploymentRecord, ExposureRecord, FlowCount,
    PanelRow, PeriodFlow, PopulationRecord, Region, ShockRecord, TradeRecord,
};
use crate::utils::io::delimited::{delimiter_for, read_delimited};
use crate::utils::logging::{create_spinner, finish_progress_bar, log_drop_summary, log_warning};

use super::stage::{Stage, tables};
use super::staging::StagingArea;

/// Raw input files, relative to the raw data directory
pub mod raw {
    pub const TRADE: &str = "trade/trade.csv";
    pub const CENSUS_DIR: &str = "census";
    pub const MIGRATION_DIR: &str = "migration";
    pub const DEFLATOR: &str = "deflator.csv";
    pub const POPULATION: &str = "population.csv";
    pub const DEMOGRAPHICS: &str = "demographics.csv";
}

/// Rows written per staged table or output file
pub type StageOutputs = BTreeMap<String, usize>;

/// Shared state of one pipeline run
#[derive(Debug, Clone)]
pub struct StageContext {
    pub config: Arc<PipelineConfig>,
    pub staging: StagingArea,
}

impl StageContext {
    #[must_use]
    pub fn new(config: Arc<PipelineConfig>) -> Self {
        let staging = StagingArea::new(&config.paths.temp_dir, config.staging_format);
        Self { config, staging }
    }

    fn raw(&self, relative: &str) -> PathBuf {
        self.config.paths.raw_dir.join(relative)
    }

    fn crosswalk_dir(&self) -> &Path {
        &self.config.paths.crosswalk_dir
    }

    /// In strict mode codes listed in the commuting-zone table count as
    /// canonical as well
    fn resolver(&self) -> Result<RegionResolver> {
        let strict = self.config.strict_region_resolution;
        let resolver = RegionResolver::from_dir(self.crosswalk_dir(), &self.config.region_overrides)?
            .strict(strict);
        if !strict {
            return Ok(resolver);
        }
        let assigner = self.cz_assigner()?;
        Ok(resolver.with_canonical(assigner.table_codes().map(str::to_string)))
    }

    fn cz_assigner(&self) -> Result<CzAssigner> {
        CzAssigner::from_file(
            &self.crosswalk_dir().join(CZ_LOOKUP_FILE),
            &self.config.cz_prefix_overrides,
        )
    }

    fn cz_of(&self, stage: Stage) -> Result<FxHashMap<String, u32>> {
        let regions: Vec<Region> = self.staging.read(stage, tables::REGIONS)?;
        Ok(regions.into_iter().map(|r| (r.code, r.cz)).collect())
    }

    /// Read a required raw delimited file
    fn read_raw<T: DeserializeOwned>(&self, relative: &str, purpose: &str) -> Result<Vec<T>> {
        let path = self.raw(relative);
        ensure_file(&path, purpose)?;
        read_delimited(&path, delimiter_for(&path))
    }

    /// Read an optional raw delimited file; absence is logged
    fn read_raw_optional<T: DeserializeOwned>(&self, relative: &str) -> Result<Vec<T>> {
        let path = self.raw(relative);
        if path.is_file() {
            read_delimited(&path, delimiter_for(&path))
        } else {
            log_warning("optional input missing, joins will miss", Some(path.as_path()));
            Ok(Vec::new())
        }
    }

    /// Read an optional raw table keyed by region and resolve its codes.
    ///
    /// # Arguments
    /// * `relative` - File under the raw data directory
    /// * `resolver` - Resolver for the region column
    /// * `region_of` - Accessor for a row's region code
    ///
    /// # Returns
    /// The rows whose region resolved, carrying the canonical code
    fn read_regional<T, F>(
        &self,
        relative: &str,
        resolver: &RegionResolver,
        region_of: F,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        F: Fn(&mut T) -> &mut String,
    {
        let mut stats = ResolutionStats::default();
        let rows = self
            .read_raw_optional::<T>(relative)?
            .into_iter()
            .filter_map(|mut row| {
                let code = resolver.resolve_counted(region_of(&mut row), &mut stats)?;
                *region_of(&mut row) = code;
                Some(row)
            })
            .collect();
        log_drop_summary(relative, "unresolved region code", stats.dropped(), stats.total);
        Ok(rows)
    }

    /// Run one stage
    pub fn run(&self, stage: Stage) -> Result<StageOutputs> {
        match stage {
            Stage::TradeCrosswalk => self.trade_crosswalk(),
            Stage::Establishment => self.establishment(),
            Stage::IndustryPanel => self.industry_panel(),
            Stage::Migration => self.migration(),
            Stage::Exposure => self.exposure(),
            Stage::Controls => self.controls(),
            Stage::Panel => self.panel(),
            Stage::Analysis => self.analysis(),
        }
    }

    fn trade_crosswalk(&self) -> Result<StageOutputs> {
        let crosswalk = TradeCrosswalk::from_dir(self.crosswalk_dir())?;
        let path = self.raw(raw::TRADE);
        ensure_file(&path, "trade extract")?;
        let ksic = crosswalk.to_ksic(load_trade_records(&path)?);

        let mut out = StageOutputs::new();
        out.insert(tables::TRADE_KSIC.into(), self.staging.write(tables::TRADE_KSIC, &ksic)?);
        Ok(out)
    }

    fn establishment(&self) -> Result<StageOutputs> {
        let resolver = self.resolver()?;
        let assigner = self.cz_assigner()?;
        let census_dir = self.raw(raw::CENSUS_DIR);

        let mut records = Vec::new();
        let mut stats = ResolutionStats::default();
        for layout in &self.config.census_layouts {
            let path = census_dir.join(&layout.file);
            if !path.is_file() {
                log_warning(&format!("no census file for {}", layout.year), Some(path.as_path()));
                continue;
            }
            let load = load_census_year(layout, &path, &resolver, self.config.gender_split_from)?;
            stats.merge(&load.regions);
            records.extend(load.records);
        }
        info!(
            "Establishment census: {} cells, {} of {} region codes resolved ({} via override)",
            records.len(),
            stats.resolved,
            stats.total,
            stats.overridden
        );

        let (listed, _) = resolver.resolve_all("commuting zone table", assigner.table_codes());
        let observed = records.iter().map(|r| r.region.clone());
        let (regions, _) =
            assigner.assign_regions(observed.chain(listed.into_iter().map(|(_, code)| code)));

        let mut out = StageOutputs::new();
        out.insert(
            tables::ESTABLISHMENT.into(),
            self.staging.write(tables::ESTABLISHMENT, &records)?,
        );
        out.insert(tables::REGIONS.into(), self.staging.write(tables::REGIONS, &regions)?);
        Ok(out)
    }

    fn industry_panel(&self) -> Result<StageOutputs> {
        let builder = IndustryPanelBuilder::from_dir(self.crosswalk_dir())?;
        let records: Vec<EmploymentRecord> =
            self.staging.read(Stage::IndustryPanel, tables::ESTABLISHMENT)?;

        let by_year = records
            .into_iter()
            .into_group_map_by(|r| r.year)
            .into_iter()
            .sorted_by_key(|(year, _)| *year);
        let panel = builder.build(by_year);

        let mut out = StageOutputs::new();
        out.insert(
            tables::INDUSTRY_PANEL.into(),
            self.staging.write(tables::INDUSTRY_PANEL, &panel)?,
        );
        Ok(out)
    }

    fn migration(&self) -> Result<StageOutputs> {
        let resolver = self.resolver()?;
        let dir = self.raw(raw::MIGRATION_DIR);
        ensure_dir(&dir, false)?;

        let harmonized = MigrationHarmonizer::new(&self.config.migration_eras, &resolver)
            .with_filter(self.config.migrant_filter.clone())
            .run(&dir)?;
        let periods = aggregate_by_period(
            &harmonized.flows,
            &self.config.periods,
            &self.config.pre_period,
        );

        let mut out = StageOutputs::new();
        out.insert(
            tables::MIGRATION_FLOWS.into(),
            self.staging.write(tables::MIGRATION_FLOWS, &harmonized.flows)?,
        );
        out.insert(tables::PERIOD_FLOWS.into(), self.staging.write(tables::PERIOD_FLOWS, &periods)?);
        Ok(out)
    }

    fn exposure(&self) -> Result<StageOutputs> {
        let stage = Stage::Exposure;
        let trade: Vec<TradeRecord> = self.staging.read(stage, tables::TRADE_KSIC)?;
        let panel: Vec<EmploymentRecord> = self.staging.read(stage, tables::INDUSTRY_PANEL)?;
        let cz_of = self.cz_of(stage)?;
        let ratios: Vec<DeflatorRecord> = self.read_raw(raw::DEFLATOR, "trade deflator")?;
        let config = &self.config;

        let deflator = Deflator::from_ratios(&ratios, config.reference_year)?;
        let shocks: Vec<ShockRecord> =
            compute_shocks(&trade, &config.partner, &config.trade_benchmarks, &deflator);
        let base_years: Vec<i32> = config.periods.iter().map(|p| p.base_year).collect();
        let shares = EmploymentShares::build(&panel, &cz_of, config.share_year, &base_years);
        let exposures = ExposureBuilder::new(&shares, &config.periods).build(
            &shocks,
            &config.reporter,
            &config.variants,
        )?;

        let mut out = StageOutputs::new();
        out.insert(tables::SHOCKS.into(), self.staging.write(tables::SHOCKS, &shocks)?);
        out.insert(tables::EXPOSURE.into(), self.staging.write(tables::EXPOSURE, &exposures)?);
        Ok(out)
    }

    fn controls(&self) -> Result<StageOutputs> {
        let stage = Stage::Controls;
        let panel: Vec<EmploymentRecord> = self.staging.read(stage, tables::INDUSTRY_PANEL)?;
        let flows: Vec<FlowCount> = self.staging.read(stage, tables::MIGRATION_FLOWS)?;
        let cz_of = self.cz_of(stage)?;
        let demographics: Vec<DemographicRecord> =
            self.read_regional(raw::DEMOGRAPHICS, &self.resolver()?, |r: &mut DemographicRecord| {
                &mut r.region
            })?;

        let controls: Vec<ControlRecord> = ControlBuilder::new(
            &cz_of,
            self.config.control_year,
            self.config.manufacturing_divisions,
            self.config.pre_period,
        )
        .build(&panel, &demographics, &flows);

        let mut out = StageOutputs::new();
        out.insert(tables::CONTROLS.into(), self.staging.write(tables::CONTROLS, &controls)?);
        Ok(out)
    }

    fn panel(&self) -> Result<StageOutputs> {
        let stage = Stage::Panel;
        let regions: Vec<Region> = self.staging.read(stage, tables::REGIONS)?;
        let flows: Vec<PeriodFlow> = self.staging.read(stage, tables::PERIOD_FLOWS)?;
        let exposures: Vec<ExposureRecord> = self.staging.read(stage, tables::EXPOSURE)?;
        let controls: Vec<ControlRecord> = self.staging.read(stage, tables::CONTROLS)?;
        let population: Vec<PopulationRecord> = self
            .read_regional(raw::POPULATION, &self.resolver()?, |r: &mut PopulationRecord| {
                &mut r.region
            })?
            .into_iter()
            .filter(|p| p.year == self.config.control_year)
            .collect();

        let assembler = PanelAssembler::new(
            &regions,
            &self.config.periods,
            &flows,
            &exposures,
            &controls,
            &population,
        );
        let names: Vec<&str> = self.config.variants.iter().map(|v| v.name.as_str()).collect();

        let mut out = StageOutputs::new();
        for (variant, rows) in assembler.assemble_variants(&names) {
            let collapsed = assembler.collapse_to_cz(&rows);
            let table = tables::panel(&variant);
            out.insert(table.clone(), self.staging.write(&table, &rows)?);
            let table = tables::panel_cz(&variant);
            out.insert(table.clone(), self.staging.write(&table, &collapsed)?);
        }
        Ok(out)
    }

    fn analysis(&self) -> Result<StageOutputs> {
        let output_dir = &self.config.paths.output_dir;
        ensure_dir(output_dir, true)?;
        let runner = EstimationRunner::new(WaldIv);
        let specs = default_specifications();

        let mut out = StageOutputs::new();
        for variant in &self.config.variants {
            let rows: Vec<PanelRow> =
                self.staging.read(Stage::Analysis, &tables::panel(&variant.name))?;

            let spinner = create_spinner(Some(&format!("Estimating variant {}", variant.name)));
            let estimates: BTreeMap<String, _> = runner.run_all(&rows, &specs).into_iter().collect();
            finish_progress_bar(&spinner, None);
            let file = format!("estimates_{}.json", variant.name);
            write_json(&output_dir.join(&file), &estimates)?;
            out.insert(file, estimates.len());

            let summary = summarize(&rows, &NUMERIC_COLUMNS);
            let file = format!("descriptives_{}.json", variant.name);
            write_json(&output_dir.join(&file), &summary)?;
            out.insert(file, summary.len());
        }
        Ok(out)
    }
}

/// Write a value as pretty JSON
pub fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = create_file(path)?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), value)?;
    Ok(())
}
