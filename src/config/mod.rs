//! Configuration for the migration panel pipeline.
//!
//! `PipelineConfig::default()` carries the study design (benchmark years,
//! periods, donor countries, override tables, file layouts). A JSON file can
//! override any subset of it.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crosswalk::commuting_zone::default_prefix_overrides;
use crate::crosswalk::establishment::{CensusLayout, default_census_layouts};
use crate::crosswalk::region::default_legacy_overrides;
use crate::error::{PanelError, Result};
use crate::migration::era::{MigrationEra, default_eras};
use crate::migration::harmonize::MigrantFilter;

/// Reporter whose trade with the partner forms the treatment
pub const DEFAULT_REPORTER: &str = "KOR";

/// Partner country of the trade shock
pub const DEFAULT_PARTNER: &str = "CHN";

/// Donor countries of the ADH-style instrument
pub const ADH_DONORS: [&str; 7] = ["AUS", "DNK", "FIN", "DEU", "NZL", "ESP", "CHE"];

/// Regression period: shocks are measured from `start_year` to `end_year`,
/// migration is counted over `[start_year, end_year)` (the last period
/// includes its end year).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodDefinition {
    /// Period index used in the panel (1, 2)
    pub index: u8,
    /// First year of the period (also the previous trade benchmark)
    pub start_year: i32,
    /// Last year of the period (the trade benchmark the shock is measured at)
    pub end_year: i32,
    /// Employment snapshot used to normalise the shock
    pub base_year: i32,
}

/// Inclusive range of years
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    #[must_use]
    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }
}

/// Donor-country set used to build one instrument variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentVariant {
    pub name: String,
    pub import_donors: Vec<String>,
    pub export_donors: Vec<String>,
}

impl InstrumentVariant {
    /// ADH donors on both flows
    #[must_use]
    pub fn adh() -> Self {
        let donors: Vec<String> = ADH_DONORS.iter().map(ToString::to_string).collect();
        Self {
            name: "adh".to_string(),
            import_donors: donors.clone(),
            export_donors: donors,
        }
    }

    /// ADH donors for imports, Japan alone for exports
    #[must_use]
    pub fn mixed() -> Self {
        Self {
            name: "mixed".to_string(),
            import_donors: ADH_DONORS.iter().map(ToString::to_string).collect(),
            export_donors: vec!["JPN".to_string()],
        }
    }
}

/// Storage format of staged tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StagingFormat {
    #[default]
    Parquet,
    Csv,
}

impl StagingFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Parquet => "parquet",
            Self::Csv => "csv",
        }
    }
}

/// Directory layout of the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    /// Raw microdata (trade, census, migration, population)
    pub raw_dir: PathBuf,
    /// Crosswalk and lookup tables
    pub crosswalk_dir: PathBuf,
    /// Staging area written by one stage and read by later ones
    pub temp_dir: PathBuf,
    /// Analysis-ready panels and estimates
    pub output_dir: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            crosswalk_dir: PathBuf::from("data/crosswalk"),
            temp_dir: PathBuf::from("data/temp"),
            output_dir: PathBuf::from("data/output"),
        }
    }
}

impl DataPaths {
    /// Place all four directories under one root
    #[must_use]
    pub fn under(root: &Path) -> Self {
        Self {
            raw_dir: root.join("raw"),
            crosswalk_dir: root.join("crosswalk"),
            temp_dir: root.join("temp"),
            output_dir: root.join("output"),
        }
    }
}

/// Configuration for the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub paths: DataPaths,
    pub staging_format: StagingFormat,
    pub reporter: String,
    pub partner: String,
    pub periods: Vec<PeriodDefinition>,
    /// Migration window preceding period 1
    pub pre_period: YearRange,
    /// Employment snapshot for local industry shares
    pub share_year: i32,
    /// Price basis of deflated trade values
    pub reference_year: i32,
    pub trade_benchmarks: Vec<i32>,
    pub employment_benchmarks: Vec<i32>,
    /// First census year reporting employment by gender
    pub gender_split_from: i32,
    /// Benchmark year of the control covariates and population weights
    pub control_year: i32,
    /// Inclusive KSIC division range counted as manufacturing
    pub manufacturing_divisions: (u32, u32),
    pub variants: Vec<InstrumentVariant>,
    /// Drop codes that matched no lookup table and are not canonical
    pub strict_region_resolution: bool,
    /// Legacy raw code -> new special city code, applied before lookups
    pub region_overrides: BTreeMap<String, String>,
    /// Two-digit prefix -> commuting zone id, applied after the lookup
    pub cz_prefix_overrides: BTreeMap<String, u32>,
    pub migration_eras: Vec<MigrationEra>,
    /// Subset of movers counted in the flows
    pub migrant_filter: MigrantFilter,
    pub census_layouts: Vec<CensusLayout>,
    /// Stages allowed to run at the same time
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            paths: DataPaths::default(),
            staging_format: StagingFormat::default(),
            reporter: DEFAULT_REPORTER.to_string(),
            partner: DEFAULT_PARTNER.to_string(),
            periods: vec![
                PeriodDefinition {
                    index: 1,
                    start_year: 2001,
                    end_year: 2010,
                    base_year: 2001,
                },
                PeriodDefinition {
                    index: 2,
                    start_year: 2010,
                    end_year: 2019,
                    base_year: 2010,
                },
            ],
            pre_period: YearRange {
                start: 1995,
                end: 2000,
            },
            share_year: 1999,
            reference_year: 2019,
            trade_benchmarks: vec![1990, 2001, 2010, 2019],
            employment_benchmarks: vec![1994, 1996, 1999, 2000, 2001, 2010, 2019],
            gender_split_from: 2000,
            control_year: 2000,
            manufacturing_divisions: (10, 34),
            variants: vec![InstrumentVariant::adh(), InstrumentVariant::mixed()],
            strict_region_resolution: false,
            region_overrides: default_legacy_overrides(),
            cz_prefix_overrides: default_prefix_overrides(),
            migration_eras: default_eras(),
            migrant_filter: MigrantFilter::default(),
            census_layouts: default_census_layouts(),
            workers: num_cpus::get().min(4),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file; missing keys take defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PanelError::io(path, e))?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Find a period by index
    #[must_use]
    pub fn period(&self, index: u8) -> Option<&PeriodDefinition> {
        self.periods.iter().find(|p| p.index == index)
    }

    /// Check the invariants the exposure and panel stages rely on
    pub fn validate(&self) -> Result<()> {
        if self.periods.is_empty() {
            return Err(PanelError::Config("at least one period is required".into()));
        }
        for pair in self.periods.windows(2) {
            if pair[1].index <= pair[0].index || pair[1].start_year < pair[0].end_year {
                return Err(PanelError::Config(format!(
                    "periods {} and {} are not increasing",
                    pair[0].index, pair[1].index
                )));
            }
        }
        for period in &self.periods {
            if period.start_year >= period.end_year {
                return Err(PanelError::Config(format!(
                    "period {} starts at {} but ends at {}",
                    period.index, period.start_year, period.end_year
                )));
            }
            if self.share_year >= period.start_year {
                return Err(PanelError::Config(format!(
                    "share year {} is not before period {} ({})",
                    self.share_year, period.index, period.start_year
                )));
            }
            if period.base_year > period.start_year {
                return Err(PanelError::Config(format!(
                    "base year {} of period {} is after its start {}",
                    period.base_year, period.index, period.start_year
                )));
            }
            if !self.trade_benchmarks.contains(&period.start_year)
                || !self.trade_benchmarks.contains(&period.end_year)
            {
                return Err(PanelError::Config(format!(
                    "period {} bounds are not trade benchmark years",
                    period.index
                )));
            }
            if let Some(inner) = self
                .trade_benchmarks
                .iter()
                .find(|&&year| year > period.start_year && year < period.end_year)
            {
                return Err(PanelError::Config(format!(
                    "trade benchmark {inner} falls inside period {} ({}-{})",
                    period.index, period.start_year, period.end_year
                )));
            }
        }
        if self.pre_period.end > self.periods[0].start_year {
            return Err(PanelError::Config(
                "pre-period overlaps the first period".into(),
            ));
        }
        if self.variants.is_empty() {
            return Err(PanelError::Config("no instrument variant configured".into()));
        }
        for variant in &self.variants {
            for donors in [&variant.import_donors, &variant.export_donors] {
                if donors.is_empty() {
                    return Err(PanelError::Config(format!(
                        "variant `{}` has an empty donor set",
                        variant.name
                    )));
                }
                if donors.iter().any(|d| d == &self.reporter) {
                    return Err(PanelError::Config(format!(
                        "variant `{}` uses the reporter {} as a donor",
                        variant.name, self.reporter
                    )));
                }
            }
        }
        if self.reference_year < *self.trade_benchmarks.iter().max().unwrap_or(&0) {
            return Err(PanelError::Config(
                "reference year precedes the last trade benchmark".into(),
            ));
        }
        if self.workers == 0 {
            return Err(PanelError::Config("workers must be at least 1".into()));
        }
        Ok(())
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline Configuration:")?;
        writeln!(f, "  Raw data: {}", self.paths.raw_dir.display())?;
        writeln!(f, "  Crosswalks: {}", self.paths.crosswalk_dir.display())?;
        writeln!(f, "  Staging: {} ({:?})", self.paths.temp_dir.display(), self.staging_format)?;
        writeln!(f, "  Output: {}", self.paths.output_dir.display())?;
        writeln!(f, "  Trade: {} x {}", self.reporter, self.partner)?;
        for period in &self.periods {
            writeln!(
                f,
                "  Period {}: {}-{} (base {})",
                period.index, period.start_year, period.end_year, period.base_year
            )?;
        }
        writeln!(f, "  Share year: {}", self.share_year)?;
        writeln!(f, "  Price basis: {}", self.reference_year)?;
        let names: Vec<&str> = self.variants.iter().map(|v| v.name.as_str()).collect();
        writeln!(f, "  Instrument variants: {}", names.join(", "))?;
        write!(f, "  Strict region resolution: {}", self.strict_region_resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.variants.len(), 2);
        assert_eq!(config.period(2).map(|p| p.end_year), Some(2019));
    }

    #[test]
    fn share_year_must_precede_periods() {
        let config = PipelineConfig {
            share_year: 2001,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PanelError::Config(_))));
    }

    #[test]
    fn benchmark_inside_a_period_is_rejected() {
        let mut config = PipelineConfig::default();
        config.trade_benchmarks.push(2015);
        config.trade_benchmarks.sort_unstable();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("2015"), "{err}");
    }

    #[test]
    fn reporter_cannot_be_a_donor() {
        let mut config = PipelineConfig::default();
        config.variants[1].export_donors = vec!["KOR".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"share_year": 1996, "staging_format": "csv"}"#).unwrap();
        assert_eq!(config.share_year, 1996);
        assert_eq!(config.staging_format, StagingFormat::Csv);
        assert_eq!(config.trade_benchmarks, vec![1990, 2001, 2010, 2019]);
        assert!(config.validate().is_ok());
    }
}
