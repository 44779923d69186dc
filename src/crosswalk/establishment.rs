//! Establishment census loading and region harmonisation
//!
//! The seven census years use different column layouts. Each year is
//! described by a `CensusLayout`; one loader handles all of them and
//! resolves every record's region through the `RegionResolver`.

use std::collections::BTreeMap;
use std::path::Path;

use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::EmploymentRecord;
use crate::utils::io::delimited::{ColumnIndex, field, numeric_field, open_reader};
use crate::utils::logging::log_drop_summary;
use crate::utils::numeric::add_skipna;

use super::region::{RegionResolver, ResolutionStats};

/// Where a file keeps its region code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegionColumns {
    /// A single code column
    Single { column: String },
    /// Two-digit province and three-digit district in separate columns
    Split { province: String, district: String },
}

/// Column positions of a `RegionColumns` in one file
#[derive(Debug, Clone, Copy)]
pub enum RegionIndices {
    Single(usize),
    Split(usize, usize),
}

impl RegionColumns {
    pub fn locate(&self, index: &ColumnIndex) -> Result<RegionIndices> {
        Ok(match self {
            Self::Single { column } => RegionIndices::Single(index.require(column)?),
            Self::Split { province, district } => {
                RegionIndices::Split(index.require(province)?, index.require(district)?)
            }
        })
    }
}

impl RegionIndices {
    /// Raw region code of a record. Split parts are left-padded with zeros
    /// to two and three digits before being joined.
    #[must_use]
    pub fn raw_code(self, record: &StringRecord) -> Option<String> {
        match self {
            Self::Single(i) => field(record, i).map(str::to_string),
            Self::Split(p, d) => {
                let province = field(record, p)?;
                let district = field(record, d)?;
                Some(format!("{province:0>2}{district:0>3}"))
            }
        }
    }
}

/// Column layout of one establishment census year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusLayout {
    pub year: i32,
    /// File name inside `raw/census`
    pub file: String,
    pub region: RegionColumns,
    pub industry: String,
    pub employment: String,
    #[serde(default)]
    pub male: Option<String>,
    #[serde(default)]
    pub female: Option<String>,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_delimiter() -> char {
    ','
}

/// Layouts of the 1994-2019 benchmark censuses
#[must_use]
pub fn default_census_layouts() -> Vec<CensusLayout> {
    let split = |year: i32| CensusLayout {
        year,
        file: format!("establishment_{year}.csv"),
        region: RegionColumns::Split {
            province: "sido".into(),
            district: "sigungu".into(),
        },
        industry: "ksic".into(),
        employment: "workers".into(),
        male: None,
        female: None,
        delimiter: ',',
    };
    let joined = |year: i32, region: &str, industry: &str, employment: &str| CensusLayout {
        year,
        file: format!("establishment_{year}.csv"),
        region: RegionColumns::Single {
            column: region.into(),
        },
        industry: industry.into(),
        employment: employment.into(),
        male: Some("male_workers".into()),
        female: Some("female_workers".into()),
        delimiter: ',',
    };

    vec![
        split(1994),
        split(1996),
        split(1999),
        joined(2000, "region_code", "ksic", "workers"),
        joined(2001, "region_code", "ksic", "workers"),
        joined(2010, "admin_code", "industry_code", "total_workers"),
        joined(2019, "admin_code", "industry_code", "total_workers"),
    ]
}

/// Records of one census year and what was dropped on the way
#[derive(Debug, Clone, Default)]
pub struct CensusLoad {
    pub records: Vec<EmploymentRecord>,
    pub regions: ResolutionStats,
    pub missing_industry: usize,
}

/// Load one census year, resolve regions and sum establishments into
/// (region, industry) cells.
///
/// Gender columns are read only from `gender_split_from` on; earlier years
/// carry `None`.
///
/// # Arguments
/// * `layout` - Column layout of the census year
/// * `path` - The year's file
/// * `resolver` - Resolver for the region codes
/// * `gender_split_from` - First year whose files carry gender columns
///
/// # Returns
/// The summed cells with the region resolution counters
pub fn load_census_year(
    layout: &CensusLayout,
    path: &Path,
    resolver: &RegionResolver,
    gender_split_from: i32,
) -> Result<CensusLoad> {
    let mut reader = open_reader(path, layout.delimiter as u8)?;
    let index = ColumnIndex::new(reader.headers()?.clone(), path);
    let region = layout.region.locate(&index)?;
    let industry = index.require(&layout.industry)?;
    let employment = index.require(&layout.employment)?;
    let (male, female) = if layout.year >= gender_split_from {
        (
            index.optional(layout.male.as_deref())?,
            index.optional(layout.female.as_deref())?,
        )
    } else {
        (None, None)
    };

    let mut cells: BTreeMap<(String, String), EmploymentRecord> = BTreeMap::new();
    let mut stats = ResolutionStats::default();
    let mut missing_industry = 0;

    for row in reader.records() {
        let row = row?;
        let raw = region.raw_code(&row).unwrap_or_default();
        let Some(code) = resolver.resolve_counted(&raw, &mut stats) else {
            continue;
        };
        let Some(industry) = field(&row, industry) else {
            missing_industry += 1;
            continue;
        };

        let incoming = EmploymentRecord {
            region: code.clone(),
            industry: industry.to_string(),
            year: layout.year,
            employment: numeric_field(&row, employment),
            male: male.and_then(|i| numeric_field(&row, i)),
            female: female.and_then(|i| numeric_field(&row, i)),
        };
        match cells.get_mut(&(code.clone(), incoming.industry.clone())) {
            Some(cell) => {
                add_skipna(&mut cell.employment, incoming.employment);
                add_skipna(&mut cell.male, incoming.male);
                add_skipna(&mut cell.female, incoming.female);
            }
            None => {
                cells.insert((code, incoming.industry.clone()), incoming);
            }
        }
    }

    let step = format!("census {}", layout.year);
    log_drop_summary(&step, "unresolved region code", stats.dropped(), stats.total);
    log_drop_summary(&step, "missing industry code", missing_industry, stats.resolved);

    Ok(CensusLoad {
        records: cells.into_values().collect(),
        regions: stats,
        missing_industry,
    })
}
