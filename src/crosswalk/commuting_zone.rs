//! Commuting-zone assignment
//!
//! Canonical region codes map to commuting zones through a lookup table.
//! Metropolitan and special administrative units are not in that table;
//! they are assigned by two-digit prefix, and the prefix rule always wins
//! over whatever the table says.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{PanelError, Result};
use crate::models::{CommutingZone, Region};
use crate::utils::io::delimited::{delimiter_for, read_delimited};
use crate::utils::logging::log_drop_summary;

use super::region::normalize_code;

/// Default file name inside the crosswalk directory
pub const CZ_LOOKUP_FILE: &str = "cz_lookup.csv";

/// Prefix overrides: Seoul, Busan, Daegu, Incheon, Gwangju, Daejeon,
/// Ulsan and Jeju
#[must_use]
pub fn default_prefix_overrides() -> BTreeMap<String, u32> {
    [
        ("11", 1),
        ("21", 2),
        ("22", 3),
        ("23", 4),
        ("24", 6),
        ("25", 5),
        ("26", 7),
        ("39", 33),
    ]
    .into_iter()
    .map(|(prefix, cz)| (prefix.to_string(), cz))
    .collect()
}

/// One row of the commuting-zone lookup file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CzLookupRow {
    pub code: String,
    pub cz: u32,
    #[serde(default)]
    pub label: Option<String>,
}

/// Assigns commuting zones to canonical region codes
#[derive(Debug, Clone, Default)]
pub struct CzAssigner {
    table: FxHashMap<String, u32>,
    overrides: BTreeMap<String, u32>,
    labels: BTreeMap<u32, String>,
}

impl CzAssigner {
    /// Build an assigner from lookup rows and prefix overrides
    pub fn new(
        rows: impl IntoIterator<Item = CzLookupRow>,
        overrides: &BTreeMap<String, u32>,
    ) -> Result<Self> {
        for prefix in overrides.keys() {
            if prefix.len() != 2 || !prefix.bytes().all(|b| b.is_ascii_digit()) {
                return Err(PanelError::crosswalk(
                    "cz overrides",
                    format!("override prefix `{prefix}` is not two digits"),
                ));
            }
        }

        let mut table = FxHashMap::default();
        let mut labels = BTreeMap::new();
        for row in rows {
            let code = normalize_code(&row.code).ok_or_else(|| {
                PanelError::crosswalk("cz lookup", format!("malformed code `{}`", row.code))
            })?;
            if let Some(existing) = table.insert(code.clone(), row.cz) {
                if existing != row.cz {
                    return Err(PanelError::crosswalk(
                        "cz lookup",
                        format!("code {code} assigned to zones {existing} and {}", row.cz),
                    ));
                }
            }
            if let Some(label) = row.label.filter(|l| !l.is_empty()) {
                labels.entry(row.cz).or_insert(label);
            }
        }

        Ok(Self {
            table,
            overrides: overrides.clone(),
            labels,
        })
    }

    /// Load the lookup from a delimited file with `code`, `cz` and an
    /// optional `label` column
    pub fn from_file(path: &Path, overrides: &BTreeMap<String, u32>) -> Result<Self> {
        let rows: Vec<CzLookupRow> = read_delimited(path, delimiter_for(path))?;
        Self::new(rows, overrides)
    }

    /// Commuting zone of a canonical code, if any
    #[must_use]
    pub fn assign(&self, code: &str) -> Option<u32> {
        let looked_up = self.table.get(code).copied();
        code.get(..2)
            .and_then(|prefix| self.overrides.get(prefix).copied())
            .or(looked_up)
    }

    /// Assign every distinct code; codes without a zone are dropped and
    /// counted. The result is sorted by code.
    pub fn assign_regions<I, S>(&self, codes: I) -> (Vec<Region>, usize)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = codes
            .into_iter()
            .map(|c| c.as_ref().to_string())
            .collect();
        let total = distinct.len();

        let regions: Vec<Region> = distinct
            .into_iter()
            .filter_map(|code| self.assign(&code).map(|cz| Region { code, cz }))
            .collect();
        let unmapped = total - regions.len();
        log_drop_summary("commuting zones", "no commuting zone", unmapped, total);
        (regions, unmapped)
    }

    /// Codes listed in the lookup table
    pub fn table_codes(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    /// Known zones with their labels
    #[must_use]
    pub fn commuting_zones(&self) -> Vec<CommutingZone> {
        let mut ids: BTreeSet<u32> = self.table.values().copied().collect();
        ids.extend(self.overrides.values().copied());
        ids.into_iter()
            .map(|id| CommutingZone {
                id,
                label: self.labels.get(&id).cloned().unwrap_or_default(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, cz: u32) -> CzLookupRow {
        CzLookupRow {
            code: code.into(),
            cz,
            label: None,
        }
    }

    #[test]
    fn prefix_override_beats_table_entry() {
        let assigner = CzAssigner::new(
            vec![row("11010", 99), row("31011", 8)],
            &default_prefix_overrides(),
        )
        .unwrap();
        assert_eq!(assigner.assign("11010"), Some(1));
        assert_eq!(assigner.assign("11999"), Some(1));
        assert_eq!(assigner.assign("39010"), Some(33));
        assert_eq!(assigner.assign("31011"), Some(8));
        assert_eq!(assigner.assign("31999"), None);
    }

    #[test]
    fn unmapped_codes_are_excluded() {
        let assigner =
            CzAssigner::new(vec![row("31011", 8)], &default_prefix_overrides()).unwrap();
        let (regions, unmapped) =
            assigner.assign_regions(["31011", "31011", "26010", "47999"]);
        assert_eq!(unmapped, 1);
        assert_eq!(
            regions,
            vec![
                Region {
                    code: "26010".into(),
                    cz: 7
                },
                Region {
                    code: "31011".into(),
                    cz: 8
                },
            ]
        );
    }

    #[test]
    fn conflicting_lookup_rows_fail() {
        let result = CzAssigner::new(
            vec![row("31011", 8), row("31011", 9)],
            &BTreeMap::new(),
        );
        assert!(result.is_err());
    }
}
