//! Schema eras of the internal migration microdata
//!
//! Twenty-five years of files fall into three layouts. Each era is a year
//! range plus a tagged layout; one loader reads all of them.

use serde::{Deserialize, Serialize};

/// Column layout of one era
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EraLayout {
    /// Province and district of each side in separate columns
    SplitCodes {
        origin_province: String,
        origin_district: String,
        destination_province: String,
        destination_district: String,
        #[serde(default)]
        persons: Option<String>,
    },
    /// One code column per side
    JoinedCodes {
        origin: String,
        destination: String,
        #[serde(default)]
        persons: Option<String>,
    },
    /// One code column per side plus mover attributes
    Attributed {
        origin: String,
        destination: String,
        #[serde(default)]
        persons: Option<String>,
        #[serde(default)]
        age: Option<String>,
        #[serde(default)]
        gender: Option<String>,
        #[serde(default)]
        household_size: Option<String>,
        #[serde(default)]
        reason: Option<String>,
    },
}

/// A run of years sharing one layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationEra {
    pub name: String,
    pub start_year: i32,
    pub end_year: i32,
    pub layout: EraLayout,
    /// File name with a `{year}` placeholder, inside `raw/migration`
    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_file_pattern() -> String {
    "migration_{year}.csv".to_string()
}

fn default_delimiter() -> char {
    ','
}

impl MigrationEra {
    #[must_use]
    pub fn contains(&self, year: i32) -> bool {
        (self.start_year..=self.end_year).contains(&year)
    }

    #[must_use]
    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    /// File name of one year
    #[must_use]
    pub fn file_for(&self, year: i32) -> String {
        self.file_pattern.replace("{year}", &year.to_string())
    }
}

/// The era a year belongs to
#[must_use]
pub fn era_for_year(eras: &[MigrationEra], year: i32) -> Option<&MigrationEra> {
    eras.iter().find(|era| era.contains(year))
}

/// Eras of the 1995-2019 microdata
#[must_use]
pub fn default_eras() -> Vec<MigrationEra> {
    vec![
        MigrationEra {
            name: "split".into(),
            start_year: 1995,
            end_year: 2000,
            layout: EraLayout::SplitCodes {
                origin_province: "pre_sido".into(),
                origin_district: "pre_sigungu".into(),
                destination_province: "cur_sido".into(),
                destination_district: "cur_sigungu".into(),
                persons: None,
            },
            file_pattern: default_file_pattern(),
            delimiter: ',',
        },
        MigrationEra {
            name: "joined".into(),
            start_year: 2001,
            end_year: 2007,
            layout: EraLayout::JoinedCodes {
                origin: "pre_addr_code".into(),
                destination: "cur_addr_code".into(),
                persons: Some("movers".into()),
            },
            file_pattern: default_file_pattern(),
            delimiter: ',',
        },
        MigrationEra {
            name: "attributed".into(),
            start_year: 2008,
            end_year: 2019,
            layout: EraLayout::Attributed {
                origin: "pre_addr_code".into(),
                destination: "cur_addr_code".into(),
                persons: Some("movers".into()),
                age: Some("age".into()),
                gender: Some("sex".into()),
                household_size: Some("hh_size".into()),
                reason: Some("reason".into()),
            },
            file_pattern: default_file_pattern(),
            delimiter: ',',
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_eras_cover_every_year_once() {
        let eras = default_eras();
        for year in 1995..=2019 {
            let matching = eras.iter().filter(|e| e.contains(year)).count();
            assert_eq!(matching, 1, "year {year}");
        }
        assert!(era_for_year(&eras, 1994).is_none());
        assert_eq!(era_for_year(&eras, 2003).map(|e| e.name.as_str()), Some("joined"));
    }

    #[test]
    fn layouts_deserialize_from_tagged_json() {
        let era: MigrationEra = serde_json::from_str(
            r#"{"name": "x", "start_year": 2001, "end_year": 2002,
                "layout": {"kind": "joined_codes", "origin": "o", "destination": "d"}}"#,
        )
        .unwrap();
        assert_eq!(era.file_for(2002), "migration_2002.csv");
        assert!(matches!(era.layout, EraLayout::JoinedCodes { persons: None, .. }));
    }
}
