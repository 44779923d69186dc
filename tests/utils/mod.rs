//! Shared fixtures for the integration tests
//!
//! `write_fixture` lays out a small but complete raw data tree: six
//! canonical regions in five commuting zones, four census years in three
//! KSIC revisions, four migration years in all three file layouts, and
//! trade for the reporter and two donor countries.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use migration_panel::PipelineConfig;
use migration_panel::config::{DataPaths, StagingFormat};
use migration_panel::models::{EmploymentRecord, MigrationRecord, Region};

/// Write `contents` to `root/relative`, creating directories
pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    fs::write(&path, contents).expect("Failed to write fixture file");
}

/// Configuration pointing at a fixture tree under `root`
#[must_use]
pub fn fixture_config(root: &Path, format: StagingFormat) -> PipelineConfig {
    PipelineConfig {
        paths: DataPaths::under(root),
        staging_format: format,
        workers: 2,
        ..PipelineConfig::default()
    }
}

/// Canonical regions of the fixture
#[must_use]
pub fn fixture_regions() -> Vec<Region> {
    [
        ("11010", 1),
        ("26010", 7),
        ("29010", 12),
        ("31010", 10),
        ("31020", 10),
        ("32010", 11),
    ]
    .into_iter()
    .map(|(code, cz)| Region {
        code: code.to_string(),
        cz,
    })
    .collect()
}

/// Ordered region pairs in different zones, times two periods
pub const FIXTURE_PANEL_ROWS: usize = 28 * 2;

pub fn write_crosswalks(root: &Path) {
    let dir = "crosswalk";
    write_file(root, &format!("{dir}/kosis_stat.csv"), "from,to\n31011,31010\n");
    write_file(root, &format!("{dir}/stat_change.csv"), "from,to\n32015,32010\n");
    write_file(
        root,
        &format!("{dir}/cz_lookup.csv"),
        "code,cz,label\n31010,10,Suwon\n31020,10,Suwon\n32010,11,Chuncheon\n29010,12,Sejong\n",
    );
    write_file(
        root,
        &format!("{dir}/hs_isic.csv"),
        "from,to,weight\n0301,C10,1.0\n5208,C13,0.5\n5208,C10,0.5\n",
    );
    write_file(root, &format!("{dir}/isic_ksic.csv"), "from,to\nC10,C10\nC13,C13\n");
    write_file(
        root,
        &format!("{dir}/ksic8_ksic9.csv"),
        "from,to\nC15,C10\nC17,C13\nG51,G46\n",
    );
    write_file(
        root,
        &format!("{dir}/ksic9_ksic10.csv"),
        "from,to\nC10,C10\nC13,C13\nG46,G46\n",
    );
}

pub fn write_census(root: &Path) {
    write_file(
        root,
        "raw/census/establishment_1999.csv",
        "sido,sigungu,ksic,workers\n\
         11,10,C15,60\n11,10,G51,40\n\
         26,10,C17,30\n26,10,G51,70\n\
         31,11,C15,50\n31,20,G51,50\n\
         32,15,C17,20\n34,390,C15,10\n",
    );
    for year in [2000, 2001] {
        write_file(
            root,
            &format!("raw/census/establishment_{year}.csv"),
            "region_code,ksic,workers,male_workers,female_workers\n\
             11010,C15,70,40,30\n11010,G51,50,20,30\n\
             26010,C17,40,10,30\n26010,G51,60,30,30\n\
             31011,C15,55,30,25\n31020,G51,45,25,20\n\
             32015,C17,25,15,10\n34390,C15,12,6,6\n",
        );
    }
    write_file(
        root,
        "raw/census/establishment_2010.csv",
        "admin_code,industry_code,total_workers,male_workers,female_workers\n\
         11010,C10,90,50,40\n11010,G46,80,40,40\n\
         26010,C13,35,15,20\n26010,G46,75,35,40\n\
         31010,C10,65,35,30\n31020,G46,55,30,25\n\
         32010,C13,30,15,15\n29010,C10,25,15,10\n",
    );
}

pub fn write_migration(root: &Path) {
    let split = "pre_sido,pre_sigungu,cur_sido,cur_sigungu\n\
                 11,10,26,10\n11,10,31,11\n26,10,11,10\n32,15,11,10\n11,10,11,10\n";
    write_file(root, "raw/migration/migration_1995.csv", split);
    write_file(root, "raw/migration/migration_2000.csv", split);
    write_file(
        root,
        "raw/migration/migration_2005.csv",
        "pre_addr_code,cur_addr_code,movers\n\
         1101053,2601010,3\n1101053,3101152,2\n3201555,1101053,1\n3439011,1101053,4\n",
    );
    write_file(
        root,
        "raw/migration/migration_2012.csv",
        "pre_addr_code,cur_addr_code,movers,age,sex,hh_size,reason\n\
         1101053,2601010,5,31,1,2,job\n2901011,1101053,2,45,2,1,family\n\
         3101052,3102052,7,28,1,1,housing\n",
    );
}

pub fn write_trade(root: &Path) {
    let mut csv = String::from("reporter,partner,flow,code,year,value\n");
    let series = [
        ("KOR", "import", [100_000.0, 400_000.0, 900_000.0, 1_200_000.0]),
        ("KOR", "export", [50_000.0, 300_000.0, 800_000.0, 1_000_000.0]),
        ("AUS", "import", [10_000.0, 20_000.0, 60_000.0, 90_000.0]),
        ("DEU", "export", [20_000.0, 30_000.0, 50_000.0, 80_000.0]),
        ("JPN", "export", [70_000.0, 90_000.0, 150_000.0, 200_000.0]),
    ];
    for (reporter, flow, values) in series {
        for (year, value) in [1990, 2001, 2010, 2019].into_iter().zip(values) {
            for code in ["0301", "5208"] {
                csv.push_str(&format!("{reporter},CHN,{flow},{code},{year},{value}\n"));
            }
        }
    }
    csv.push_str("KOR,USA,import,0301,2010,999999\n");
    write_file(root, "raw/trade/trade.csv", &csv);

    let mut deflator = String::from("year,ratio\n");
    for year in 1991..=2019 {
        deflator.push_str(&format!("{year},1.0\n"));
    }
    write_file(root, "raw/deflator.csv", &deflator);
}

pub fn write_population(root: &Path) {
    write_file(
        root,
        "raw/population.csv",
        "region,year,population\n1101,2000,1000\n26010,2000,800\n31011,2000,500\n\
         31020,2000,400\n32010,2000,300\n29010,2000,100\n11010,2010,1100\n",
    );
    write_file(
        root,
        "raw/demographics.csv",
        "region,year,population,college_educated,foreign_born\n\
         1101053,2000,1000,300,20\n26010,2000,800,160,\n31010,2000,500,100,5\n\
         31020,2000,400,60,4\n32010,2000,300,30,1\n29010,2000,0,0,0\n",
    );
}

/// Lay out the full raw fixture tree under `root`
pub fn write_fixture(root: &Path) {
    write_crosswalks(root);
    write_census(root);
    write_migration(root);
    write_trade(root);
    write_population(root);
}

/// An employment record with gender split
#[must_use]
pub fn employment(region: &str, industry: &str, year: i32, total: f64) -> EmploymentRecord {
    EmploymentRecord::new(region, industry, year, total).with_gender(total / 2.0, total / 2.0)
}

/// A single-person move
#[must_use]
pub fn move_record(origin: &str, destination: &str, year: i32) -> MigrationRecord {
    MigrationRecord::new(origin, destination, year)
}

/// Assert two floats agree within `1e-9`
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
