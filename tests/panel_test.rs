//! Integration tests for bilateral panel assembly

mod utils;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use migration_panel::PanelAssembler;
use migration_panel::config::PipelineConfig;
use migration_panel::models::{ControlRecord, ExposureRecord, PeriodFlow, PopulationRecord, Region};

use utils::{FIXTURE_PANEL_ROWS, assert_close, fixture_regions};

fn region(code: &str, cz: u32) -> Region {
    Region {
        code: code.to_string(),
        cz,
    }
}

fn flow(origin: &str, destination: &str, period: u8, count: f64) -> PeriodFlow {
    PeriodFlow {
        origin: origin.to_string(),
        destination: destination.to_string(),
        period,
        count,
    }
}

#[test]
fn test_three_regions_in_two_zones_give_eight_rows() {
    let config = PipelineConfig::default();
    let regions = vec![region("A", 1), region("B", 1), region("C", 2)];
    let assembler = PanelAssembler::new(&regions, &config.periods, &[], &[], &[], &[]);
    let rows = assembler.assemble("adh");

    assert_eq!(rows.len(), 8);
    assert!(rows.iter().all(|r| r.origin_cz != r.destination_cz));
    assert!(rows.iter().all(|r| r.migration == 0.0));
    assert!(rows.iter().all(|r| r.migration_log_change == Some(0.0)));
    assert!(rows.iter().all(|r| r.x_import_origin.is_none()));
}

#[test]
fn test_fixture_grid_size() {
    let config = PipelineConfig::default();
    let regions = fixture_regions();
    let assembler = PanelAssembler::new(&regions, &config.periods, &[], &[], &[], &[]);
    assert_eq!(assembler.expected_rows(), FIXTURE_PANEL_ROWS);
    assert_eq!(assembler.assemble("adh").len(), FIXTURE_PANEL_ROWS);
}

#[test]
fn test_duplicate_regions_do_not_duplicate_rows() {
    let config = PipelineConfig::default();
    let regions = vec![region("A", 1), region("C", 2), region("A", 1)];
    let assembler = PanelAssembler::new(&regions, &config.periods, &[], &[], &[], &[]);
    assert_eq!(assembler.expected_rows(), 4);
    assert_eq!(assembler.assemble("adh").len(), 4);
}

#[test]
fn test_joins_attach_zone_and_origin_attributes() {
    let config = PipelineConfig::default();
    let regions = vec![region("11010", 1), region("26010", 7)];
    let flows = vec![
        flow("11010", "26010", 0, 4.0),
        flow("11010", "26010", 1, 9.0),
        flow("11010", "26010", 2, 19.0),
    ];
    let exposures = vec![ExposureRecord {
        variant: "adh".to_string(),
        cz: 7,
        period: 1,
        x_import: 0.4,
        x_export: 0.1,
        z_import: 0.3,
        z_export: 0.05,
    }];
    let controls = vec![ControlRecord {
        cz: 1,
        manufacturing_share: Some(0.25),
        population: Some(1000.0),
        ..ControlRecord::default()
    }];
    let population = vec![PopulationRecord {
        region: "11010".to_string(),
        year: 2000,
        population: 1000.0,
    }];
    let assembler =
        PanelAssembler::new(&regions, &config.periods, &flows, &exposures, &controls, &population);
    let rows = assembler.assemble("adh");

    let first = rows
        .iter()
        .find(|r| r.origin == "11010" && r.period == 1)
        .expect("row for period 1");
    assert_close(first.migration, 9.0);
    assert_close(first.migration_log_change.unwrap_or_default(), 10f64.ln() - 5f64.ln());
    assert_eq!(first.x_import_destination, Some(0.4));
    assert!(first.x_import_origin.is_none());
    assert_eq!(first.o_manufacturing_share, Some(0.25));
    assert!(first.d_manufacturing_share.is_none());
    assert_eq!(first.population_weight, Some(1000.0));

    let second = rows
        .iter()
        .find(|r| r.origin == "11010" && r.period == 2)
        .expect("row for period 2");
    assert_close(second.migration_log_change.unwrap_or_default(), 20f64.ln() - 10f64.ln());
    assert!(second.x_import_destination.is_none());

    let reverse = rows
        .iter()
        .find(|r| r.origin == "26010")
        .expect("reverse pair");
    assert!(reverse.population_weight.is_none());
    assert_eq!(reverse.migration, 0.0);

    assert!(assembler.assemble("mixed").iter().all(|r| r.x_import_destination.is_none()));
}

#[test]
fn test_random_grids_are_complete_and_loop_free() {
    let config = PipelineConfig::default();
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..20 {
        let n = rng.random_range(2..15usize);
        let regions: Vec<Region> = (0..n)
            .map(|i| region(&format!("{:05}", 11000 + i * 10), rng.random_range(1..5u32)))
            .collect();
        let assembler = PanelAssembler::new(&regions, &config.periods, &[], &[], &[], &[]);
        let rows = assembler.assemble("adh");

        let mut expected = 0;
        for o in &regions {
            for d in &regions {
                if o.cz != d.cz {
                    expected += config.periods.len();
                }
            }
        }
        assert_eq!(rows.len(), expected);
        assert_eq!(assembler.expected_rows(), expected);
        assert!(rows.iter().all(|r| r.origin != r.destination));
        assert!(rows.windows(2).all(|w| {
            (&w[0].origin, &w[0].destination, w[0].period)
                < (&w[1].origin, &w[1].destination, w[1].period)
        }));
    }
}

#[test]
fn test_collapse_sums_members_and_weights_origins_once() {
    let config = PipelineConfig::default();
    let regions = vec![region("A", 1), region("B", 1), region("C", 2)];
    let flows = vec![
        flow("A", "C", 0, 2.0),
        flow("B", "C", 0, 3.0),
        flow("A", "C", 1, 4.0),
        flow("B", "C", 1, 1.0),
    ];
    let population = vec![
        PopulationRecord {
            region: "A".to_string(),
            year: 2000,
            population: 10.0,
        },
        PopulationRecord {
            region: "B".to_string(),
            year: 2000,
            population: 20.0,
        },
    ];
    let assembler = PanelAssembler::new(&regions, &config.periods, &flows, &[], &[], &population);
    let rows = assembler.assemble("adh");
    let collapsed = assembler.collapse_to_cz(&rows);

    assert_eq!(collapsed.len(), 4);
    let out = collapsed
        .iter()
        .find(|r| r.origin_cz == 1 && r.period == 1)
        .expect("zone 1 to zone 2, period 1");
    assert_eq!(out.origin, "1");
    assert_close(out.migration, 5.0);
    assert_close(out.migration_log_change.unwrap_or_default(), 0.0);
    assert_eq!(out.population_weight, Some(30.0));
}
