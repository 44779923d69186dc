//! Integration tests for migration harmonisation and aggregation

mod utils;

use migration_panel::PipelineConfig;
use migration_panel::crosswalk::RegionResolver;
use migration_panel::migration::{
    MigrantFilter, MigrationHarmonizer, aggregate_by_period, aggregate_by_year, harmonize,
};
use migration_panel::models::Gender;

use utils::{assert_close, move_record, write_crosswalks, write_migration};

fn fixture_resolver(root: &std::path::Path) -> RegionResolver {
    let config = PipelineConfig::default();
    RegionResolver::from_dir(&root.join("crosswalk"), &config.region_overrides)
        .expect("Failed to load region lookups")
}

#[test]
fn test_harmonizer_reads_all_three_layouts() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_crosswalks(dir.path());
    write_migration(dir.path());
    let resolver = fixture_resolver(dir.path());
    let config = PipelineConfig::default();

    let out = MigrationHarmonizer::new(&config.migration_eras, &resolver)
        .run(&dir.path().join("raw/migration"))
        .expect("Failed to harmonise migration");

    assert_eq!(out.missing_years.len(), 25 - 4);
    assert!(out.flows.iter().all(|f| f.origin != f.destination));
    assert!(out.flows.iter().all(|f| f.origin.len() == 5 && f.destination.len() == 5));
    assert_eq!(out.stats.same_region, 2);

    let legacy = out
        .flows
        .iter()
        .find(|f| f.origin == "29010" && f.year == 2005)
        .expect("legacy code resolved through override");
    assert_close(legacy.count, 4.0);

    let total: f64 = out.flows.iter().map(|f| f.count).sum();
    // 4 kept split rows in each of two years, 10 joined movers, 14 attributed movers
    assert_close(total, 8.0 + 10.0 + 14.0);
}

#[test]
fn test_period_aggregation_matches_yearly_totals() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_crosswalks(dir.path());
    write_migration(dir.path());
    let resolver = fixture_resolver(dir.path());
    let config = PipelineConfig::default();

    let out = MigrationHarmonizer::new(&config.migration_eras, &resolver)
        .run(&dir.path().join("raw/migration"))
        .expect("Failed to harmonise migration");
    let periods = aggregate_by_period(&out.flows, &config.periods, &config.pre_period);

    let sum_in = |p: u8| -> f64 { periods.iter().filter(|f| f.period == p).map(|f| f.count).sum() };
    assert_close(sum_in(0), 8.0);
    assert_close(sum_in(1), 10.0);
    assert_close(sum_in(2), 14.0);
}

#[test]
fn test_filtered_subset_only_counts_matching_movers() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_crosswalks(dir.path());
    let resolver = fixture_resolver(dir.path());

    let mut young = move_record("11010", "26010", 2012);
    young.age = Some(25);
    young.gender = Some(Gender::Female);
    let mut old = young.clone();
    old.age = Some(70);
    let unknown = move_record("11010", "26010", 2012);

    let filter = MigrantFilter {
        min_age: Some(20),
        max_age: Some(34),
        gender: None,
    };
    let (kept, stats) = harmonize(vec![young, old, unknown], &resolver, &filter);

    assert_eq!(kept.len(), 1);
    assert_eq!(stats.filtered, 2);
    let flows = aggregate_by_year(&kept);
    assert_eq!(flows.len(), 1);
    assert_close(flows[0].count, 1.0);
}
