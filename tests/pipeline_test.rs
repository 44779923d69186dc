//! End-to-end runs of the staged pipeline on the fixture tree

mod utils;

use migration_panel::PanelError;
use migration_panel::config::StagingFormat;
use migration_panel::models::{ControlRecord, ExposureRecord, PanelRow, Region};
use migration_panel::pipeline::{MANIFEST_FILE, PipelineRunner, Stage, tables};

use utils::{FIXTURE_PANEL_ROWS, fixture_config, fixture_regions, write_fixture};

async fn run_fixture(format: StagingFormat) -> (tempfile::TempDir, PipelineRunner) {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture(dir.path());
    let runner = PipelineRunner::new(fixture_config(dir.path(), format));
    let manifest = runner.run(&Stage::ALL).await.expect("Pipeline run failed");
    assert_eq!(manifest.stages.len(), Stage::ALL.len());
    (dir, runner)
}

#[tokio::test]
async fn test_full_run_stages_every_table() {
    let (dir, runner) = run_fixture(StagingFormat::Parquet).await;
    let staging = &runner.context().staging;

    assert!(dir.path().join("temp").join(MANIFEST_FILE).is_file());

    let regions: Vec<Region> = staging
        .read(Stage::Panel, tables::REGIONS)
        .expect("regions staged");
    assert_eq!(regions, fixture_regions());

    for variant in ["adh", "mixed"] {
        let rows: Vec<PanelRow> = staging
            .read(Stage::Analysis, &tables::panel(variant))
            .expect("panel staged");
        assert_eq!(rows.len(), FIXTURE_PANEL_ROWS);
        assert!(rows.iter().all(|r| r.origin_cz != r.destination_cz));

        let collapsed: Vec<PanelRow> = staging
            .read(Stage::Analysis, &tables::panel_cz(variant))
            .expect("zone panel staged");
        // five zones, ordered pairs, two periods
        assert_eq!(collapsed.len(), 5 * 4 * 2);

        assert!(dir.path().join(format!("output/estimates_{variant}.json")).is_file());
        assert!(dir.path().join(format!("output/descriptives_{variant}.json")).is_file());
    }

    let exposures: Vec<ExposureRecord> = staging
        .read(Stage::Panel, tables::EXPOSURE)
        .expect("exposure staged");
    assert!(exposures.iter().all(|e| e.x_import.is_finite() && e.z_export.is_finite()));

    let controls: Vec<ControlRecord> = staging
        .read(Stage::Panel, tables::CONTROLS)
        .expect("controls staged");
    let seoul = controls.iter().find(|c| c.cz == 1).expect("zone 1 controls");
    assert!(seoul.manufacturing_share.is_some());
    assert_eq!(seoul.population, Some(1000.0));

    // population and demographic files carry raw and KOSIS codes
    let rows: Vec<PanelRow> = staging
        .read(Stage::Analysis, &tables::panel("adh"))
        .expect("panel staged");
    let weight_of = |origin: &str| {
        rows.iter()
            .find(|r| r.origin == origin)
            .and_then(|r| r.population_weight)
    };
    assert_eq!(weight_of("11010"), Some(1000.0));
    assert_eq!(weight_of("31010"), Some(500.0));
}

#[tokio::test]
async fn test_panel_migration_matches_harmonised_moves() {
    let (_dir, runner) = run_fixture(StagingFormat::Parquet).await;
    let rows: Vec<PanelRow> = runner
        .context()
        .staging
        .read(Stage::Analysis, &tables::panel("adh"))
        .expect("panel staged");

    let row = |o: &str, d: &str, p: u8| {
        rows.iter()
            .find(|r| r.origin == o && r.destination == d && r.period == p)
            .map(|r| r.migration)
    };
    assert_eq!(row("11010", "26010", 1), Some(3.0));
    assert_eq!(row("11010", "26010", 2), Some(5.0));
    assert_eq!(row("29010", "11010", 1), Some(4.0));
    // same-zone pairs are not in the grid
    assert_eq!(row("31010", "31020", 2), None);
}

#[tokio::test]
async fn test_csv_staging_gives_same_panel() {
    let (_dir, runner) = run_fixture(StagingFormat::Csv).await;
    let rows: Vec<PanelRow> = runner
        .context()
        .staging
        .read(Stage::Analysis, &tables::panel("mixed"))
        .expect("panel staged");
    assert_eq!(rows.len(), FIXTURE_PANEL_ROWS);
}

#[tokio::test]
async fn test_stage_without_staged_inputs_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture(dir.path());
    let runner = PipelineRunner::new(fixture_config(dir.path(), StagingFormat::Parquet));

    let result = runner.run(&[Stage::Panel]).await;
    assert!(matches!(result, Err(PanelError::MissingStagedInput { .. })));
}

#[tokio::test]
async fn test_rerun_of_one_stage_uses_staged_inputs() {
    let (dir, runner) = run_fixture(StagingFormat::Parquet).await;
    let manifest = runner
        .run(&[Stage::Panel])
        .await
        .expect("Panel rerun failed");
    assert_eq!(manifest.stages.len(), 1);
    assert_eq!(
        manifest.stages[0].outputs.get(&tables::panel("adh")),
        Some(&FIXTURE_PANEL_ROWS)
    );
    assert!(dir.path().join("temp").join(MANIFEST_FILE).is_file());
}
