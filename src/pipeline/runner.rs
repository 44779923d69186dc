//! Staged execution with concurrent independent stages
//!
//! Requested stages are grouped into waves: a stage joins the first wave
//! after every requested stage it depends on. Stages of one wave run on
//! the blocking pool at the same time, at most `workers` at once. A stage
//! that was not requested is assumed to have staged its outputs earlier.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::{PanelError, Result};
use crate::utils::logging::{create_main_progress_bar, finish_progress_bar};

use super::context::{StageContext, StageOutputs, write_json};
use super::stage::Stage;

/// Manifest file written to the staging directory after a run
pub const MANIFEST_FILE: &str = "manifest.json";

/// Outcome of one stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    pub outputs: StageOutputs,
    pub elapsed_ms: u64,
    pub finished_at: DateTime<Utc>,
}

/// Record of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stages: Vec<StageReport>,
}

/// Group `targets` into waves that respect their dependencies
#[must_use]
pub fn plan(targets: &[Stage]) -> Vec<Vec<Stage>> {
    let requested: BTreeSet<Stage> = targets.iter().copied().collect();
    let mut done: BTreeSet<Stage> = BTreeSet::new();
    let mut waves = Vec::new();

    while done.len() < requested.len() {
        let wave: Vec<Stage> = requested
            .iter()
            .copied()
            .filter(|s| !done.contains(s))
            .filter(|s| {
                s.dependencies()
                    .iter()
                    .all(|d| !requested.contains(d) || done.contains(d))
            })
            .collect();
        done.extend(wave.iter().copied());
        waves.push(wave);
    }
    waves
}

pub struct PipelineRunner {
    context: StageContext,
    workers: usize,
}

impl PipelineRunner {
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        let workers = config.workers.max(1);
        Self {
            context: StageContext::new(Arc::new(config)),
            workers,
        }
    }

    #[must_use]
    pub fn context(&self) -> &StageContext {
        &self.context
    }

    async fn run_stage(context: StageContext, stage: Stage) -> Result<StageReport> {
        let start = Instant::now();
        let outputs = tokio::task::spawn_blocking(move || context.run(stage))
            .await
            .map_err(|e| PanelError::Stage {
                stage: stage.name().to_string(),
                message: format!("task join error: {e}"),
            })??;
        let elapsed = start.elapsed();
        info!("Stage {stage} finished in {elapsed:?}");
        Ok(StageReport {
            stage,
            outputs,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            finished_at: Utc::now(),
        })
    }

    /// Run `targets` and write the run manifest
    pub async fn run(&self, targets: &[Stage]) -> Result<RunManifest> {
        let started_at = Utc::now();
        let waves = plan(targets);
        let pb = create_main_progress_bar(targets.len() as u64, Some("Running stages"));
        let mut stages = Vec::new();

        for wave in waves {
            for batch in wave.chunks(self.workers) {
                let names: Vec<&str> = batch.iter().map(|s| s.name()).collect();
                pb.set_message(names.join(", "));
                let reports = try_join_all(
                    batch
                        .iter()
                        .map(|&stage| Self::run_stage(self.context.clone(), stage)),
                )
                .await?;
                pb.inc(reports.len() as u64);
                stages.extend(reports);
            }
        }
        finish_progress_bar(&pb, Some("Pipeline complete"));

        let manifest = RunManifest {
            started_at,
            finished_at: Utc::now(),
            stages,
        };
        write_json(&self.context.staging.dir().join(MANIFEST_FILE), &manifest)?;
        Ok(manifest)
    }
}
