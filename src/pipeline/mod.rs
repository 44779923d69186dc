//! Batch pipeline over a filesystem staging area

pub mod context;
pub mod runner;
pub mod stage;
pub mod staging;

pub use context::{StageContext, StageOutputs};
pub use runner::{MANIFEST_FILE, PipelineRunner, RunManifest, StageReport, plan};
pub use stage::{Stage, tables};
pub use staging::StagingArea;
