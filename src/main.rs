use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;
use migration_panel::{PipelineConfig, PipelineRunner, Stage};

/// Build the trade-shock migration panel from raw inputs
#[derive(Debug, Parser)]
#[command(name = "migration-panel", version, about)]
struct Cli {
    /// JSON configuration file; defaults apply to missing keys
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stage to run (repeatable); all stages when omitted
    #[arg(short, long = "stage", value_name = "NAME")]
    stages: Vec<String>,

    /// List stages with their inputs and outputs, then exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => {
            let config = PipelineConfig::default();
            config.validate()?;
            config
        }
    };

    if cli.list {
        for stage in Stage::ALL {
            let deps: Vec<&str> = stage.dependencies().iter().map(|d| d.name()).collect();
            println!("{stage}");
            println!("  after:   {}", deps.join(", "));
            println!("  reads:   {}", stage.inputs(&config).join(", "));
            println!("  writes:  {}", stage.outputs(&config).join(", "));
        }
        return Ok(());
    }

    let targets: Vec<Stage> = if cli.stages.is_empty() {
        Stage::ALL.to_vec()
    } else {
        cli.stages
            .iter()
            .map(|s| s.parse::<Stage>())
            .collect::<Result<_, _>>()?
    };

    info!("{config}");
    let runner = PipelineRunner::new(config);
    let manifest = runner.run(&targets).await?;
    for report in &manifest.stages {
        let rows: usize = report.outputs.values().sum();
        info!(
            "{}: {} outputs, {rows} rows, {} ms",
            report.stage,
            report.outputs.len(),
            report.elapsed_ms
        );
    }
    Ok(())
}
