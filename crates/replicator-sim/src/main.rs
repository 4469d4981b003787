//! Runs a single replicator world and prints its summary as JSON.

mod telemetry;

use anyhow::{Context, Result};
use replicator_core::SimulationConfig;
use replicator_world::{RunSummary, SuccessMetric, World};
use std::path::PathBuf;
use tracing::info;

fn main() -> Result<()> {
    telemetry::init_telemetry()?;

    let config = load_config()?;
    let metric = success_metric()?;

    info!(
        "Starting replicator world {}x{} with {} founders",
        config.width, config.height, config.founders
    );

    let mut world = World::new(config)?;
    let records = world.run();

    let summary = RunSummary::from_world(&world, metric);
    info!(
        ticks = records.len(),
        top_lineage = ?summary.top_lineage,
        "Run complete"
    );

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Config file from the first argument or `REPLICATOR_CONFIG`, else defaults.
fn load_config() -> Result<SimulationConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("REPLICATOR_CONFIG").ok())
        .map(PathBuf::from);

    match path {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            let config = serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => Ok(SimulationConfig::default()),
    }
}

fn success_metric() -> Result<SuccessMetric> {
    match std::env::var("REPLICATOR_SUCCESS") {
        Ok(name) => serde_json::from_value(serde_json::Value::String(name))
            .context("REPLICATOR_SUCCESS must be final_alive or total_births"),
        Err(_) => Ok(SuccessMetric::default()),
    }
}
