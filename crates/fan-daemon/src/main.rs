//! Shower-fan controller daemon
//!
//! Loads the controller configuration, wires the state hub into the
//! controller's event stream, and runs until interrupted.

use anyhow::{Context, Result};
use fan_controller::{spawn_quiet_schedule, ControllerConfig, FanController};
use fan_hub::Hub;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_CONFIG_PATH: &str = "fan.yaml";

fn load_config(path: &str) -> Result<ControllerConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration from {path}"))?;
    let config: ControllerConfig =
        serde_yaml::from_str(&raw).with_context(|| format!("failed to parse {path}"))?;
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&path)?;

    info!(name = %config.name, fan = %config.fan, "starting shower-fan controller");

    let hub = Arc::new(Hub::new());
    let controller = FanController::new(config.clone(), hub.clone());
    let events = controller.sender();

    let _forwarder = hub.forward_changes(events.clone());
    let _schedule = config
        .quiet_hours
        .map(|hours| spawn_quiet_schedule(hours, events));

    tokio::spawn(controller.run());

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    Ok(())
}
