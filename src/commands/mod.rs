//! Command handlers for the CLI application.
//!
//! - `query`: read-only commands (info, list, endpoints, get, options, profile)
//! - `set`: commands that write to the controller (set, brightness, color)

pub mod query;
pub mod set;

use std::sync::Arc;

use anyhow::{anyhow, Context};
use legos_config::{ConfigError, DeviceSession, LightDevice};
use legos_transport::{DeviceDiscovery, HidDiscovery, SimulatedMcu, Transport};
use tracing::info;

use crate::config::DriverConfig;

/// Result type for command handlers
pub type CommandResult = anyhow::Result<()>;

/// Tag a session error with its category for the user
pub fn surface_error(e: ConfigError) -> anyhow::Error {
    anyhow!("{} error: {}", e.category().as_str(), e)
}

/// Open the first matching controller (or the simulator) and attach a session
pub async fn open_session(
    config: &DriverConfig,
    simulate: bool,
    fetch_on_attach: bool,
) -> anyhow::Result<DeviceSession> {
    let transport: Arc<dyn Transport> = if simulate {
        info!("Using simulated MCU");
        Arc::new(SimulatedMcu::new())
    } else {
        let discovery = HidDiscovery::with_filter(config.device_filter());
        let devices = discovery.list_devices().await?;
        let device = devices.first().ok_or_else(|| {
            anyhow!(
                "No controller found (VID {:04X}, interface {})",
                config.device.vendor_id,
                config.device.interface
            )
        })?;
        discovery
            .open_device(device)
            .await
            .context("open controller")?
    };

    Ok(DeviceSession::attach(
        transport,
        Arc::new(LightDevice::default()),
        config.session_config(fetch_on_attach),
    ))
}

/// Print a value as JSON or with the text formatter
pub fn emit<T: serde::Serialize>(json: bool, value: &T, text: impl FnOnce()) -> CommandResult {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        text();
    }
    Ok(())
}
