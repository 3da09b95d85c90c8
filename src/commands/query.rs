//! Query (read-only) command handlers.

use legos_config::{surface, DeviceSession, MultiColorLed, ProfileRecord, RgbMode};
use legos_transport::{DeviceDiscovery, HidDiscovery};
use serde_json::json;

use super::{emit, surface_error, CommandResult};
use crate::config::DriverConfig;

/// Show identity, firmware version and lighting state from the startup fetch
pub async fn info(session: &DeviceSession, json: bool) -> CommandResult {
    let report = match session.join_startup().await {
        Some(result) => result.map_err(surface_error)?,
        None => session.run_startup().await.map_err(surface_error)?,
    };
    let device = session.device_info();
    let led = session.led();
    let lighting = session.lighting();
    let mode = lighting.mode.and_then(RgbMode::from_u8);
    let record = lighting
        .profile
        .and_then(|p| lighting.profile_bytes(p))
        .and_then(|bytes| ProfileRecord::from_bytes(&bytes).ok());

    let value = json!({
        "device": device,
        "mcu_id": session.mcu_id().to_string(),
        "version": session.version().to_string(),
        "startup": report,
        "lighting": {
            "mode": mode,
            "profile": lighting.profile,
            "record": record,
        },
        "led": {
            "name": led.name(),
            "intensity": led.intensity(),
            "brightness": led.brightness(),
            "max_brightness": led.max_brightness(),
        },
    });
    emit(json, &value, || {
        println!(
            "Device:   {:04X}:{:04X} ({:?}, {})",
            device.vid, device.pid, device.transport_type, device.device_path
        );
        println!("MCU id:   {}", session.mcu_id());
        println!("Firmware: {}", session.version());
        match (mode, lighting.profile) {
            (Some(mode), Some(profile)) => {
                println!("Lighting: {} mode, profile {}", mode.name(), profile)
            }
            _ => println!("Lighting: unknown"),
        }
        if let Some(record) = record {
            println!(
                "  Effect: {}  Color: #{:02X}{:02X}{:02X}  Brightness: {}  Speed: {}",
                record.effect.name(),
                record.color.r,
                record.color.g,
                record.color.b,
                record.brightness,
                record.speed
            );
        }
    })
}

/// List controllers matching the configured filter
pub async fn list(config: &DriverConfig, json: bool) -> CommandResult {
    let discovery = HidDiscovery::with_filter(config.device_filter());
    let devices = discovery.list_devices().await?;
    emit(json, &devices, || {
        if devices.is_empty() {
            println!("No controllers found");
        }
        for d in &devices {
            println!(
                "{:04X}:{:04X} if={} {} {}",
                d.info.vid,
                d.info.pid,
                d.info.interface,
                d.info.product_name.as_deref().unwrap_or("-"),
                d.info.device_path
            );
        }
    })
}

/// List configuration endpoints
pub fn endpoints(json: bool) -> CommandResult {
    let list = surface::endpoints();
    emit(json, &list, || {
        for e in &list {
            let access = if e.writable { "rw" } else { "ro" };
            let path = format!("{}/{}", e.group, e.name);
            println!("{path:<26} {access}  {}", e.options);
        }
    })
}

/// Show the allowed values of one endpoint
pub fn options(group: &str, name: &str, json: bool) -> CommandResult {
    let options = surface::options(group, name).map_err(surface_error)?;
    emit(
        json,
        &json!({ "group": group, "name": name, "options": options }),
        || println!("{options}"),
    )
}

/// Read one endpoint
pub async fn get(session: &DeviceSession, group: &str, name: &str, json: bool) -> CommandResult {
    let value = session.read(group, name).await.map_err(surface_error)?;
    emit(
        json,
        &json!({ "group": group, "name": name, "value": value }),
        || println!("{value}"),
    )
}

/// Read one user lighting profile
pub async fn profile(session: &DeviceSession, profile: u8, json: bool) -> CommandResult {
    let record = session.read_profile(profile).await.map_err(surface_error)?;
    emit(json, &record, || {
        println!("Profile {profile}:");
        println!("  Effect:     {}", record.effect.name());
        println!(
            "  Color:      #{:02X}{:02X}{:02X}",
            record.color.r, record.color.g, record.color.b
        );
        println!("  Brightness: {}", record.brightness);
        println!("  Speed:      {}", record.speed);
    })
}
