//! Setting command handlers.

use anyhow::anyhow;
use legos_config::{DeviceSession, MultiColorLed, RgbColor};

use super::{surface_error, CommandResult};

/// Write one endpoint
pub async fn set(session: &DeviceSession, group: &str, name: &str, value: &str) -> CommandResult {
    await_startup(session).await?;
    session
        .write(group, name, value)
        .await
        .map_err(surface_error)?;
    println!("{group}/{name} = {}", value.trim());
    Ok(())
}

/// Wait for the startup fetch so the lighting mode is cached
async fn await_startup(session: &DeviceSession) -> CommandResult {
    if let Some(result) = session.join_startup().await {
        result.map_err(surface_error)?;
    }
    Ok(())
}

/// Set ring brightness on the active profile
pub async fn brightness(session: &DeviceSession, value: u8) -> CommandResult {
    await_startup(session).await?;
    session.set_brightness(value).await.map_err(surface_error)?;
    println!(
        "Brightness: {}/{}",
        session.led().brightness(),
        session.led().max_brightness()
    );
    Ok(())
}

/// Set ring color on the active profile
pub async fn color(session: &DeviceSession, hex: &str) -> CommandResult {
    let color = RgbColor::from_hex(hex).ok_or_else(|| anyhow!("invalid color '{hex}', expected RRGGBB"))?;
    await_startup(session).await?;
    session.set_color(color).await.map_err(surface_error)?;
    println!("Color: #{:02X}{:02X}{:02X}", color.r, color.g, color.b);
    Ok(())
}
