//! RGB profile compositor
//!
//! The MCU stores three user lighting profiles of six bytes each and only
//! accepts whole-profile writes, so every edit re-sends the full record built
//! from the cached profile.

use legos_transport::protocol::{cmd, light_cfg};
use legos_transport::single_value_args;
use tracing::{debug, error};

use crate::error::ConfigError;
use crate::led::{ProfileRecord, RgbColor, RgbEffect, RgbMode, SPEED_MAX};
use crate::session::DeviceSession;

fn profile_index(profile: u8) -> Result<u8, ConfigError> {
    light_cfg::user_profile_index(profile).ok_or_else(|| {
        ConfigError::InvalidParameter(format!(
            "profile {} outside 1-{}",
            profile,
            light_cfg::USER_PROFILE_COUNT
        ))
    })
}

impl DeviceSession {
    // === Mode and profile selection ===

    pub async fn get_rgb_mode(&self) -> Result<RgbMode, ConfigError> {
        let reply = self
            .call(cmd::GET_LIGHT_CFG, light_cfg::MODE_SEL, &[])
            .await?
            .answered()?;
        RgbMode::from_u8(reply.value).ok_or_else(|| {
            ConfigError::UnexpectedResponse(format!("unknown RGB mode {}", reply.value))
        })
    }

    pub async fn set_rgb_mode(&self, mode: RgbMode) -> Result<(), ConfigError> {
        self.call(cmd::SET_LIGHT_CFG, light_cfg::MODE_SEL, &single_value_args(mode as u8))
            .await?;
        Ok(())
    }

    /// Active user profile (1-3)
    pub async fn get_rgb_profile(&self) -> Result<u8, ConfigError> {
        let reply = self
            .call(cmd::GET_LIGHT_CFG, light_cfg::PROFILE_SEL, &[])
            .await?
            .answered()?;
        profile_index(reply.value)
            .map(|_| reply.value)
            .map_err(|_| ConfigError::UnexpectedResponse(format!("unknown profile {}", reply.value)))
    }

    pub async fn set_rgb_profile(&self, profile: u8) -> Result<(), ConfigError> {
        profile_index(profile)?;
        self.call(cmd::SET_LIGHT_CFG, light_cfg::PROFILE_SEL, &single_value_args(profile))
            .await?;
        Ok(())
    }

    // === Profile records ===

    /// Read a user profile; reading the active profile refreshes the LED
    pub async fn read_profile(&self, profile: u8) -> Result<ProfileRecord, ConfigError> {
        let index = profile_index(profile)?;
        let reply = self.call(cmd::GET_LIGHT_CFG, index, &[]).await?.answered()?;
        let bytes = reply.profile.ok_or_else(|| {
            ConfigError::UnexpectedResponse(format!("no payload for profile {profile}"))
        })?;
        let record = ProfileRecord::from_bytes(&bytes)?;

        let active = self.lighting().profile;
        if active.is_none() || active == Some(profile) {
            self.led().update(record.color, record.brightness);
        }
        Ok(record)
    }

    /// Write a whole user profile
    pub async fn write_profile(&self, profile: u8, record: &ProfileRecord) -> Result<(), ConfigError> {
        let index = profile_index(profile)?;
        if record.speed > SPEED_MAX {
            return Err(ConfigError::InvalidParameter(format!(
                "speed {} outside 0-{}",
                record.speed, SPEED_MAX
            )));
        }
        let max = self.led().max_brightness();
        if record.brightness > max {
            return Err(ConfigError::InvalidParameter(format!(
                "brightness {} outside 0-{}",
                record.brightness, max
            )));
        }
        debug!("Writing profile {}: {:?}", profile, record);
        self.call(cmd::SET_LIGHT_CFG, index, &record.to_bytes())
            .await?;
        Ok(())
    }

    // === Cached lighting state ===

    async fn current_profile(&self) -> Result<u8, ConfigError> {
        match self.lighting().profile.filter(|p| profile_index(*p).is_ok()) {
            Some(profile) => Ok(profile),
            None => self.get_rgb_profile().await,
        }
    }

    /// Edit the active profile and write it back.
    ///
    /// Only allowed when the cached lighting mode is custom; an unknown mode
    /// is rejected without touching the device.
    async fn store_active_profile<F>(&self, edit: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut ProfileRecord),
    {
        match self.lighting().mode.and_then(RgbMode::from_u8) {
            Some(RgbMode::Custom) => {}
            Some(mode) => {
                return Err(ConfigError::InvalidParameter(format!(
                    "lighting mode is {}, profile edits need custom",
                    mode.name()
                )))
            }
            None => {
                return Err(ConfigError::InvalidParameter(
                    "lighting mode not known yet, profile edits need custom".to_string(),
                ))
            }
        }

        let profile = self.current_profile().await?;
        let mut record = match self.lighting().profile_bytes(profile) {
            Some(bytes) => ProfileRecord::from_bytes(&bytes)?,
            None => self.read_profile(profile).await?,
        };
        edit(&mut record);

        if let Err(e) = self.write_profile(profile, &record).await {
            error!("Failed to write lighting profile {}: {}", profile, e);
            return Err(e);
        }
        self.led().update(record.color, record.brightness);
        Ok(())
    }

    // === Active profile fields ===

    pub async fn get_rgb_effect(&self) -> Result<RgbEffect, ConfigError> {
        let profile = self.current_profile().await?;
        Ok(self.read_profile(profile).await?.effect)
    }

    pub async fn set_rgb_effect(&self, effect: RgbEffect) -> Result<(), ConfigError> {
        self.store_active_profile(|record| record.effect = effect)
            .await
    }

    pub async fn get_rgb_speed(&self) -> Result<u8, ConfigError> {
        let profile = self.current_profile().await?;
        let speed = self.read_profile(profile).await?.speed;
        if speed > SPEED_MAX {
            return Err(ConfigError::UnexpectedResponse(format!(
                "device speed {speed} outside 0-{SPEED_MAX}"
            )));
        }
        Ok(speed)
    }

    pub async fn set_rgb_speed(&self, speed: u8) -> Result<(), ConfigError> {
        if speed > SPEED_MAX {
            return Err(ConfigError::InvalidParameter(format!(
                "speed {speed} outside 0-{SPEED_MAX}"
            )));
        }
        self.store_active_profile(|record| record.speed = speed)
            .await
    }

    // === Light device requests ===

    /// Brightness change from the light device, clamped to its maximum
    pub async fn set_brightness(&self, brightness: u8) -> Result<(), ConfigError> {
        let brightness = brightness.min(self.led().max_brightness());
        self.store_active_profile(|record| record.brightness = brightness)
            .await
    }

    /// Per-channel intensity change from the light device
    pub async fn set_color(&self, color: RgbColor) -> Result<(), ConfigError> {
        self.store_active_profile(|record| record.color = color)
            .await
    }
}
