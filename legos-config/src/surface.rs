//! Configuration surface: named read/write/options endpoints
//!
//! Endpoints are the generic property table plus the lighting and identity
//! entries served by the compositor and the identity cache.

use serde::Serialize;

use crate::error::ConfigError;
use crate::led::{RgbEffect, RgbMode, SPEED_MAX};
use crate::property::{self, PropertyDescriptor, ValueRule, PROPERTIES};
use crate::session::DeviceSession;

/// Backing implementation of one endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Property(&'static PropertyDescriptor),
    RgbEffect,
    RgbSpeed,
    RgbMode,
    RgbProfile,
    McuId,
    McuVersion,
}

const SPECIAL: &[(&str, &str, Endpoint)] = &[
    ("rgb", "effect", Endpoint::RgbEffect),
    ("rgb", "speed", Endpoint::RgbSpeed),
    ("rgb", "mode", Endpoint::RgbMode),
    ("rgb", "profile", Endpoint::RgbProfile),
    ("mcu", "id", Endpoint::McuId),
    ("mcu", "version", Endpoint::McuVersion),
];

const SPEED_RULE: ValueRule = ValueRule::Range { min: 0, max: SPEED_MAX };
const PROFILE_RULE: ValueRule = ValueRule::Range { min: 1, max: 3 };

impl Endpoint {
    /// Validation rule, `None` for identity endpoints
    pub fn rule(&self) -> Option<ValueRule> {
        match self {
            Self::Property(p) => Some(p.rule),
            Self::RgbEffect => Some(ValueRule::Choice(RgbEffect::TOKENS)),
            Self::RgbSpeed => Some(SPEED_RULE),
            Self::RgbMode => Some(ValueRule::Choice(RgbMode::TOKENS)),
            Self::RgbProfile => Some(PROFILE_RULE),
            Self::McuId | Self::McuVersion => None,
        }
    }

    pub fn is_writable(&self) -> bool {
        match self {
            Self::Property(p) => p.is_writable(),
            Self::McuId | Self::McuVersion => false,
            _ => true,
        }
    }
}

/// Listing entry for one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointInfo {
    pub group: &'static str,
    pub name: &'static str,
    pub writable: bool,
    /// Allowed values, empty for identity endpoints
    pub options: String,
}

/// Resolve `group/name` to an endpoint
pub fn lookup(group: &str, name: &str) -> Result<Endpoint, ConfigError> {
    if let Some(p) = property::find(group, name) {
        return Ok(Endpoint::Property(p));
    }
    SPECIAL
        .iter()
        .find(|(g, n, _)| *g == group && *n == name)
        .map(|(_, _, e)| *e)
        .ok_or_else(|| ConfigError::UnknownProperty(format!("{group}/{name}")))
}

/// Every endpoint, sorted by group then name
pub fn endpoints() -> Vec<EndpointInfo> {
    let mut list: Vec<EndpointInfo> = PROPERTIES
        .iter()
        .map(|p| (p.group, p.name, Endpoint::Property(p)))
        .chain(SPECIAL.iter().copied())
        .map(|(group, name, endpoint)| EndpointInfo {
            group,
            name,
            writable: endpoint.is_writable(),
            options: endpoint.rule().map(|r| r.describe()).unwrap_or_default(),
        })
        .collect();
    list.sort_by(|a, b| (a.group, a.name).cmp(&(b.group, b.name)));
    list
}

/// Allowed values for an endpoint
pub fn options(group: &str, name: &str) -> Result<String, ConfigError> {
    let endpoint = lookup(group, name)?;
    endpoint.rule().map(|r| r.describe()).ok_or_else(|| {
        ConfigError::InvalidParameter(format!("{group}/{name} has no option list"))
    })
}

impl DeviceSession {
    /// Read an endpoint as text
    pub async fn read(&self, group: &str, name: &str) -> Result<String, ConfigError> {
        match lookup(group, name)? {
            Endpoint::Property(p) => self.get_property(p).await,
            Endpoint::RgbEffect => Ok(self.get_rgb_effect().await?.name().to_string()),
            Endpoint::RgbSpeed => Ok(self.get_rgb_speed().await?.to_string()),
            Endpoint::RgbMode => Ok(self.get_rgb_mode().await?.name().to_string()),
            Endpoint::RgbProfile => Ok(self.get_rgb_profile().await?.to_string()),
            Endpoint::McuId => {
                self.fetch_mcu_id().await?;
                Ok(self.mcu_id().to_string())
            }
            Endpoint::McuVersion => {
                self.fetch_version().await?;
                Ok(self.version().to_string())
            }
        }
    }

    /// Write an endpoint from text; validation happens before any frame is sent
    pub async fn write(&self, group: &str, name: &str, text: &str) -> Result<(), ConfigError> {
        match lookup(group, name)? {
            Endpoint::Property(p) => self.set_property(p, text).await,
            Endpoint::RgbEffect => {
                let value = ValueRule::Choice(RgbEffect::TOKENS).parse(text)?;
                let effect = RgbEffect::from_u8(value).ok_or_else(|| {
                    ConfigError::InvalidParameter(format!("unknown effect {value}"))
                })?;
                self.set_rgb_effect(effect).await
            }
            Endpoint::RgbSpeed => self.set_rgb_speed(SPEED_RULE.parse(text)?).await,
            Endpoint::RgbMode => {
                let value = ValueRule::Choice(RgbMode::TOKENS).parse(text)?;
                let mode = RgbMode::from_u8(value).ok_or_else(|| {
                    ConfigError::InvalidParameter(format!("unknown mode {value}"))
                })?;
                self.set_rgb_mode(mode).await
            }
            Endpoint::RgbProfile => self.set_rgb_profile(PROFILE_RULE.parse(text)?).await,
            Endpoint::McuId | Endpoint::McuVersion => Err(ConfigError::InvalidParameter(
                format!("{group}/{name} is read-only"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn test_lookup() {
        assert!(matches!(lookup("mouse", "step"), Ok(Endpoint::Property(_))));
        assert_eq!(lookup("rgb", "effect").unwrap(), Endpoint::RgbEffect);
        assert_eq!(lookup("mcu", "version").unwrap(), Endpoint::McuVersion);
        let err = lookup("rgb", "sparkle").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_endpoint_listing() {
        let list = endpoints();
        assert_eq!(list.len(), PROPERTIES.len() + SPECIAL.len());
        let effect = list
            .iter()
            .find(|e| e.group == "rgb" && e.name == "effect")
            .unwrap();
        assert_eq!(effect.options, "monocolor breathe chroma rainbow");
        assert!(effect.writable);
        let id = list.iter().find(|e| e.group == "mcu" && e.name == "id").unwrap();
        assert!(!id.writable);
        assert!(list.windows(2).all(|w| (w[0].group, w[0].name) <= (w[1].group, w[1].name)));
    }

    #[test]
    fn test_options() {
        assert_eq!(options("rgb", "speed").unwrap(), "0-100");
        assert_eq!(options("rgb", "profile").unwrap(), "1-3");
        assert_eq!(options("rgb", "mode").unwrap(), "dynamic custom");
        assert_eq!(options("imu", "sensor_enabled").unwrap(), "off on off-2sec");
        assert!(options("mcu", "id").is_err());
    }
}
