//! Property accessors generated from a descriptor table
//!
//! Every single-byte configuration value is one [`PropertyDescriptor`]: the
//! command pair and index that reach it plus the rule that validates and
//! formats it.

use legos_transport::frame::single_value_args;
use legos_transport::protocol::{cmd, gamepad_cfg, test_index, touchpad_cfg};
use tracing::debug;

use crate::error::ConfigError;
use crate::session::DeviceSession;

/// How a property's wire byte maps to text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRule {
    /// Enumeration; token position is the wire value
    Choice(&'static [&'static str]),
    /// Inclusive numeric range
    Range { min: u8, max: u8 },
}

impl ValueRule {
    /// Parse user text into a wire value
    pub fn parse(&self, text: &str) -> Result<u8, ConfigError> {
        let text = text.trim();
        match *self {
            Self::Choice(tokens) => tokens
                .iter()
                .position(|t| *t == text)
                .map(|i| i as u8)
                .ok_or_else(|| {
                    ConfigError::InvalidParameter(format!(
                        "'{}' is not one of: {}",
                        text,
                        tokens.join(" ")
                    ))
                }),
            Self::Range { .. } => {
                let value: u32 = text.parse().map_err(|_| {
                    ConfigError::InvalidParameter(format!("'{text}' is not a number"))
                })?;
                let value = u8::try_from(value).map_err(|_| self.out_of_range(value))?;
                self.check(value)
            }
        }
    }

    /// Validate a raw wire value supplied by a caller
    pub fn check(&self, value: u8) -> Result<u8, ConfigError> {
        if self.contains(value) {
            Ok(value)
        } else {
            Err(self.out_of_range(u32::from(value)))
        }
    }

    /// Format a device-returned value, rejecting anything outside the rule
    pub fn format(&self, value: u8) -> Result<String, ConfigError> {
        if !self.contains(value) {
            return Err(ConfigError::UnexpectedResponse(format!(
                "device value {} outside {}",
                value,
                self.describe()
            )));
        }
        Ok(match *self {
            Self::Choice(tokens) => tokens[value as usize].to_string(),
            Self::Range { .. } => value.to_string(),
        })
    }

    /// Allowed values: tokens joined by spaces, or `min-max`
    pub fn describe(&self) -> String {
        match *self {
            Self::Choice(tokens) => tokens.join(" "),
            Self::Range { min, max } => format!("{min}-{max}"),
        }
    }

    fn contains(&self, value: u8) -> bool {
        match *self {
            Self::Choice(tokens) => (value as usize) < tokens.len(),
            Self::Range { min, max } => (min..=max).contains(&value),
        }
    }

    fn out_of_range(&self, value: u32) -> ConfigError {
        ConfigError::InvalidParameter(format!("{} outside {}", value, self.describe()))
    }
}

const BOOL_TOKENS: &[&str] = &["false", "true"];
const TOUCHPAD_MODE_TOKENS: &[&str] = &["relative", "absolute"];

/// One configuration value reachable with a get/set command pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub group: &'static str,
    pub name: &'static str,
    pub get_command: u8,
    /// `None` for read-only properties
    pub set_command: Option<u8>,
    pub index: u8,
    pub rule: ValueRule,
}

impl PropertyDescriptor {
    const fn gamepad(group: &'static str, name: &'static str, index: u8, rule: ValueRule) -> Self {
        Self {
            group,
            name,
            get_command: cmd::GET_GAMEPAD_CFG,
            set_command: Some(cmd::SET_GAMEPAD_CFG),
            index,
            rule,
        }
    }

    const fn touchpad(name: &'static str, index: u8) -> Self {
        Self {
            group: "touchpad",
            name,
            get_command: cmd::GET_TP_PARAM,
            set_command: Some(cmd::SET_TP_PARAM),
            index,
            rule: ValueRule::Choice(TOUCHPAD_MODE_TOKENS),
        }
    }

    const fn readout(group: &'static str, name: &'static str, index: u8, rule: ValueRule) -> Self {
        Self {
            group,
            name,
            get_command: cmd::GET_PL_TEST,
            set_command: None,
            index,
            rule,
        }
    }

    pub fn is_writable(&self) -> bool {
        self.set_command.is_some()
    }

    /// `group/name`
    pub fn path(&self) -> String {
        format!("{}/{}", self.group, self.name)
    }
}

/// Single-byte properties exposed on the configuration surface
pub const PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::gamepad(
        "gamepad",
        "auto_sleep_time",
        gamepad_cfg::AUTO_SLEEP_TIME,
        ValueRule::Range { min: 0, max: 255 },
    ),
    PropertyDescriptor::gamepad(
        "gamepad",
        "dpad_mode",
        gamepad_cfg::DPAD_MODE,
        ValueRule::Choice(&["8-way", "4-way"]),
    ),
    PropertyDescriptor::gamepad(
        "gamepad",
        "mode",
        gamepad_cfg::GAMEPAD_MODE,
        ValueRule::Choice(&["xinput", "dinput"]),
    ),
    PropertyDescriptor::gamepad(
        "gamepad",
        "poll_rate",
        gamepad_cfg::POLL_RATE,
        ValueRule::Choice(&["125", "250", "500", "1000"]),
    ),
    PropertyDescriptor::gamepad(
        "imu",
        "bypass_enabled",
        gamepad_cfg::IMU_BYPASS,
        ValueRule::Choice(BOOL_TOKENS),
    ),
    PropertyDescriptor::gamepad(
        "imu",
        "sensor_enabled",
        gamepad_cfg::IMU_ENABLE,
        ValueRule::Choice(&["off", "on", "off-2sec"]),
    ),
    PropertyDescriptor::readout(
        "imu",
        "manufacturer",
        test_index::IMU_MANUFACTURER,
        ValueRule::Choice(&["none", "Bosch", "ST"]),
    ),
    PropertyDescriptor::gamepad(
        "mcu",
        "os_mode",
        gamepad_cfg::OS_TYPE,
        ValueRule::Choice(&["windows", "linux"]),
    ),
    PropertyDescriptor::gamepad(
        "mouse",
        "step",
        gamepad_cfg::MOUSE_WHEEL_STEP,
        ValueRule::Range { min: 1, max: 127 },
    ),
    PropertyDescriptor::gamepad(
        "rgb",
        "enabled",
        gamepad_cfg::LIGHT_ENABLE,
        ValueRule::Choice(BOOL_TOKENS),
    ),
    PropertyDescriptor::gamepad(
        "touchpad",
        "enabled",
        gamepad_cfg::TOUCHPAD_ENABLE,
        ValueRule::Choice(BOOL_TOKENS),
    ),
    PropertyDescriptor::touchpad("linux_mode", touchpad_cfg::LINUX_MODE),
    PropertyDescriptor::touchpad("windows_mode", touchpad_cfg::WINDOWS_MODE),
    PropertyDescriptor::readout(
        "touchpad",
        "manufacturer",
        test_index::TP_MANUFACTURER,
        ValueRule::Choice(&["none", "BetterLife", "SIPO"]),
    ),
    PropertyDescriptor::readout(
        "touchpad",
        "version",
        test_index::TP_VERSION,
        ValueRule::Range { min: 0, max: 255 },
    ),
];

/// Look up a descriptor by group and name
pub fn find(group: &str, name: &str) -> Option<&'static PropertyDescriptor> {
    PROPERTIES
        .iter()
        .find(|p| p.group == group && p.name == name)
}

impl DeviceSession {
    // === Generic property access ===

    /// Read a property's wire value, re-validated against its rule
    pub async fn get_value(&self, property: &PropertyDescriptor) -> Result<u8, ConfigError> {
        let reply = self
            .call(property.get_command, property.index, &[])
            .await?
            .answered()?;
        property.rule.check(reply.value).map_err(|_| {
            ConfigError::UnexpectedResponse(format!(
                "{}: device value {} outside {}",
                property.path(),
                reply.value,
                property.rule.describe()
            ))
        })
    }

    /// Write a property's wire value after validating it locally
    pub async fn set_value(&self, property: &PropertyDescriptor, value: u8) -> Result<(), ConfigError> {
        let set_command = property.set_command.ok_or_else(|| {
            ConfigError::InvalidParameter(format!("{} is read-only", property.path()))
        })?;
        let value = property.rule.check(value)?;
        debug!("Setting {} = {}", property.path(), value);
        self.call(set_command, property.index, &single_value_args(value))
            .await?;
        Ok(())
    }

    /// Read a property as text
    pub async fn get_property(&self, property: &PropertyDescriptor) -> Result<String, ConfigError> {
        let value = self.get_value(property).await?;
        property.rule.format(value)
    }

    /// Write a property from text
    pub async fn set_property(
        &self,
        property: &PropertyDescriptor,
        text: &str,
    ) -> Result<(), ConfigError> {
        if !property.is_writable() {
            return Err(ConfigError::InvalidParameter(format!(
                "{} is read-only",
                property.path()
            )));
        }
        let value = property.rule.parse(text)?;
        self.set_value(property, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_tokens_round_trip() {
        for property in PROPERTIES {
            if let ValueRule::Choice(tokens) = property.rule {
                for token in tokens {
                    let value = property.rule.parse(token).unwrap();
                    assert_eq!(property.rule.format(value).unwrap(), *token);
                }
                let past_end = tokens.len() as u8;
                assert!(matches!(
                    property.rule.format(past_end),
                    Err(ConfigError::UnexpectedResponse(_))
                ));
            }
        }
    }

    #[test]
    fn test_parse_trims_input() {
        let rule = ValueRule::Choice(&["xinput", "dinput"]);
        assert_eq!(rule.parse("dinput\n").unwrap(), 1);
        assert_eq!(rule.parse("  xinput ").unwrap(), 0);
        assert!(rule.parse("DInput").is_err());
    }

    #[test]
    fn test_range_bounds() {
        let step = find("mouse", "step").unwrap();
        assert!(step.rule.parse("0").is_err());
        assert_eq!(step.rule.parse("1").unwrap(), 1);
        assert_eq!(step.rule.parse("127").unwrap(), 127);
        assert!(step.rule.parse("128").is_err());
        assert!(step.rule.parse("300").is_err());
        assert!(step.rule.parse("-1").is_err());
        assert!(step.rule.parse("abc").is_err());
        assert!(step.rule.format(200).is_err());
    }

    #[test]
    fn test_describe() {
        assert_eq!(find("mouse", "step").unwrap().rule.describe(), "1-127");
        assert_eq!(
            find("gamepad", "poll_rate").unwrap().rule.describe(),
            "125 250 500 1000"
        );
    }

    #[test]
    fn test_table_is_unique_and_resolvable() {
        for (i, a) in PROPERTIES.iter().enumerate() {
            for b in &PROPERTIES[i + 1..] {
                assert!(a.path() != b.path(), "duplicate {}", a.path());
            }
            assert_eq!(find(a.group, a.name), Some(a));
        }
        assert!(find("gamepad", "nope").is_none());
    }

    #[test]
    fn test_readouts_are_read_only() {
        assert!(!find("touchpad", "manufacturer").unwrap().is_writable());
        assert!(!find("imu", "manufacturer").unwrap().is_writable());
        assert!(!find("touchpad", "version").unwrap().is_writable());
        assert!(find("touchpad", "linux_mode").unwrap().is_writable());
    }
}
