//! Driver configuration file (TOML)
//!
//! ```toml
//! [device]
//! vendor_id = 0x1A86
//! product_ids = [0xE310, 0xE311]
//! interface = 6
//!
//! [timing]
//! command_timeout_ms = 5
//! startup_delay_ms = 2
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use legos_config::SessionConfig;
use legos_transport::protocol::{device, timing};
use legos_transport::DeviceFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ConfigFileError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// `[device]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSection {
    pub vendor_id: u16,
    pub product_ids: Vec<u16>,
    pub interface: i32,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            vendor_id: device::VENDOR_ID,
            product_ids: device::PRODUCT_IDS.to_vec(),
            interface: device::CONFIG_INTERFACE,
        }
    }
}

/// `[timing]` section, milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSection {
    pub command_timeout_ms: u64,
    pub startup_delay_ms: u64,
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            command_timeout_ms: timing::COMMAND_TIMEOUT_MS,
            startup_delay_ms: timing::STARTUP_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub device: DeviceSection,
    pub timing: TimingSection,
}

impl DriverConfig {
    /// Load from a TOML file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Parse from TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigFileError> {
        Ok(toml::from_str(content)?)
    }

    pub fn device_filter(&self) -> DeviceFilter {
        DeviceFilter {
            vendor_id: self.device.vendor_id,
            product_ids: self.device.product_ids.clone(),
            interface: self.device.interface,
        }
    }

    pub fn session_config(&self, fetch_on_attach: bool) -> SessionConfig {
        SessionConfig {
            command_timeout: Duration::from_millis(self.timing.command_timeout_ms),
            startup_delay: Duration::from_millis(self.timing.startup_delay_ms),
            fetch_on_attach,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config = DriverConfig::from_toml("").unwrap();
        assert_eq!(config, DriverConfig::default());
        assert_eq!(config.device.interface, 6);
        assert_eq!(config.timing.command_timeout_ms, 5);
        assert_eq!(config.timing.startup_delay_ms, 2);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = DriverConfig::from_toml(
            r#"
            [device]
            interface = 3

            [timing]
            command_timeout_ms = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.device.interface, 3);
        assert_eq!(config.device.vendor_id, 0x1A86);
        assert_eq!(config.device.product_ids, vec![0xE310, 0xE311]);
        assert_eq!(config.timing.command_timeout_ms, 50);
        assert_eq!(config.timing.startup_delay_ms, 2);
    }

    #[test]
    fn test_hex_ids() {
        let config = DriverConfig::from_toml(
            r#"
            [device]
            vendor_id = 0x17EF
            product_ids = [0x6182]
            "#,
        )
        .unwrap();
        let filter = config.device_filter();
        assert_eq!(filter.vendor_id, 0x17EF);
        assert_eq!(filter.product_ids, vec![0x6182]);
    }

    #[test]
    fn test_session_config() {
        let config = DriverConfig::from_toml("[timing]\nstartup_delay_ms = 10\n").unwrap();
        let session = config.session_config(false);
        assert_eq!(session.command_timeout, Duration::from_millis(5));
        assert_eq!(session.startup_delay, Duration::from_millis(10));
        assert!(!session.fetch_on_attach);
    }

    #[test]
    fn test_bad_toml_is_error() {
        assert!(matches!(
            DriverConfig::from_toml("[timing]\ncommand_timeout_ms = \"fast\"\n"),
            Err(ConfigFileError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = DriverConfig::load(Path::new("/nonexistent/legos-driver.toml")).unwrap();
        assert_eq!(config, DriverConfig::default());
    }
}
