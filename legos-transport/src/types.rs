//! Common types for transport layer

use serde::Serialize;

/// Transport type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportType {
    /// Configuration interface of the controller over USB HID
    HidUsb,
    /// In-process simulated MCU
    Simulated,
}

impl TransportType {
    /// Check if this transport talks to real hardware
    pub fn is_hardware(&self) -> bool {
        matches!(self, Self::HidUsb)
    }
}

/// Device identification information
#[derive(Debug, Clone, Serialize)]
pub struct TransportDeviceInfo {
    /// USB Vendor ID
    pub vid: u16,
    /// USB Product ID
    pub pid: u16,
    /// USB interface number of the configuration endpoint
    pub interface: i32,
    /// Transport type
    pub transport_type: TransportType,
    /// Device path or identifier (transport-specific)
    pub device_path: String,
    /// Serial number if available
    pub serial: Option<String>,
    /// Product name if available
    pub product_name: Option<String>,
}

/// Discovered device that can be opened
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredDevice {
    /// Device information
    pub info: TransportDeviceInfo,
}
