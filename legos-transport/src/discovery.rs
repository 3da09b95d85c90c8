//! Device discovery for the controller's configuration interface

use std::sync::Arc;

use async_trait::async_trait;
use hidapi::HidApi;
use tracing::{debug, info};

use crate::error::TransportError;
use crate::hid::HidUsbTransport;
use crate::protocol::device;
use crate::types::{DiscoveredDevice, TransportDeviceInfo, TransportType};
use crate::Transport;

/// Device discovery abstraction
#[async_trait]
pub trait DeviceDiscovery: Send + Sync {
    /// List currently available devices
    async fn list_devices(&self) -> Result<Vec<DiscoveredDevice>, TransportError>;

    /// Open a specific device
    async fn open_device(
        &self,
        device: &DiscoveredDevice,
    ) -> Result<Arc<dyn Transport>, TransportError>;
}

/// Which USB devices and interface to look for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFilter {
    pub vendor_id: u16,
    pub product_ids: Vec<u16>,
    pub interface: i32,
}

impl Default for DeviceFilter {
    fn default() -> Self {
        Self {
            vendor_id: device::VENDOR_ID,
            product_ids: device::PRODUCT_IDS.to_vec(),
            interface: device::CONFIG_INTERFACE,
        }
    }
}

impl DeviceFilter {
    fn matches(&self, info: &hidapi::DeviceInfo) -> bool {
        info.vendor_id() == self.vendor_id
            && self.product_ids.contains(&info.product_id())
            && info.interface_number() == self.interface
    }
}

/// HID device discovery
#[derive(Default)]
pub struct HidDiscovery {
    filter: DeviceFilter,
}

impl HidDiscovery {
    /// Create a new HID discovery instance with the default filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a custom filter
    pub fn with_filter(filter: DeviceFilter) -> Self {
        Self { filter }
    }

    /// Add a product ID to discover
    pub fn add_product(&mut self, pid: u16) {
        if !self.filter.product_ids.contains(&pid) {
            self.filter.product_ids.push(pid);
        }
    }
}

#[async_trait]
impl DeviceDiscovery for HidDiscovery {
    async fn list_devices(&self) -> Result<Vec<DiscoveredDevice>, TransportError> {
        let api = HidApi::new()?;
        let mut devices = Vec::new();

        for device_info in api.device_list() {
            if !self.filter.matches(device_info) {
                continue;
            }

            let path = device_info.path().to_string_lossy().to_string();
            debug!(
                "Found device: VID={:04X} PID={:04X} if={} path={}",
                device_info.vendor_id(),
                device_info.product_id(),
                device_info.interface_number(),
                path
            );

            devices.push(DiscoveredDevice {
                info: TransportDeviceInfo {
                    vid: device_info.vendor_id(),
                    pid: device_info.product_id(),
                    interface: device_info.interface_number(),
                    transport_type: TransportType::HidUsb,
                    device_path: path,
                    serial: device_info.serial_number().map(|s| s.to_string()),
                    product_name: device_info.product_string().map(|s| s.to_string()),
                },
            });
        }

        info!("Found {} devices", devices.len());
        Ok(devices)
    }

    async fn open_device(
        &self,
        device: &DiscoveredDevice,
    ) -> Result<Arc<dyn Transport>, TransportError> {
        if device.info.transport_type != TransportType::HidUsb {
            return Err(TransportError::Internal(format!(
                "Unsupported transport type: {:?}",
                device.info.transport_type
            )));
        }

        let api = HidApi::new()?;
        let target = api
            .device_list()
            .find(|d| {
                self.filter.matches(d) && d.path().to_string_lossy() == device.info.device_path
            })
            .ok_or_else(|| {
                TransportError::DeviceNotFound(format!(
                    "Configuration interface {} for {:04X}:{:04X}",
                    device.info.interface, device.info.vid, device.info.pid
                ))
            })?;

        let writer = target.open_device(&api)?;
        let reader = target.open_device(&api)?;
        let transport = HidUsbTransport::new(writer, reader, device.info.clone())?;

        info!(
            "Opened {:?} transport for {:04X}:{:04X}",
            device.info.transport_type, device.info.vid, device.info.pid
        );
        Ok(Arc::new(transport))
    }
}
