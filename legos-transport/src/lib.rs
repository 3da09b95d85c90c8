//! Transport layer for the Legion Go S controller MCU configuration channel
//!
//! The MCU speaks a fire-and-forget protocol: a 64-byte command frame goes out
//! and the reply shows up later as an input report. This crate provides:
//!
//! - the frame codec and protocol constants
//! - the [`Transport`] trait (send + registered frame callback)
//! - a hidapi backed USB transport with a dedicated reader thread
//! - a simulated MCU for tests and `--simulate` mode

pub mod error;
pub mod frame;
pub mod protocol;
pub mod simulated;
pub mod types;

mod discovery;
mod hid;

pub use error::{FrameError, TransportError};
pub use frame::{decode, encode, single_value_args, CommandReport};
pub use simulated::{Delivery, ReplyMode, SimEvent, SimulatedMcu};
pub use types::{DiscoveredDevice, TransportDeviceInfo, TransportType};

pub use discovery::{DeviceDiscovery, DeviceFilter, HidDiscovery};
pub use hid::HidUsbTransport;

use async_trait::async_trait;
use std::sync::Arc;

/// Callback invoked by a transport for every inbound frame.
///
/// Runs on the transport's delivery context (reader thread or the sender's
/// stack for inline delivery) and must not block. The returned verdict is
/// only logged by the transport.
pub type FrameHandler = Arc<dyn Fn(&[u8]) -> Result<(), FrameError> + Send + Sync>;

/// The core transport trait - all backends implement this
///
/// Replies are not returned from [`Transport::send`]; they arrive through the
/// handler registered with [`Transport::set_frame_handler`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transmit one frame, returning the number of frame bytes the device accepted
    async fn send(&self, frame: &[u8]) -> Result<usize, TransportError>;

    /// Register (or clear) the inbound frame callback
    fn set_frame_handler(&self, handler: Option<FrameHandler>);

    /// Get device information
    fn device_info(&self) -> &TransportDeviceInfo;

    /// Check if transport is still connected
    async fn is_connected(&self) -> bool;

    /// Close the transport gracefully, stopping frame delivery
    async fn close(&self) -> Result<(), TransportError>;
}

/// Type alias for a shared transport
pub type BoxedTransport = Arc<dyn Transport>;
