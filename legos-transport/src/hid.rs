//! HID transport for the controller's USB configuration interface
//!
//! Commands go out as output reports. Replies come back as input reports on the
//! same interface and are picked up by a dedicated reader thread which hands
//! each frame to the registered [`FrameHandler`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hidapi::HidDevice;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::protocol::{cmd, timing, FRAME_SIZE};
use crate::types::TransportDeviceInfo;
use crate::{FrameHandler, Transport};

/// hidapi wants a leading report ID byte on writes; the interface has none
const REPORT_ID: u8 = 0x00;

type SharedHandler = Arc<RwLock<Option<FrameHandler>>>;

/// USB HID transport
pub struct HidUsbTransport {
    /// Output side of the configuration interface
    device: Mutex<HidDevice>,
    /// Device information
    info: TransportDeviceInfo,
    /// Callback slot shared with the reader thread
    handler: SharedHandler,
    /// Shutdown flag for reader thread
    shutdown: Arc<AtomicBool>,
}

impl HidUsbTransport {
    /// Create a transport from two handles on the configuration interface
    ///
    /// # Arguments
    /// * `device` - handle used for writes
    /// * `reader` - second handle owned by the reader thread
    /// * `info` - Device information
    pub fn new(
        device: HidDevice,
        reader: HidDevice,
        info: TransportDeviceInfo,
    ) -> Result<Self, TransportError> {
        let handler: SharedHandler = Arc::new(RwLock::new(None));
        let shutdown = Arc::new(AtomicBool::new(false));

        let handler_clone = handler.clone();
        let shutdown_clone = shutdown.clone();
        std::thread::Builder::new()
            .name("legos-hid-reader".into())
            .spawn(move || run_reader_loop(reader, handler_clone, shutdown_clone))
            .map_err(|e| TransportError::Internal(format!("reader thread: {e}")))?;

        Ok(Self {
            device: Mutex::new(device),
            info,
            handler,
            shutdown,
        })
    }
}

/// Reader loop: blocks in short reads so the shutdown flag is noticed quickly
fn run_reader_loop(device: HidDevice, handler: SharedHandler, shutdown: Arc<AtomicBool>) {
    debug!("HID reader thread started");
    let mut buf = [0u8; FRAME_SIZE];

    while !shutdown.load(Ordering::Relaxed) {
        match device.read_timeout(&mut buf, timing::READ_TIMEOUT_MS) {
            Ok(len) if len > 0 => {
                let frame = &buf[..len];
                debug!(
                    "RX {} ({} bytes): {:02X?}",
                    cmd::name(frame[0]),
                    len,
                    &frame[..len.min(16)]
                );
                let callback = handler.read().clone();
                match callback {
                    Some(callback) => {
                        if let Err(e) = callback(frame) {
                            debug!("Frame rejected by handler: {}", e);
                        }
                    }
                    None => debug!("No frame handler registered, dropping frame"),
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("HID reader error: {}", e);
                std::thread::sleep(Duration::from_millis(timing::ERROR_SLEEP_MS));
            }
        }
    }

    debug!("HID reader thread exiting");
}

#[async_trait]
impl Transport for HidUsbTransport {
    async fn send(&self, frame: &[u8]) -> Result<usize, TransportError> {
        if frame.len() != FRAME_SIZE {
            return Err(TransportError::FrameSize {
                expected: FRAME_SIZE,
                actual: frame.len(),
            });
        }
        let mut buf = [0u8; FRAME_SIZE + 1];
        buf[0] = REPORT_ID;
        buf[1..].copy_from_slice(frame);

        debug!("TX {}: {:02X?}", cmd::name(frame[0]), &frame[..16]);
        let written = self.device.lock().write(&buf)?;
        Ok(written.saturating_sub(1))
    }

    fn set_frame_handler(&self, handler: Option<FrameHandler>) {
        *self.handler.write() = handler;
    }

    fn device_info(&self) -> &TransportDeviceInfo {
        &self.info
    }

    async fn is_connected(&self) -> bool {
        !self.shutdown.load(Ordering::Relaxed) && self.device.lock().get_product_string().is_ok()
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.shutdown.store(true, Ordering::Relaxed);
        *self.handler.write() = None;
        Ok(())
    }
}

impl Drop for HidUsbTransport {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}
