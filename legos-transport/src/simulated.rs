//! Simulated MCU transport
//!
//! Answers configuration frames the way the controller MCU does and delivers
//! the replies through the registered frame handler, either on the sender's
//! stack or from a delivery thread after a delay. Every transmitted frame is
//! recorded so tests can assert ordering and "nothing was sent".

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::error::{FrameError, TransportError};
use crate::frame::CommandReport;
use crate::protocol::{cmd, light_cfg, status, FRAME_SIZE};
use crate::types::{TransportDeviceInfo, TransportType};
use crate::{FrameHandler, Transport};

/// How replies are delivered to the frame handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Synchronously, before `send` returns
    Inline,
    /// From a separate thread after the given delay
    Delayed(Duration),
}

/// How the simulated MCU answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    /// Apply sets, answer gets from the model
    Echo,
    /// Swallow every frame without replying
    Silent,
    /// Reply to sets with this status byte (gets behave as in `Echo`)
    Status(u8),
    /// Reply to gets with this value in the first payload byte
    ForcedValue(u8),
}

/// Ordered record of traffic through the simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    Sent { command: u8, index: u8 },
    Replied { command: u8, index: u8 },
}

/// Configuration state held by the simulated MCU
#[derive(Debug, Clone)]
struct McuModel {
    /// Single-byte values keyed by (GET command, index)
    values: HashMap<(u8, u8), u8>,
    light_mode: u8,
    light_profile: u8,
    profiles: [[u8; light_cfg::PROFILE_LEN]; light_cfg::USER_PROFILE_COUNT as usize],
    mcu_id: [u8; 12],
    version: [u8; 4],
}

impl Default for McuModel {
    fn default() -> Self {
        use crate::protocol::{gamepad_cfg, test_index, touchpad_cfg};

        let mut values = HashMap::new();
        values.insert((cmd::GET_GAMEPAD_CFG, gamepad_cfg::AUTO_SLEEP_TIME), 10);
        values.insert((cmd::GET_GAMEPAD_CFG, gamepad_cfg::POLL_RATE), 3);
        values.insert((cmd::GET_GAMEPAD_CFG, gamepad_cfg::LIGHT_ENABLE), 1);
        values.insert((cmd::GET_GAMEPAD_CFG, gamepad_cfg::IMU_ENABLE), 1);
        values.insert((cmd::GET_GAMEPAD_CFG, gamepad_cfg::TOUCHPAD_ENABLE), 1);
        values.insert((cmd::GET_GAMEPAD_CFG, gamepad_cfg::OS_TYPE), 1);
        values.insert((cmd::GET_GAMEPAD_CFG, gamepad_cfg::MOUSE_WHEEL_STEP), 5);
        values.insert((cmd::GET_TP_PARAM, touchpad_cfg::LINUX_MODE), 1);
        values.insert((cmd::GET_PL_TEST, test_index::TP_MANUFACTURER), 1);
        values.insert((cmd::GET_PL_TEST, test_index::IMU_MANUFACTURER), 1);
        values.insert((cmd::GET_PL_TEST, test_index::TP_VERSION), 0x12);

        Self {
            values,
            light_mode: 0,
            light_profile: 1,
            profiles: [
                [0, 0x24, 0x22, 0x99, 0x50, 0x32],
                [1, 0xFF, 0x00, 0x00, 0x64, 0x32],
                [3, 0x00, 0xFF, 0x00, 0x64, 0x50],
            ],
            mcu_id: [
                0x4C, 0x47, 0x53, 0x00, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38,
            ],
            version: [0x01, 0x02, 0x0A, 0x05],
        }
    }
}

impl McuModel {
    /// Apply one command; returns the reply frame if the MCU answers it
    fn handle(&mut self, req: &CommandReport, mode: ReplyMode) -> Option<CommandReport> {
        let mut reply = CommandReport {
            cmd: req.cmd,
            sub_cmd: req.sub_cmd,
            data: [0; crate::protocol::PAYLOAD_LEN],
        };

        match req.cmd {
            cmd::GET_VERSION => {
                reply.data[2] = self.version[0];
                reply.data[1] = self.version[1];
                reply.data[0] = self.version[2];
                reply.sub_cmd = self.version[3];
            }
            cmd::GET_MCU_ID => {
                reply.sub_cmd = self.mcu_id[0];
                reply.data[..11].copy_from_slice(&self.mcu_id[1..]);
            }
            cmd::GET_GAMEPAD_CFG | cmd::GET_TP_PARAM | cmd::GET_PL_TEST => {
                reply.data[0] = self.values.get(&(req.cmd, req.sub_cmd)).copied().unwrap_or(0);
            }
            cmd::GET_LIGHT_CFG => match req.sub_cmd {
                light_cfg::MODE_SEL => reply.data[0] = self.light_mode,
                light_cfg::PROFILE_SEL => reply.data[0] = self.light_profile,
                index if light_cfg::is_user_profile(index) => {
                    let slot = (index - light_cfg::USER_PROFILE_1) as usize;
                    reply.data[..light_cfg::PROFILE_LEN].copy_from_slice(&self.profiles[slot]);
                }
                _ => return None,
            },
            cmd::SET_LIGHT_CFG => {
                let status = match mode {
                    ReplyMode::Status(code) => code,
                    _ => status::ACCEPTED,
                };
                if status == status::ACCEPTED {
                    match req.sub_cmd {
                        light_cfg::MODE_SEL => self.light_mode = req.data[0],
                        light_cfg::PROFILE_SEL => self.light_profile = req.data[0],
                        index if light_cfg::is_user_profile(index) => {
                            let slot = (index - light_cfg::USER_PROFILE_1) as usize;
                            self.profiles[slot]
                                .copy_from_slice(&req.data[..light_cfg::PROFILE_LEN]);
                        }
                        _ => return None,
                    }
                }
                reply.data[0] = status;
                return Some(reply);
            }
            command if cmd::is_set(command) => {
                let status = match mode {
                    ReplyMode::Status(code) => code,
                    _ => status::ACCEPTED,
                };
                if status == status::ACCEPTED {
                    if let Some(get) = cmd::get_for_set(command) {
                        self.values.insert((get, req.sub_cmd), req.data[0]);
                    }
                }
                reply.data[0] = status;
                return Some(reply);
            }
            _ => return None,
        }

        if let ReplyMode::ForcedValue(value) = mode {
            reply.data[0] = value;
        }
        Some(reply)
    }
}

/// In-process stand-in for the controller MCU
pub struct SimulatedMcu {
    info: TransportDeviceInfo,
    model: Mutex<McuModel>,
    reply_mode: Mutex<ReplyMode>,
    delivery: Mutex<Delivery>,
    short_write: Mutex<bool>,
    handler: Arc<RwLock<Option<FrameHandler>>>,
    sent: Mutex<Vec<[u8; FRAME_SIZE]>>,
    events: Arc<Mutex<Vec<SimEvent>>>,
}

impl Default for SimulatedMcu {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedMcu {
    /// Create a simulator with inline delivery and echo replies
    pub fn new() -> Self {
        Self {
            info: TransportDeviceInfo {
                vid: crate::protocol::device::VENDOR_ID,
                pid: crate::protocol::device::PID_GO_S_XINPUT,
                interface: crate::protocol::device::CONFIG_INTERFACE,
                transport_type: TransportType::Simulated,
                device_path: "simulated".to_string(),
                serial: None,
                product_name: Some("Legion Go S (simulated)".to_string()),
            },
            model: Mutex::new(McuModel::default()),
            reply_mode: Mutex::new(ReplyMode::Echo),
            delivery: Mutex::new(Delivery::Inline),
            short_write: Mutex::new(false),
            handler: Arc::new(RwLock::new(None)),
            sent: Mutex::new(Vec::new()),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Change how the simulator answers
    pub fn set_reply_mode(&self, mode: ReplyMode) {
        *self.reply_mode.lock() = mode;
    }

    /// Change how replies are delivered
    pub fn set_delivery(&self, delivery: Delivery) {
        *self.delivery.lock() = delivery;
    }

    /// Make `send` report one byte fewer than the frame size
    pub fn set_short_write(&self, short: bool) {
        *self.short_write.lock() = short;
    }

    /// Replace the stored MCU identifier
    pub fn set_mcu_id(&self, id: [u8; 12]) {
        self.model.lock().mcu_id = id;
    }

    /// Replace the stored firmware version (major, minor, patch, build)
    pub fn set_version(&self, version: [u8; 4]) {
        self.model.lock().version = version;
    }

    /// Seed a single-byte value for a GET command and index
    pub fn set_value(&self, get_command: u8, index: u8, value: u8) {
        self.model.lock().values.insert((get_command, index), value);
    }

    /// Current single-byte value for a GET command and index
    pub fn value(&self, get_command: u8, index: u8) -> Option<u8> {
        self.model.lock().values.get(&(get_command, index)).copied()
    }

    /// Seed the lighting mode selection
    pub fn set_light_mode(&self, mode: u8) {
        self.model.lock().light_mode = mode;
    }

    /// Current lighting mode selection
    pub fn light_mode(&self) -> u8 {
        self.model.lock().light_mode
    }

    /// Current active profile selection
    pub fn light_profile(&self) -> u8 {
        self.model.lock().light_profile
    }

    /// Stored bytes of user profile `profile` (1-based)
    pub fn profile(&self, profile: u8) -> Option<[u8; light_cfg::PROFILE_LEN]> {
        let slot = light_cfg::user_profile_index(profile)? - light_cfg::USER_PROFILE_1;
        Some(self.model.lock().profiles[slot as usize])
    }

    /// Every frame passed to `send`, in order
    pub fn sent_frames(&self) -> Vec<[u8; FRAME_SIZE]> {
        self.sent.lock().clone()
    }

    /// Number of frames passed to `send`
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    /// Forget recorded frames and events
    pub fn clear_log(&self) {
        self.sent.lock().clear();
        self.events.lock().clear();
    }

    /// Ordered send/reply log
    pub fn events(&self) -> Vec<SimEvent> {
        self.events.lock().clone()
    }

    /// Deliver an unsolicited frame to the handler, returning its verdict
    pub fn inject(&self, frame: &[u8]) -> Option<Result<(), FrameError>> {
        let callback = self.handler.read().clone();
        callback.map(|callback| callback(frame))
    }

    fn deliver(
        handler: &RwLock<Option<FrameHandler>>,
        events: &Mutex<Vec<SimEvent>>,
        reply: &CommandReport,
    ) {
        events.lock().push(SimEvent::Replied {
            command: reply.cmd,
            index: reply.sub_cmd,
        });
        let callback = handler.read().clone();
        if let Some(callback) = callback {
            if let Err(e) = callback(&reply.to_frame()) {
                debug!("Simulated reply rejected by handler: {}", e);
            }
        }
    }
}

#[async_trait]
impl Transport for SimulatedMcu {
    async fn send(&self, frame: &[u8]) -> Result<usize, TransportError> {
        let req = CommandReport::parse(frame).map_err(|_| TransportError::FrameSize {
            expected: FRAME_SIZE,
            actual: frame.len(),
        })?;
        self.sent.lock().push(req.to_frame());
        self.events.lock().push(SimEvent::Sent {
            command: req.cmd,
            index: req.sub_cmd,
        });
        debug!("SIM TX {} index 0x{:02X}", req.command_name(), req.sub_cmd);

        if *self.short_write.lock() {
            return Ok(FRAME_SIZE - 1);
        }

        let mode = *self.reply_mode.lock();
        if mode == ReplyMode::Silent {
            return Ok(FRAME_SIZE);
        }

        let reply = self.model.lock().handle(&req, mode);
        let Some(reply) = reply else {
            debug!("SIM ignoring {}", req.command_name());
            return Ok(FRAME_SIZE);
        };

        match *self.delivery.lock() {
            Delivery::Inline => Self::deliver(&self.handler, &self.events, &reply),
            Delivery::Delayed(delay) => {
                let handler = self.handler.clone();
                let events = self.events.clone();
                std::thread::Builder::new()
                    .name("legos-sim-delivery".into())
                    .spawn(move || {
                        std::thread::sleep(delay);
                        Self::deliver(&handler, &events, &reply);
                    })
                    .map_err(|e| TransportError::Internal(format!("delivery thread: {e}")))?;
            }
        }

        Ok(FRAME_SIZE)
    }

    fn set_frame_handler(&self, handler: Option<FrameHandler>) {
        *self.handler.write() = handler;
    }

    fn device_info(&self) -> &TransportDeviceInfo {
        &self.info
    }

    async fn is_connected(&self) -> bool {
        true
    }

    async fn close(&self) -> Result<(), TransportError> {
        *self.handler.write() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encode;
    use crate::protocol::gamepad_cfg;

    fn capture(sim: &SimulatedMcu) -> Arc<Mutex<Vec<CommandReport>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        sim.set_frame_handler(Some(Arc::new(move |frame: &[u8]| -> Result<(), FrameError> {
            sink.lock().push(CommandReport::parse(frame)?);
            Ok(())
        })));
        seen
    }

    #[tokio::test]
    async fn test_set_then_get_echoes_value() {
        let sim = SimulatedMcu::new();
        let seen = capture(&sim);

        let set = encode(cmd::SET_GAMEPAD_CFG, gamepad_cfg::MOUSE_WHEEL_STEP, &[42]).unwrap();
        assert_eq!(sim.send(&set).await.unwrap(), FRAME_SIZE);
        let get = encode(cmd::GET_GAMEPAD_CFG, gamepad_cfg::MOUSE_WHEEL_STEP, &[]).unwrap();
        sim.send(&get).await.unwrap();

        let replies = seen.lock().clone();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].cmd, cmd::SET_GAMEPAD_CFG);
        assert_eq!(replies[0].data[0], status::ACCEPTED);
        assert_eq!(replies[1].data[0], 42);
        assert_eq!(sim.value(cmd::GET_GAMEPAD_CFG, gamepad_cfg::MOUSE_WHEEL_STEP), Some(42));
    }

    #[tokio::test]
    async fn test_status_mode_rejects_without_applying() {
        let sim = SimulatedMcu::new();
        let seen = capture(&sim);
        sim.set_reply_mode(ReplyMode::Status(5));

        let set = encode(cmd::SET_GAMEPAD_CFG, gamepad_cfg::MOUSE_WHEEL_STEP, &[42]).unwrap();
        sim.send(&set).await.unwrap();

        assert_eq!(seen.lock()[0].data[0], 5);
        assert_eq!(sim.value(cmd::GET_GAMEPAD_CFG, gamepad_cfg::MOUSE_WHEEL_STEP), Some(5));
    }

    #[tokio::test]
    async fn test_silent_mode_records_but_never_replies() {
        let sim = SimulatedMcu::new();
        let seen = capture(&sim);
        sim.set_reply_mode(ReplyMode::Silent);

        let get = encode(cmd::GET_VERSION, 0, &[]).unwrap();
        sim.send(&get).await.unwrap();

        assert!(seen.lock().is_empty());
        assert_eq!(sim.sent_count(), 1);
        assert_eq!(
            sim.events(),
            vec![SimEvent::Sent {
                command: cmd::GET_VERSION,
                index: 0
            }]
        );
    }

    #[tokio::test]
    async fn test_identity_reply_layout() {
        let sim = SimulatedMcu::new();
        let seen = capture(&sim);
        sim.set_version([1, 2, 3, 4]);

        sim.send(&encode(cmd::GET_VERSION, 0, &[]).unwrap()).await.unwrap();
        sim.send(&encode(cmd::GET_MCU_ID, 0, &[]).unwrap()).await.unwrap();

        let replies = seen.lock().clone();
        assert_eq!(replies[0].sub_cmd, 4);
        assert_eq!(&replies[0].data[..3], &[3, 2, 1]);
        assert_eq!(replies[1].sub_cmd, 0x4C);
        assert_eq!(replies[1].data[0], 0x47);
    }

    #[tokio::test]
    async fn test_delayed_delivery_arrives_later() {
        let sim = SimulatedMcu::new();
        let seen = capture(&sim);
        sim.set_delivery(Delivery::Delayed(Duration::from_millis(20)));

        sim.send(&encode(cmd::GET_LIGHT_CFG, light_cfg::MODE_SEL, &[]).unwrap())
            .await
            .unwrap();
        assert!(seen.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_short_write_reports_truncation() {
        let sim = SimulatedMcu::new();
        sim.set_short_write(true);
        let written = sim.send(&encode(cmd::GET_VERSION, 0, &[]).unwrap()).await.unwrap();
        assert_eq!(written, FRAME_SIZE - 1);
    }

    #[tokio::test]
    async fn test_wrong_frame_size_is_rejected() {
        let sim = SimulatedMcu::new();
        let err = sim.send(&[0u8; 10]).await.unwrap_err();
        assert!(matches!(err, TransportError::FrameSize { actual: 10, .. }));
        assert_eq!(sim.sent_count(), 0);
    }
}
