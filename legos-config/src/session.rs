//! Device session: the per-device state record and its lifecycle

use std::sync::Arc;
use std::time::Duration;

use legos_transport::protocol::{light_cfg, timing};
use legos_transport::{BoxedTransport, CommandReport, TransportDeviceInfo, TransportError};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::completion::{Completion, CompletionState};
use crate::correlator::{Correlator, Reply};
use crate::dispatch;
use crate::error::ConfigError;
use crate::identity::{McuId, McuVersion};
use crate::led::MultiColorLed;
use crate::startup::StartupReport;

/// Tunables for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Upper bound on waiting for a reply
    pub command_timeout: Duration,
    /// Delay between attach and the startup fetch
    pub startup_delay: Duration,
    /// Schedule the startup fetch on attach
    pub fetch_on_attach: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_millis(timing::COMMAND_TIMEOUT_MS),
            startup_delay: Duration::from_millis(timing::STARTUP_DELAY_MS),
            fetch_on_attach: true,
        }
    }
}

/// Result of the last transaction as recorded by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing recorded since the request went out
    Pending,
    Ok,
    /// Nonzero status reported by the device
    Status(u8),
    /// Reply that could not be decoded
    Unhandled,
}

/// Cached lighting configuration, raw as reported by the device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightingState {
    pub mode: Option<u8>,
    pub profile: Option<u8>,
    pub profiles: [Option<[u8; light_cfg::PROFILE_LEN]>; light_cfg::USER_PROFILE_COUNT as usize],
}

impl LightingState {
    /// Cached payload of user profile `profile` (1-based)
    pub fn profile_bytes(&self, profile: u8) -> Option<[u8; light_cfg::PROFILE_LEN]> {
        let slot = light_cfg::user_profile_index(profile)? - light_cfg::USER_PROFILE_1;
        self.profiles[slot as usize]
    }

    pub(crate) fn store_profile(&mut self, index: u8, bytes: [u8; light_cfg::PROFILE_LEN]) {
        if light_cfg::is_user_profile(index) {
            self.profiles[(index - light_cfg::USER_PROFILE_1) as usize] = Some(bytes);
        }
    }
}

/// Everything the session knows about the device
#[derive(Debug, Clone)]
pub struct DeviceState {
    pub mcu_id: McuId,
    pub version: McuVersion,
    pub outcome: Outcome,
    /// Single byte returned by the last get
    pub value: u8,
    /// Profile payload returned by the last profile get
    pub profile: Option<[u8; light_cfg::PROFILE_LEN]>,
    pub lighting: LightingState,
    /// Request currently waiting for its reply
    pub in_flight: Option<CommandReport>,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            mcu_id: McuId::default(),
            version: McuVersion::default(),
            outcome: Outcome::Pending,
            value: 0,
            profile: None,
            lighting: LightingState::default(),
            in_flight: None,
        }
    }
}

impl DeviceState {
    /// Reset the per-transaction fields and record the outgoing request
    pub(crate) fn begin(&mut self, request: CommandReport) {
        self.outcome = Outcome::Pending;
        self.value = 0;
        self.profile = None;
        self.in_flight = Some(request);
    }

    /// Snapshot the per-transaction fields and forget the request
    pub(crate) fn finish(&mut self) -> (Outcome, u8, Option<[u8; light_cfg::PROFILE_LEN]>) {
        self.in_flight = None;
        (self.outcome, self.value, self.profile)
    }
}

/// State shared with the transport's delivery context
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub state: Mutex<DeviceState>,
    pub completion: Completion,
}

struct SessionInner {
    shared: Arc<Shared>,
    correlator: Correlator,
    transport: BoxedTransport,
    led: Arc<dyn MultiColorLed>,
    config: SessionConfig,
    cancel: CancellationToken,
    startup: Mutex<Option<JoinHandle<Result<StartupReport, ConfigError>>>>,
}

/// One attached controller
///
/// Cheap to clone; all clones refer to the same device. All device state is
/// mutated through [`DeviceSession::call`] and the frame handler registered
/// on attach.
#[derive(Clone)]
pub struct DeviceSession {
    inner: Arc<SessionInner>,
}

impl DeviceSession {
    /// Attach to a transport: register the frame handler and, if configured,
    /// schedule the startup fetch. Must be called within a Tokio runtime when
    /// `fetch_on_attach` is set.
    pub fn attach(
        transport: BoxedTransport,
        led: Arc<dyn MultiColorLed>,
        config: SessionConfig,
    ) -> Self {
        let shared = Arc::new(Shared::default());
        let cancel = CancellationToken::new();

        let handler_shared = shared.clone();
        transport.set_frame_handler(Some(Arc::new(move |frame: &[u8]| {
            dispatch::handle_frame(&handler_shared, frame)
        })));

        let correlator = Correlator::new(
            transport.clone(),
            shared.clone(),
            config.command_timeout,
            cancel.clone(),
        );

        let info = transport.device_info();
        info!(
            "Attached {:?} device {:04X}:{:04X} ({})",
            info.transport_type, info.vid, info.pid, info.device_path
        );

        let session = Self {
            inner: Arc::new(SessionInner {
                shared,
                correlator,
                transport,
                led,
                config,
                cancel,
                startup: Mutex::new(None),
            }),
        };

        if config.fetch_on_attach {
            session.schedule_startup();
        }
        session
    }

    /// Cancel the startup task, wait for it, then release the transport
    pub async fn detach(&self) -> Result<(), ConfigError> {
        debug!("Detaching session");
        self.inner.cancel.cancel();
        if let Some(Err(e)) = self.join_startup().await {
            debug!("Startup task ended with: {}", e);
        }
        self.inner.transport.set_frame_handler(None);
        self.inner.transport.close().await?;
        Ok(())
    }

    /// Whether [`DeviceSession::detach`] has been called
    pub fn is_detached(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Run one command/response transaction
    pub async fn call(&self, command: u8, index: u8, request: &[u8]) -> Result<Reply, ConfigError> {
        self.inner.correlator.call(command, index, request).await
    }

    // === Snapshots ===

    pub fn state(&self) -> DeviceState {
        self.inner.shared.state.lock().clone()
    }

    pub fn mcu_id(&self) -> McuId {
        self.inner.shared.state.lock().mcu_id
    }

    pub fn version(&self) -> McuVersion {
        self.inner.shared.state.lock().version
    }

    pub fn lighting(&self) -> LightingState {
        self.inner.shared.state.lock().lighting.clone()
    }

    pub fn completion_state(&self) -> CompletionState {
        self.inner.shared.completion.state()
    }

    pub fn led(&self) -> &Arc<dyn MultiColorLed> {
        &self.inner.led
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn device_info(&self) -> &TransportDeviceInfo {
        self.inner.transport.device_info()
    }

    // === Startup task plumbing ===

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.inner.cancel
    }

    pub(crate) fn set_startup_handle(
        &self,
        handle: JoinHandle<Result<StartupReport, ConfigError>>,
    ) {
        *self.inner.startup.lock() = Some(handle);
    }

    /// Await the scheduled startup fetch; `None` if none is pending
    pub async fn join_startup(&self) -> Option<Result<StartupReport, ConfigError>> {
        let handle = self.inner.startup.lock().take()?;
        Some(match handle.await {
            Ok(result) => result,
            Err(e) => Err(TransportError::Internal(format!("startup task: {e}")).into()),
        })
    }
}
