//! Deferred startup fetch
//!
//! The MCU locks up if it is sent commands right after enumeration, so the
//! first fetch runs on a task scheduled a short delay after attach.

use legos_transport::protocol::cmd;
use legos_transport::TransportError;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::ConfigError;
use crate::led::{ProfileRecord, RgbMode};
use crate::session::DeviceSession;

/// Whether an identity fetch hit the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    Fetched,
    /// Already known, no frame sent
    Cached,
}

/// What the startup fetch learned
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StartupReport {
    /// MCU id was already cached; the fetch stopped without sending anything
    AlreadyFetched,
    Fetched {
        version: FetchOutcome,
        mode: RgbMode,
        profile: u8,
        record: ProfileRecord,
    },
}

impl DeviceSession {
    /// Fetch the MCU identifier unless it is already cached
    pub async fn fetch_mcu_id(&self) -> Result<FetchOutcome, ConfigError> {
        if self.mcu_id().is_known() {
            debug!("MCU id already cached");
            return Ok(FetchOutcome::Cached);
        }
        self.call(cmd::GET_MCU_ID, 0, &[]).await?.answered()?;
        Ok(FetchOutcome::Fetched)
    }

    /// Fetch the firmware version unless it is already cached
    pub async fn fetch_version(&self) -> Result<FetchOutcome, ConfigError> {
        if self.version().is_known() {
            debug!("Firmware version already cached");
            return Ok(FetchOutcome::Cached);
        }
        self.call(cmd::GET_VERSION, 0, &[]).await?.answered()?;
        Ok(FetchOutcome::Fetched)
    }

    /// Fetch identity, version and lighting state, stopping at the first failure.
    ///
    /// A cached MCU id means the fetch already ran; nothing is sent then.
    pub async fn run_startup(&self) -> Result<StartupReport, ConfigError> {
        if self.fetch_mcu_id().await? == FetchOutcome::Cached {
            debug!("Startup fetch already done");
            return Ok(StartupReport::AlreadyFetched);
        }
        let version = self.fetch_version().await?;
        let mode = self.get_rgb_mode().await?;
        let profile = self.get_rgb_profile().await?;
        let record = self.read_profile(profile).await?;

        info!(
            "MCU {} firmware {} lighting {} profile {}",
            self.mcu_id(),
            self.version(),
            mode.name(),
            profile
        );
        Ok(StartupReport::Fetched {
            version,
            mode,
            profile,
            record,
        })
    }

    /// Spawn the startup fetch after the configured delay
    pub(crate) fn schedule_startup(&self) {
        let session = self.clone();
        let cancel = self.cancel_token().clone();
        let delay = self.config().startup_delay;

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Startup fetch cancelled before it ran");
                    return Err(TransportError::Disconnected.into());
                }
                _ = tokio::time::sleep(delay) => {}
            }
            let result = session.run_startup().await;
            if let Err(e) = &result {
                error!("Startup fetch failed: {}", e);
            }
            result
        });
        self.set_startup_handle(handle);
    }
}
