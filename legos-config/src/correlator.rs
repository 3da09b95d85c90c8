//! Request/response correlator
//!
//! Turns the fire-and-forget transport into a single-flight call:
//!
//! ```text
//! lock token -> reset outcome, arm -> send -> wait (timeout / cancel)
//!            -> snapshot outcome, re-arm -> unlock -> map outcome
//! ```
//!
//! The protocol has no request IDs, so the token must be held for the whole
//! cycle or replies get attributed to the wrong call.

use std::sync::Arc;
use std::time::Duration;

use legos_transport::protocol::{cmd, light_cfg, FRAME_SIZE};
use legos_transport::{BoxedTransport, CommandReport, TransportError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::completion::WaitOutcome;
use crate::error::ConfigError;
use crate::session::{Outcome, Shared};

/// Successful result of one transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    /// Byte returned by a single-value get (0 for sets)
    pub value: u8,
    /// Payload returned by a user profile get
    pub profile: Option<[u8; light_cfg::PROFILE_LEN]>,
    /// How the wait ended; `Interrupted` means the result may be incomplete
    pub wait: WaitOutcome,
    /// The wait ended before the device answered; `value` and `profile` are empty
    pub unanswered: bool,
}

impl Reply {
    /// Keep the reply only if the device actually answered
    ///
    /// Reads use this so an interrupted wait never yields a made-up value.
    pub fn answered(self) -> Result<Self, ConfigError> {
        if self.unanswered {
            return Err(TransportError::Disconnected.into());
        }
        Ok(self)
    }
}

pub(crate) struct Correlator {
    transport: BoxedTransport,
    shared: Arc<Shared>,
    /// Serializes build-send-wait cycles
    token: tokio::sync::Mutex<()>,
    timeout: Duration,
    cancel: CancellationToken,
}

impl Correlator {
    pub fn new(
        transport: BoxedTransport,
        shared: Arc<Shared>,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            shared,
            token: tokio::sync::Mutex::new(()),
            timeout,
            cancel,
        }
    }

    pub async fn call(&self, command: u8, index: u8, request: &[u8]) -> Result<Reply, ConfigError> {
        if self.cancel.is_cancelled() {
            return Err(TransportError::Disconnected.into());
        }
        let report = CommandReport::new(command, index, request)?;

        let token = self.token.lock().await;

        self.shared.state.lock().begin(report);
        self.shared.completion.arm();

        debug!(
            "TX {} index 0x{:02X} args {:02X?}",
            cmd::name(command),
            index,
            request
        );
        let wait = match self.transport.send(&report.to_frame()).await {
            Ok(FRAME_SIZE) => {
                self.shared
                    .completion
                    .wait_for(self.timeout, &self.cancel)
                    .await
            }
            Ok(written) => {
                self.finish();
                return Err(TransportError::ShortWrite {
                    expected: FRAME_SIZE,
                    written,
                }
                .into());
            }
            Err(e) => {
                self.finish();
                return Err(e.into());
            }
        };

        let (outcome, value, profile) = self.finish();
        drop(token);

        match wait {
            WaitOutcome::Signaled => {}
            WaitOutcome::TimedOut => {
                warn!(
                    "No reply to {} index 0x{:02X} within {:?}",
                    cmd::name(command),
                    index,
                    self.timeout
                );
                return Err(ConfigError::Busy { command, index });
            }
            WaitOutcome::Interrupted => {
                warn!(
                    "Wait for {} index 0x{:02X} interrupted, using current state ({:?})",
                    cmd::name(command),
                    index,
                    outcome
                );
            }
        }

        match outcome {
            Outcome::Status(status) => Err(ConfigError::Device {
                command,
                index,
                status,
            }),
            Outcome::Unhandled => Err(ConfigError::UnexpectedResponse(format!(
                "unhandled reply to {} index 0x{:02X}",
                cmd::name(command),
                index
            ))),
            Outcome::Ok | Outcome::Pending => Ok(Reply {
                value,
                profile,
                wait,
                unanswered: outcome == Outcome::Pending,
            }),
        }
    }

    /// Snapshot the result and re-arm; runs before the token is released
    fn finish(&self) -> (Outcome, u8, Option<[u8; light_cfg::PROFILE_LEN]>) {
        let snapshot = self.shared.state.lock().finish();
        self.shared.completion.arm();
        snapshot
    }
}
