//! Response dispatcher
//!
//! Runs on the transport's delivery context for every inbound frame: decode,
//! fold into the session state, wake the waiting call. Never blocks beyond the
//! short state lock.

use legos_transport::protocol::{cmd, light_cfg, status, test_index};
use legos_transport::{CommandReport, FrameError};
use tracing::{debug, warn};

use crate::identity::{McuId, McuVersion};
use crate::session::{DeviceState, Outcome, Shared};

/// Typed meaning of one reply frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Version(McuVersion),
    McuId(McuId),
    /// Single-byte get reply (gamepad, touchpad, test readouts)
    Value { command: u8, index: u8, value: u8 },
    LightMode(u8),
    LightProfile(u8),
    Profile {
        index: u8,
        bytes: [u8; light_cfg::PROFILE_LEN],
    },
    /// Reply to any set: first payload byte is the device status
    Status { command: u8, index: u8, status: u8 },
    Unhandled { command: u8, index: u8 },
}

/// Decode a reply by command code and, where multiplexed, by index
pub fn decode_response(report: &CommandReport) -> Response {
    let (command, index) = (report.cmd, report.sub_cmd);
    match command {
        cmd::GET_VERSION => Response::Version(McuVersion::from_report(report)),
        cmd::GET_MCU_ID => Response::McuId(McuId::from_report(report)),
        cmd::GET_GAMEPAD_CFG | cmd::GET_TP_PARAM => Response::Value {
            command,
            index,
            value: report.data[0],
        },
        cmd::GET_PL_TEST if test_index::is_readout(index) => Response::Value {
            command,
            index,
            value: report.data[0],
        },
        cmd::GET_LIGHT_CFG => match index {
            light_cfg::MODE_SEL => Response::LightMode(report.data[0]),
            light_cfg::PROFILE_SEL => Response::LightProfile(report.data[0]),
            i if light_cfg::is_user_profile(i) => {
                let mut bytes = [0u8; light_cfg::PROFILE_LEN];
                bytes.copy_from_slice(&report.data[..light_cfg::PROFILE_LEN]);
                Response::Profile { index, bytes }
            }
            _ => Response::Unhandled { command, index },
        },
        c if cmd::is_set(c) || c == cmd::SET_PL_TEST => Response::Status {
            command,
            index,
            status: report.data[0],
        },
        _ => Response::Unhandled { command, index },
    }
}

impl DeviceState {
    /// Update the caches carried by a reply
    fn apply_cache(&mut self, response: &Response) {
        match *response {
            Response::Version(version) => self.version = version,
            Response::McuId(id) => self.mcu_id = id,
            Response::LightMode(mode) => self.lighting.mode = Some(mode),
            Response::LightProfile(profile) => self.lighting.profile = Some(profile),
            Response::Profile { index, bytes } => self.lighting.store_profile(index, bytes),
            Response::Value { .. } | Response::Status { .. } | Response::Unhandled { .. } => {}
        }
    }

    /// Record the transaction outcome for the waiting call
    fn record_outcome(&mut self, response: &Response) {
        match *response {
            Response::Version(_) | Response::McuId(_) => self.outcome = Outcome::Ok,
            Response::Value { value, .. }
            | Response::LightMode(value)
            | Response::LightProfile(value) => {
                self.value = value;
                self.outcome = Outcome::Ok;
            }
            Response::Profile { bytes, .. } => {
                self.profile = Some(bytes);
                self.outcome = Outcome::Ok;
            }
            Response::Status { status, .. } if status == status::ACCEPTED => {
                self.outcome = Outcome::Ok;
                self.commit_light_write();
            }
            Response::Status { status, .. } => self.outcome = Outcome::Status(status),
            Response::Unhandled { .. } => self.outcome = Outcome::Unhandled,
        }
    }

    /// Fold an accepted SET_LIGHT_CFG request into the lighting cache
    fn commit_light_write(&mut self) {
        let Some(request) = self.in_flight else {
            return;
        };
        if request.cmd != cmd::SET_LIGHT_CFG {
            return;
        }
        match request.sub_cmd {
            light_cfg::MODE_SEL => self.lighting.mode = Some(request.data[0]),
            light_cfg::PROFILE_SEL => self.lighting.profile = Some(request.data[0]),
            index => {
                let mut bytes = [0u8; light_cfg::PROFILE_LEN];
                bytes.copy_from_slice(&request.data[..light_cfg::PROFILE_LEN]);
                self.lighting.store_profile(index, bytes);
            }
        }
    }

    /// Whether a reply answers the request currently in flight.
    ///
    /// A reply that cannot be decoded ends the in-flight call whatever its
    /// command; decoded replies must match the request.
    fn is_awaited(&self, report: &CommandReport, response: &Response) -> bool {
        match self.in_flight {
            Some(_) if matches!(response, Response::Unhandled { .. }) => true,
            // Identity replies reuse the index slot for data
            Some(req) if matches!(req.cmd, cmd::GET_VERSION | cmd::GET_MCU_ID) => {
                req.cmd == report.cmd
            }
            Some(req) => req.cmd == report.cmd && req.sub_cmd == report.sub_cmd,
            None => false,
        }
    }
}

/// Frame intake entry point registered with the transport.
///
/// Returns an error for frames of the wrong size, device-reported failures,
/// and replies that could not be decoded, whether or not a call was waiting.
pub(crate) fn handle_frame(shared: &Shared, frame: &[u8]) -> Result<(), FrameError> {
    let report = CommandReport::parse(frame)?;
    let response = decode_response(&report);

    let awaited = {
        let mut state = shared.state.lock();
        state.apply_cache(&response);
        let awaited = state.is_awaited(&report, &response);
        if awaited {
            state.record_outcome(&response);
        }
        awaited
    };

    if awaited {
        debug!(
            "RX {} index 0x{:02X}: {:?}",
            report.command_name(),
            report.sub_cmd,
            response
        );
        shared.completion.publish();
    } else {
        warn!(
            "Unsolicited reply {} index 0x{:02X}: {:02X?}",
            report.command_name(),
            report.sub_cmd,
            &report.data[..8]
        );
    }

    match response {
        Response::Status { command, status, .. } if status != status::ACCEPTED => {
            Err(FrameError::Status { command, status })
        }
        Response::Unhandled { command, index } => Err(FrameError::Unhandled { command, index }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionState;
    use legos_transport::protocol::{gamepad_cfg, touchpad_cfg, FRAME_SIZE};

    fn report(command: u8, index: u8, payload: &[u8]) -> CommandReport {
        CommandReport::new(command, index, payload).unwrap()
    }

    fn in_flight(shared: &Shared, command: u8, index: u8, payload: &[u8]) {
        shared.state.lock().begin(report(command, index, payload));
        shared.completion.arm();
    }

    #[test]
    fn test_decode_keyed_gets() {
        let r = report(cmd::GET_TP_PARAM, touchpad_cfg::LINUX_MODE, &[1]);
        assert_eq!(
            decode_response(&r),
            Response::Value {
                command: cmd::GET_TP_PARAM,
                index: touchpad_cfg::LINUX_MODE,
                value: 1
            }
        );
        let r = report(cmd::GET_PL_TEST, test_index::IMU_MANUFACTURER, &[2]);
        assert!(matches!(decode_response(&r), Response::Value { value: 2, .. }));
    }

    #[test]
    fn test_decode_light_config_branches() {
        assert_eq!(
            decode_response(&report(cmd::GET_LIGHT_CFG, light_cfg::MODE_SEL, &[1])),
            Response::LightMode(1)
        );
        assert_eq!(
            decode_response(&report(cmd::GET_LIGHT_CFG, light_cfg::PROFILE_SEL, &[2])),
            Response::LightProfile(2)
        );
        assert_eq!(
            decode_response(&report(
                cmd::GET_LIGHT_CFG,
                light_cfg::USER_PROFILE_2,
                &[3, 10, 20, 30, 80, 50]
            )),
            Response::Profile {
                index: light_cfg::USER_PROFILE_2,
                bytes: [3, 10, 20, 30, 80, 50]
            }
        );
        assert!(matches!(
            decode_response(&report(cmd::GET_LIGHT_CFG, 0x09, &[])),
            Response::Unhandled { .. }
        ));
    }

    #[test]
    fn test_decode_unhandled_codes() {
        assert!(matches!(
            decode_response(&report(cmd::GET_PL_TEST, test_index::STICK_CALI_TH, &[1])),
            Response::Unhandled { .. }
        ));
        assert!(matches!(
            decode_response(&report(cmd::GET_KEY_MAP, 0, &[])),
            Response::Unhandled { .. }
        ));
    }

    #[test]
    fn test_awaited_value_publishes() {
        let shared = Shared::default();
        in_flight(&shared, cmd::GET_GAMEPAD_CFG, gamepad_cfg::MOUSE_WHEEL_STEP, &[]);

        let frame = report(cmd::GET_GAMEPAD_CFG, gamepad_cfg::MOUSE_WHEEL_STEP, &[9]).to_frame();
        assert_eq!(handle_frame(&shared, &frame), Ok(()));

        let state = shared.state.lock();
        assert_eq!(state.outcome, Outcome::Ok);
        assert_eq!(state.value, 9);
        assert_eq!(shared.completion.state(), CompletionState::Published);
    }

    #[test]
    fn test_nonzero_status_is_reported_even_unsolicited() {
        let shared = Shared::default();
        let frame = report(cmd::SET_GAMEPAD_CFG, gamepad_cfg::GAMEPAD_MODE, &[3]).to_frame();
        assert_eq!(
            handle_frame(&shared, &frame),
            Err(FrameError::Status {
                command: cmd::SET_GAMEPAD_CFG,
                status: 3
            })
        );
        assert_eq!(shared.state.lock().outcome, Outcome::Pending);
        assert_eq!(shared.completion.state(), CompletionState::Armed);
    }

    #[test]
    fn test_unsolicited_identity_still_updates_cache() {
        let shared = Shared::default();
        let frame = report(cmd::GET_VERSION, 0x05, &[0x0A, 0x02, 0x01]).to_frame();
        assert_eq!(handle_frame(&shared, &frame), Ok(()));
        assert_eq!(shared.state.lock().version.0, [1, 2, 0x0A, 5]);
        assert_eq!(shared.completion.state(), CompletionState::Armed);
    }

    #[test]
    fn test_unhandled_reply_records_outcome() {
        let shared = Shared::default();
        in_flight(&shared, cmd::GET_KEY_MAP, 0, &[]);
        let frame = report(cmd::GET_KEY_MAP, 0, &[]).to_frame();
        assert_eq!(
            handle_frame(&shared, &frame),
            Err(FrameError::Unhandled {
                command: cmd::GET_KEY_MAP,
                index: 0
            })
        );
        assert_eq!(shared.state.lock().outcome, Outcome::Unhandled);
    }

    #[test]
    fn test_unhandled_code_ends_any_inflight_call() {
        let shared = Shared::default();
        in_flight(&shared, cmd::GET_GAMEPAD_CFG, gamepad_cfg::MOUSE_WHEEL_STEP, &[]);
        let frame = report(0xFF, 0, &[0x16]).to_frame();
        assert_eq!(
            handle_frame(&shared, &frame),
            Err(FrameError::Unhandled {
                command: 0xFF,
                index: 0
            })
        );
        assert_eq!(shared.state.lock().outcome, Outcome::Unhandled);
        assert_eq!(shared.completion.state(), CompletionState::Published);
    }

    #[test]
    fn test_unhandled_code_without_call_publishes_nothing() {
        let shared = Shared::default();
        let frame = report(0xFF, 0, &[0x16]).to_frame();
        assert!(handle_frame(&shared, &frame).is_err());
        assert_eq!(shared.state.lock().outcome, Outcome::Pending);
        assert_eq!(shared.completion.state(), CompletionState::Armed);
    }

    #[test]
    fn test_wrong_size_frame_is_rejected_untouched() {
        let shared = Shared::default();
        in_flight(&shared, cmd::GET_VERSION, 0, &[]);
        assert_eq!(
            handle_frame(&shared, &[cmd::GET_VERSION; 10]),
            Err(FrameError::Size {
                expected: FRAME_SIZE,
                actual: 10
            })
        );
        assert_eq!(shared.completion.state(), CompletionState::Armed);
    }

    #[test]
    fn test_accepted_light_write_commits_request() {
        let shared = Shared::default();
        in_flight(&shared, cmd::SET_LIGHT_CFG, light_cfg::USER_PROFILE_3, &[2, 1, 2, 3, 4, 5]);
        let frame = report(cmd::SET_LIGHT_CFG, light_cfg::USER_PROFILE_3, &[0]).to_frame();
        assert_eq!(handle_frame(&shared, &frame), Ok(()));
        assert_eq!(
            shared.state.lock().lighting.profile_bytes(3),
            Some([2, 1, 2, 3, 4, 5])
        );
    }

    #[test]
    fn test_rejected_light_write_leaves_cache() {
        let shared = Shared::default();
        in_flight(&shared, cmd::SET_LIGHT_CFG, light_cfg::MODE_SEL, &[1]);
        let frame = report(cmd::SET_LIGHT_CFG, light_cfg::MODE_SEL, &[1]).to_frame();
        assert!(handle_frame(&shared, &frame).is_err());
        let state = shared.state.lock();
        assert_eq!(state.lighting.mode, None);
        assert_eq!(state.outcome, Outcome::Status(1));
    }
}
