//! Packet codec for command and response frames
//!
//! Both directions share one fixed layout:
//!
//! ```text
//! [cmd] [sub_cmd / index] [payload ... zero padded to FRAME_SIZE]
//! ```

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::{FrameError, TransportError};
use crate::protocol::{cmd, FRAME_SIZE, PAYLOAD_LEN};

/// One configuration frame, laid out exactly as it travels on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct CommandReport {
    pub cmd: u8,
    pub sub_cmd: u8,
    pub data: [u8; PAYLOAD_LEN],
}

impl CommandReport {
    /// Build a frame, zero-padding the unused payload bytes
    pub fn new(command: u8, index: u8, payload: &[u8]) -> Result<Self, TransportError> {
        if payload.len() > PAYLOAD_LEN {
            return Err(TransportError::PayloadTooLong {
                len: payload.len(),
                max: PAYLOAD_LEN,
            });
        }
        let mut data = [0u8; PAYLOAD_LEN];
        data[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            cmd: command,
            sub_cmd: index,
            data,
        })
    }

    /// Parse a received frame; only the exact frame size is accepted
    pub fn parse(frame: &[u8]) -> Result<Self, FrameError> {
        Self::read_from_bytes(frame).map_err(|_| FrameError::Size {
            expected: FRAME_SIZE,
            actual: frame.len(),
        })
    }

    /// Wire bytes of this frame
    pub fn to_frame(&self) -> [u8; FRAME_SIZE] {
        let mut out = [0u8; FRAME_SIZE];
        out.copy_from_slice(self.as_bytes());
        out
    }

    /// Symbolic command name for logging
    pub fn command_name(&self) -> &'static str {
        cmd::name(self.cmd)
    }
}

/// Encode `(command, index, payload)` into a fixed-size frame
pub fn encode(command: u8, index: u8, payload: &[u8]) -> Result<[u8; FRAME_SIZE], TransportError> {
    Ok(CommandReport::new(command, index, payload)?.to_frame())
}

/// Decode a fixed-size frame into `(command, sub-command, payload)`
pub fn decode(frame: &[u8]) -> Result<CommandReport, FrameError> {
    CommandReport::parse(frame)
}

/// Argument bytes for a single-value write.
///
/// The MCU protocol treats a zero value as "no argument": the byte is left
/// out of the argument list and reaches the device only through the zero
/// padding of the payload region. The encoded frame is the same either way.
pub fn single_value_args(value: u8) -> Vec<u8> {
    if value == 0 {
        Vec::new()
    } else {
        vec![value]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{gamepad_cfg, HEADER_SIZE};

    #[test]
    fn test_report_layout() {
        assert_eq!(std::mem::size_of::<CommandReport>(), FRAME_SIZE);
        let frame = encode(cmd::SET_GAMEPAD_CFG, gamepad_cfg::MOUSE_WHEEL_STEP, &[42]).unwrap();
        assert_eq!(frame[0], cmd::SET_GAMEPAD_CFG);
        assert_eq!(frame[1], gamepad_cfg::MOUSE_WHEEL_STEP);
        assert_eq!(frame[2], 42);
        assert!(frame[HEADER_SIZE + 1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_decode_is_structural_inverse() {
        let payload = [3, 10, 20, 30, 80, 50];
        let frame = encode(cmd::SET_LIGHT_CFG, 0x04, &payload).unwrap();
        let report = decode(&frame).unwrap();
        assert_eq!(report.cmd, cmd::SET_LIGHT_CFG);
        assert_eq!(report.sub_cmd, 0x04);
        assert_eq!(&report.data[..6], &payload);
        assert!(report.data[6..].iter().all(|&b| b == 0));
        assert_eq!(report.to_frame(), frame);
    }

    #[test]
    fn test_decode_rejects_wrong_size() {
        assert_eq!(
            decode(&[0u8; FRAME_SIZE - 1]),
            Err(FrameError::Size {
                expected: FRAME_SIZE,
                actual: FRAME_SIZE - 1
            })
        );
        assert!(decode(&[0u8; FRAME_SIZE + 1]).is_err());
        assert!(decode(&[]).is_err());
    }

    #[test]
    fn test_full_payload_fits_and_overflow_fails() {
        let full = [0xAB; PAYLOAD_LEN];
        assert!(encode(cmd::SET_KEY_MAP, 0, &full).is_ok());

        let long = [0xAB; PAYLOAD_LEN + 1];
        assert!(matches!(
            encode(cmd::SET_KEY_MAP, 0, &long),
            Err(TransportError::PayloadTooLong { .. })
        ));
    }

    #[test]
    fn test_zero_value_aliases_empty_arguments() {
        assert!(single_value_args(0).is_empty());
        assert_eq!(single_value_args(7), vec![7]);

        let empty = encode(cmd::SET_GAMEPAD_CFG, gamepad_cfg::GAMEPAD_MODE, &single_value_args(0));
        let explicit = encode(cmd::SET_GAMEPAD_CFG, gamepad_cfg::GAMEPAD_MODE, &[0]);
        assert_eq!(empty.unwrap(), explicit.unwrap());
    }
}
