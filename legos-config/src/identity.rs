//! MCU identity and firmware version

use std::fmt;

use legos_transport::CommandReport;
use serde::Serialize;

/// 12-byte MCU identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct McuId(pub [u8; 12]);

impl McuId {
    /// Reassemble from a GET_MCU_ID reply: first byte rides in the sub-command slot
    pub fn from_report(report: &CommandReport) -> Self {
        let mut id = [0u8; 12];
        id[0] = report.sub_cmd;
        id[1..].copy_from_slice(&report.data[..11]);
        Self(id)
    }

    /// An all-zero identifier means "not fetched yet"
    pub fn is_known(&self) -> bool {
        self.0.iter().any(|&b| b != 0)
    }
}

impl fmt::Display for McuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// Firmware version as (major, minor, patch, build)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct McuVersion(pub [u8; 4]);

impl McuVersion {
    /// Decode a GET_VERSION reply; the payload holds the first three parts reversed
    pub fn from_report(report: &CommandReport) -> Self {
        Self([report.data[2], report.data[1], report.data[0], report.sub_cmd])
    }

    pub fn is_known(&self) -> bool {
        self.0.iter().any(|&b| b != 0)
    }
}

impl fmt::Display for McuVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a:x}.{b:x}.{c:x}.{d:x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legos_transport::protocol::cmd;

    #[test]
    fn test_version_decode_and_display() {
        let report = CommandReport::new(cmd::GET_VERSION, 0x05, &[0x0A, 0x02, 0x01]).unwrap();
        let version = McuVersion::from_report(&report);
        assert_eq!(version.0, [0x01, 0x02, 0x0A, 0x05]);
        assert_eq!(version.to_string(), "1.2.a.5");
        assert!(version.is_known());
    }

    #[test]
    fn test_mcu_id_reassembles_sub_command_byte() {
        let payload = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];
        let report = CommandReport::new(cmd::GET_MCU_ID, 0xAB, &payload).unwrap();
        let id = McuId::from_report(&report);
        assert_eq!(id.0[0], 0xAB);
        assert_eq!(&id.0[1..], &payload);
        assert_eq!(id.to_string(), "ab0102030405060708090a0b");
    }

    #[test]
    fn test_zero_identity_is_unknown() {
        assert!(!McuId::default().is_known());
        assert!(!McuVersion::default().is_known());
    }
}
