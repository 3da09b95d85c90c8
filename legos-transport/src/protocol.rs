//! Protocol constants for the Legion Go S controller MCU configuration channel

/// Full frame size on the configuration interface (one HID report, no report ID)
pub const FRAME_SIZE: usize = 64;

/// Header bytes in front of the payload: command, sub-command/index
pub const HEADER_SIZE: usize = 2;

/// Payload region carried by every frame
pub const PAYLOAD_LEN: usize = FRAME_SIZE - HEADER_SIZE;

/// MCU command codes (MCU_COMMAND)
pub mod cmd {
    pub const SEND_HEARTBEAT: u8 = 0x00;
    pub const GET_VERSION: u8 = 0x01;
    pub const GET_MCU_ID: u8 = 0x02;
    pub const GET_GAMEPAD_CFG: u8 = 0x03;
    pub const SET_GAMEPAD_CFG: u8 = 0x04;
    pub const GET_TP_PARAM: u8 = 0x05;
    pub const SET_TP_PARAM: u8 = 0x06;
    pub const GET_MOTOR_CFG: u8 = 0x07;
    pub const SET_MOTOR_CFG: u8 = 0x08;
    pub const GET_TRIGGER_CFG: u8 = 0x09;
    pub const SET_TRIGGER_CFG: u8 = 0x0A;
    pub const GET_STICK_CFG: u8 = 0x0B;
    pub const SET_STICK_CFG: u8 = 0x0C;
    pub const GET_GYRO_CFG: u8 = 0x0D;
    pub const SET_GYRO_CFG: u8 = 0x0E;
    pub const GET_LIGHT_CFG: u8 = 0x0F;
    pub const SET_LIGHT_CFG: u8 = 0x10;
    pub const GET_KEY_MAP: u8 = 0x11;
    pub const SET_KEY_MAP: u8 = 0x12;
    pub const INT_EVENT_REPORT: u8 = 0xC0;
    pub const INT_EVENT_CLEAR: u8 = 0xC1;
    pub const GET_PL_TEST: u8 = 0xDF;
    pub const SET_PL_TEST: u8 = 0xE0;
    pub const START_IAP_UPGRADE: u8 = 0xE1;
    pub const DBG_CTRL: u8 = 0xE2;
    pub const PL_TP_TEST: u8 = 0xE3;
    pub const RESTORE_FACTORY: u8 = 0xE4;
    pub const IC_RESET: u8 = 0xE5;

    /// Get human-readable name for command byte
    pub fn name(cmd: u8) -> &'static str {
        match cmd {
            SEND_HEARTBEAT => "SEND_HEARTBEAT",
            GET_VERSION => "GET_VERSION",
            GET_MCU_ID => "GET_MCU_ID",
            GET_GAMEPAD_CFG => "GET_GAMEPAD_CFG",
            SET_GAMEPAD_CFG => "SET_GAMEPAD_CFG",
            GET_TP_PARAM => "GET_TP_PARAM",
            SET_TP_PARAM => "SET_TP_PARAM",
            GET_MOTOR_CFG => "GET_MOTOR_CFG",
            SET_MOTOR_CFG => "SET_MOTOR_CFG",
            GET_TRIGGER_CFG => "GET_TRIGGER_CFG",
            SET_TRIGGER_CFG => "SET_TRIGGER_CFG",
            GET_STICK_CFG => "GET_STICK_CFG",
            SET_STICK_CFG => "SET_STICK_CFG",
            GET_GYRO_CFG => "GET_GYRO_CFG",
            SET_GYRO_CFG => "SET_GYRO_CFG",
            GET_LIGHT_CFG => "GET_LIGHT_CFG",
            SET_LIGHT_CFG => "SET_LIGHT_CFG",
            GET_KEY_MAP => "GET_KEY_MAP",
            SET_KEY_MAP => "SET_KEY_MAP",
            INT_EVENT_REPORT => "INT_EVENT_REPORT",
            INT_EVENT_CLEAR => "INT_EVENT_CLEAR",
            GET_PL_TEST => "GET_PL_TEST",
            SET_PL_TEST => "SET_PL_TEST",
            START_IAP_UPGRADE => "START_IAP_UPGRADE",
            DBG_CTRL => "DBG_CTRL",
            PL_TP_TEST => "PL_TP_TEST",
            RESTORE_FACTORY => "RESTORE_FACTORY",
            IC_RESET => "IC_RESET",
            _ => "UNKNOWN",
        }
    }

    /// Whether a command code writes configuration (its reply is a status byte)
    pub fn is_set(cmd: u8) -> bool {
        matches!(
            cmd,
            SET_GAMEPAD_CFG
                | SET_TP_PARAM
                | SET_MOTOR_CFG
                | SET_TRIGGER_CFG
                | SET_STICK_CFG
                | SET_GYRO_CFG
                | SET_LIGHT_CFG
                | SET_KEY_MAP
        )
    }

    /// The GET command that reads back what a SET command writes
    pub fn get_for_set(cmd: u8) -> Option<u8> {
        if is_set(cmd) {
            Some(cmd - 1)
        } else {
            None
        }
    }
}

/// GET/SET_GAMEPAD_CFG indices
pub mod gamepad_cfg {
    pub const NONE: u8 = 0x00;
    pub const GAMEPAD_MODE: u8 = 0x01;
    /// 0-255 (minutes)
    pub const AUTO_SLEEP_TIME: u8 = 0x04;
    pub const IMU_BYPASS: u8 = 0x05;
    pub const LIGHT_ENABLE: u8 = 0x06;
    pub const IMU_ENABLE: u8 = 0x07;
    pub const TOUCHPAD_ENABLE: u8 = 0x08;
    pub const OS_TYPE: u8 = 0x0A;
    pub const POLL_RATE: u8 = 0x10;
    pub const DPAD_MODE: u8 = 0x11;
    /// 1-127
    pub const MOUSE_WHEEL_STEP: u8 = 0x12;
}

/// GET/SET_TP_PARAM indices
pub mod touchpad_cfg {
    pub const WINDOWS_MODE: u8 = 0x03;
    pub const LINUX_MODE: u8 = 0x04;
}

/// GET/SET_LIGHT_CFG indices
pub mod light_cfg {
    pub const MODE_SEL: u8 = 0x01;
    pub const PROFILE_SEL: u8 = 0x02;
    pub const USER_PROFILE_1: u8 = 0x03;
    pub const USER_PROFILE_2: u8 = 0x04;
    pub const USER_PROFILE_3: u8 = 0x05;

    /// Number of user lighting profiles
    pub const USER_PROFILE_COUNT: u8 = 3;

    /// Bytes in a user profile payload: effect, R, G, B, brightness, speed
    pub const PROFILE_LEN: usize = 6;

    /// Light config index for user profile `n` (1-based)
    pub fn user_profile_index(profile: u8) -> Option<u8> {
        if (1..=USER_PROFILE_COUNT).contains(&profile) {
            Some(profile + 2)
        } else {
            None
        }
    }

    /// Whether the index selects one of the user profiles
    pub fn is_user_profile(index: u8) -> bool {
        (USER_PROFILE_1..=USER_PROFILE_3).contains(&index)
    }
}

/// GET/SET_PL_TEST indices (production-line test and calibration)
pub mod test_index {
    pub const TEST_EN: u8 = 0x01;
    pub const TP_MANUFACTURER: u8 = 0x02;
    pub const IMU_MANUFACTURER: u8 = 0x03;
    pub const TP_VERSION: u8 = 0x04;
    pub const MOTOR_F0_CALI: u8 = 0x10;
    pub const READ_MOTOR_F0: u8 = 0x11;
    pub const SAVE_MOTOR_F0: u8 = 0x12;
    pub const TEST_LED_L: u8 = 0x20;
    pub const TEST_LED_R: u8 = 0x21;
    pub const LED_COLOR_CALI: u8 = 0x22;
    pub const STICK_CALI_TH: u8 = 0x30;
    pub const TRIGGER_CALI_TH: u8 = 0x31;
    pub const STICK_CALI_DEAD: u8 = 0x32;
    pub const TRIGGER_CALI_DEAD: u8 = 0x33;
    pub const STICK_CALI_POLARITY: u8 = 0x34;
    pub const TRIGGER_CALI_POLARITY: u8 = 0x35;
    pub const GYRO_CALI_CFG: u8 = 0x36;
    pub const STICK_CALI_TOUT: u8 = 0x37;
    pub const TRIGGER_CALI_TOUT: u8 = 0x38;

    /// Indices whose reply carries a single readout byte
    pub fn is_readout(index: u8) -> bool {
        matches!(index, TP_MANUFACTURER | IMU_MANUFACTURER | TP_VERSION)
    }
}

/// Status byte values carried in SET replies
pub mod status {
    /// Request accepted by the MCU
    pub const ACCEPTED: u8 = 0x00;
    /// Local "invalid argument" outcome for replies that cannot be decoded
    pub const INVALID_ARGUMENT: u8 = 22;
}

/// Timing constants for the configuration channel
pub mod timing {
    /// Upper bound on waiting for a reply (ms), measured on the Go S MCU
    pub const COMMAND_TIMEOUT_MS: u64 = 5;
    /// Delay between attach and the first command (ms); earlier commands lock up the MCU
    pub const STARTUP_DELAY_MS: u64 = 2;
    /// Reader thread poll timeout (ms), only bounds shutdown latency
    pub const READ_TIMEOUT_MS: i32 = 5;
    /// Reader thread back-off after a read error (ms)
    pub const ERROR_SLEEP_MS: u64 = 100;
}

/// Device identification constants
pub mod device {
    /// QinHeng vendor ID used by the Legion Go S controller
    pub const VENDOR_ID: u16 = 0x1A86;
    /// Legion Go S in XInput mode
    pub const PID_GO_S_XINPUT: u16 = 0xE310;
    /// Legion Go S in DInput mode
    pub const PID_GO_S_DINPUT: u16 = 0xE311;
    /// Default USB interface number of the configuration endpoint
    pub const CONFIG_INTERFACE: i32 = 6;

    /// All known product IDs
    pub const PRODUCT_IDS: &[u16] = &[PID_GO_S_XINPUT, PID_GO_S_DINPUT];

    /// Check if a VID/PID pair is a supported controller
    pub fn is_supported(vid: u16, pid: u16) -> bool {
        vid == VENDOR_ID && PRODUCT_IDS.contains(&pid)
    }
}
