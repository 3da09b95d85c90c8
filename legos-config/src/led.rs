//! RGB lighting types and the multi-color light device

use parking_lot::Mutex;
use serde::Serialize;

use legos_transport::protocol::light_cfg::PROFILE_LEN;

use crate::error::ConfigError;

/// Maximum effect speed
pub const SPEED_MAX: u8 = 100;

/// Name of the joystick ring light device
pub const LED_NAME: &str = "go_s:rgb:joystick_rings";

/// Default ring brightness
pub const DEFAULT_BRIGHTNESS: u8 = 0x50;

/// Maximum ring brightness
pub const BRIGHTNESS_MAX: u8 = 0x64;

/// Per-channel intensity of the three ring channels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    /// Create a new RGB color
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `RRGGBB` or `#RRGGBB`
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Factory intensities of the joystick rings
    pub const DEFAULT_RINGS: Self = Self {
        r: 0x24,
        g: 0x22,
        b: 0x99,
    };
}

/// Lighting effect stored in a user profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum RgbEffect {
    Monocolor = 0,
    Breathe = 1,
    Chroma = 2,
    Rainbow = 3,
}

impl RgbEffect {
    /// Accepted tokens, index = wire value
    pub const TOKENS: &'static [&'static str] = &["monocolor", "breathe", "chroma", "rainbow"];

    /// Get effect from numeric value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Monocolor),
            1 => Some(Self::Breathe),
            2 => Some(Self::Chroma),
            3 => Some(Self::Rainbow),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        Self::TOKENS[*self as usize]
    }
}

/// Lighting mode selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum RgbMode {
    Dynamic = 0,
    Custom = 1,
}

impl RgbMode {
    pub const TOKENS: &'static [&'static str] = &["dynamic", "custom"];

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Dynamic),
            1 => Some(Self::Custom),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        Self::TOKENS[*self as usize]
    }
}

/// One user lighting profile, as stored on the MCU
///
/// Wire layout: `[effect, r, g, b, brightness, speed]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProfileRecord {
    pub effect: RgbEffect,
    pub color: RgbColor,
    pub brightness: u8,
    pub speed: u8,
}

impl ProfileRecord {
    pub fn to_bytes(&self) -> [u8; PROFILE_LEN] {
        [
            self.effect as u8,
            self.color.r,
            self.color.g,
            self.color.b,
            self.brightness,
            self.speed,
        ]
    }

    pub fn from_bytes(bytes: &[u8; PROFILE_LEN]) -> Result<Self, ConfigError> {
        let effect = RgbEffect::from_u8(bytes[0]).ok_or_else(|| {
            ConfigError::UnexpectedResponse(format!("unknown RGB effect {}", bytes[0]))
        })?;
        Ok(Self {
            effect,
            color: RgbColor::new(bytes[1], bytes[2], bytes[3]),
            brightness: bytes[4],
            speed: bytes[5],
        })
    }
}

/// Light device capability exposed to the rest of the system
pub trait MultiColorLed: Send + Sync {
    fn name(&self) -> &str;

    /// Current per-channel intensity
    fn intensity(&self) -> RgbColor;

    fn brightness(&self) -> u8;

    fn max_brightness(&self) -> u8;

    /// Push state read back from the device
    fn update(&self, color: RgbColor, brightness: u8);
}

#[derive(Debug, Clone, Copy)]
struct LedState {
    color: RgbColor,
    brightness: u8,
}

/// Three-channel light device for the joystick rings
#[derive(Debug)]
pub struct LightDevice {
    name: String,
    max_brightness: u8,
    state: Mutex<LedState>,
}

impl Default for LightDevice {
    fn default() -> Self {
        Self::new(LED_NAME, RgbColor::DEFAULT_RINGS, DEFAULT_BRIGHTNESS, BRIGHTNESS_MAX)
    }
}

impl LightDevice {
    pub fn new(name: &str, color: RgbColor, brightness: u8, max_brightness: u8) -> Self {
        Self {
            name: name.to_string(),
            max_brightness,
            state: Mutex::new(LedState {
                color,
                brightness: brightness.min(max_brightness),
            }),
        }
    }
}

impl MultiColorLed for LightDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn intensity(&self) -> RgbColor {
        self.state.lock().color
    }

    fn brightness(&self) -> u8 {
        self.state.lock().brightness
    }

    fn max_brightness(&self) -> u8 {
        self.max_brightness
    }

    fn update(&self, color: RgbColor, brightness: u8) {
        let mut state = self.state.lock();
        state.color = color;
        state.brightness = brightness.min(self.max_brightness);
    }
}
