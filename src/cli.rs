// CLI definitions using clap

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "legos-driver")]
#[command(author, version, about = "Legion Go S controller configuration tool")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Talk to an in-process simulated MCU instead of the controller
    #[arg(long, global = true)]
    pub simulate: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    // === Query Commands ===
    /// Show MCU id, firmware version and lighting state
    #[command(visible_aliases = ["version", "ver"])]
    Info,

    /// List controllers found on USB
    #[command(visible_alias = "ls")]
    List,

    /// List configuration endpoints with their allowed values
    #[command(visible_alias = "props")]
    Endpoints,

    /// Read one property
    #[command(visible_alias = "g")]
    Get {
        /// Property group (gamepad, imu, mcu, mouse, rgb, touchpad)
        group: String,
        /// Property name
        name: String,
    },

    /// Show the allowed values of a property
    #[command(visible_alias = "opts")]
    Options { group: String, name: String },

    /// Read a user lighting profile
    #[command(visible_alias = "p")]
    Profile {
        /// Profile number (1-3)
        #[arg(value_parser = clap::value_parser!(u8).range(1..4))]
        profile: u8,
    },

    // === Set Commands ===
    /// Write one property
    #[command(visible_alias = "s")]
    Set {
        group: String,
        name: String,
        /// New value, as listed by `options`
        value: String,
    },

    /// Set joystick ring brightness on the active profile (custom mode only)
    #[command(visible_alias = "b")]
    Brightness {
        /// Brightness, clamped to the light device maximum
        value: u8,
    },

    /// Set joystick ring color on the active profile (custom mode only)
    #[command(visible_alias = "c")]
    Color {
        /// Color as RRGGBB or #RRGGBB
        hex: String,
    },
}
