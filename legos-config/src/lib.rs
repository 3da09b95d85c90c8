//! Configuration session for the Legion Go S controller MCU
//!
//! This crate layers a synchronous call/response interface on top of any
//! [`legos_transport::Transport`]:
//!
//! ```text
//! [surface / property / rgb]   typed accessors, validation, text mapping
//!            |
//!      [correlator]            one command in flight, bounded wait
//!            |        ^
//!        transport -> [dispatch]   decode reply, update state, wake caller
//! ```

pub mod completion;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod led;
pub mod property;
pub mod rgb;
pub mod session;
pub mod startup;
pub mod surface;

mod correlator;

pub use completion::{Completion, CompletionState, WaitOutcome};
pub use correlator::Reply;
pub use dispatch::{decode_response, Response};
pub use error::{ConfigError, ErrorCategory};
pub use identity::{McuId, McuVersion};
pub use led::{LightDevice, MultiColorLed, ProfileRecord, RgbColor, RgbEffect, RgbMode};
pub use property::{PropertyDescriptor, ValueRule, PROPERTIES};
pub use session::{DeviceSession, DeviceState, LightingState, Outcome, SessionConfig};
pub use startup::{FetchOutcome, StartupReport};
pub use surface::{endpoints, lookup, options, Endpoint, EndpointInfo};
