//! Driver for addressable LED strips (WS2812 / SK6812 and friends).
//!
//! A strip keeps its pixels in a byte buffer laid out in the strip's wire
//! order (RGB, GRB or GRBW) and pushes that buffer out through a transmit
//! channel on every refresh. Channels and encoders come from a backend that
//! implements the traits in [`channel`]; [`serial`] provides one for LED
//! controllers attached over a serial port.

pub mod buffer;
pub mod channel;
pub mod config;
pub mod engine;
pub mod error;
pub mod pixel_format;
pub mod protocol;
pub mod serial;
pub mod shared;
pub mod strip;

#[cfg(test)]
mod mock;

pub use buffer::StripBuffer;
pub use channel::{CancelToken, ChannelProvider, Encoder, EncoderProvider, TxChannel};
pub use config::{ChannelConfig, ClockSource, LedModel, StripConfig};
pub use engine::{EngineState, TransmitEngine};
pub use error::{ErrorKind, HardwareError, HardwareOp, Result, StripError};
pub use pixel_format::PixelFormat;
pub use shared::SharedStrip;
pub use strip::{ChannelStrip, LedStrip};
