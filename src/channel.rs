//! Capabilities the driver consumes from its hardware backend.
//!
//! A backend supplies a transmit channel that serializes bytes onto the wire
//! and an encoder that turns pixel bytes into whatever the channel emits.
//! The driver only sequences calls on them; it never looks inside.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{EncoderConfig, TxChannelConfig};
use crate::error::HardwareError;

/// Per-transmission options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransmitConfig {
    /// Extra repeats of the payload; 0 sends it once
    pub loop_count: u32,
}

/// Converts pixel bytes into the symbols a channel puts on the wire
pub trait Encoder: Send {
    /// Append the encoded form of `payload` to `out`
    fn encode(&mut self, payload: &[u8], out: &mut Vec<u8>);

    /// Release the encoder
    fn delete(self: Box<Self>) -> Result<(), HardwareError>;
}

/// A hardware transmit channel
pub trait TxChannel: Send {
    fn enable(&mut self) -> Result<(), HardwareError>;

    /// Queue `payload` for transmission through `encoder`
    fn transmit(
        &mut self,
        encoder: &mut dyn Encoder,
        payload: &[u8],
        config: &TransmitConfig,
    ) -> Result<(), HardwareError>;

    /// Block until every queued transmission has finished.
    ///
    /// `None` waits without limit. Implementations must return
    /// [`HardwareError::Cancelled`] soon after `cancel` fires.
    fn wait_all_done(
        &mut self,
        timeout: Option<Duration>,
        cancel: &CancelToken,
    ) -> Result<(), HardwareError>;

    fn disable(&mut self) -> Result<(), HardwareError>;

    /// Release the channel
    fn delete(self: Box<Self>) -> Result<(), HardwareError>;
}

pub trait ChannelProvider {
    fn new_tx_channel(&mut self, config: &TxChannelConfig)
        -> Result<Box<dyn TxChannel>, HardwareError>;
}

pub trait EncoderProvider {
    fn new_encoder(&mut self, config: &EncoderConfig) -> Result<Box<dyn Encoder>, HardwareError>;
}

/// Shared flag that aborts a blocking wait
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Re-arm the token after a cancelled wait
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Relaxed);
    }
}
