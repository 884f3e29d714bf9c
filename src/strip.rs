use std::time::Duration;

use crate::buffer::StripBuffer;
use crate::channel::{CancelToken, ChannelProvider, EncoderProvider};
use crate::config::{ChannelConfig, EncoderConfig, StripConfig};
use crate::engine::{EngineState, TransmitEngine};
use crate::error::{HardwareOp, Result, StripError};
use crate::pixel_format::PixelFormat;

/// Operations every LED strip backend supports
pub trait LedStrip: Send {
    fn pixel_format(&self) -> PixelFormat;

    /// Number of addressable LEDs
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bytes_per_pixel(&self) -> usize;

    /// Current pixel bytes in wire order
    fn pixels(&self) -> &[u8];

    /// Set one LED on an RGB or GRB strip. Values are truncated to 8 bits.
    fn set_pixel(&mut self, index: usize, red: u32, green: u32, blue: u32) -> Result<()>;

    /// Set one LED on a GRBW strip. Values are truncated to 8 bits.
    fn set_pixel_rgbw(
        &mut self,
        index: usize,
        red: u32,
        green: u32,
        blue: u32,
        white: u32,
    ) -> Result<()>;

    /// Send the buffer to the LEDs and wait until it is out
    fn refresh(&mut self) -> Result<()>;

    /// Turn every LED off: zero the buffer, then refresh
    fn clear(&mut self) -> Result<()>;
}

/// LED strip driven through a [`TxChannel`](crate::channel::TxChannel)
pub struct ChannelStrip {
    buffer: StripBuffer,
    // Some until destroy() or Drop takes the handles; destroy consumes self,
    // so every other method sees Some
    engine: Option<TransmitEngine>,
}

impl ChannelStrip {
    /// Validate the configs, allocate the buffer and acquire a channel and an
    /// encoder. On failure everything already acquired is released again.
    pub fn create(
        strip_config: &StripConfig,
        channel_config: &ChannelConfig,
        channels: &mut dyn ChannelProvider,
        encoders: &mut dyn EncoderProvider,
    ) -> Result<Self> {
        if strip_config.pixel_format == PixelFormat::Invalid {
            log::error!("invalid led_pixel_format");
            return Err(StripError::InvalidArgument("invalid led_pixel_format"));
        }

        let buffer = StripBuffer::new(strip_config.pixel_format, strip_config.max_leds)
            .inspect_err(|e| log::error!("no mem for strip: {}", e))?;

        let tx_config = channel_config.resolve(strip_config);
        let channel = channels.new_tx_channel(&tx_config).map_err(|e| {
            log::error!("create transmit channel failed: {}", e);
            StripError::hardware(HardwareOp::CreateChannel, e)
        })?;

        let encoder_config = EncoderConfig {
            resolution_hz: tx_config.resolution_hz,
            led_model: strip_config.led_model,
        };
        let encoder = match encoders.new_encoder(&encoder_config) {
            Ok(encoder) => encoder,
            Err(e) => {
                log::error!("create LED strip encoder failed: {}", e);
                if let Err(cleanup) = channel.delete() {
                    log::warn!("rollback of transmit channel failed: {}", cleanup);
                }
                return Err(StripError::hardware(HardwareOp::CreateEncoder, e));
            }
        };

        log::info!(
            "Created {} LED {} strip on gpio {} at {} Hz",
            strip_config.max_leds,
            strip_config.pixel_format,
            strip_config.gpio_num,
            tx_config.resolution_hz
        );

        Ok(ChannelStrip {
            buffer,
            engine: Some(TransmitEngine::new(
                channel,
                encoder,
                channel_config.wait_timeout(),
            )),
        })
    }

    /// Release the channel, then the encoder, then the buffer.
    ///
    /// Stops at the first failing release; a handle not yet released is
    /// dropped without being deleted through its provider.
    pub fn destroy(mut self) -> Result<()> {
        let (channel, encoder) = self
            .engine
            .take()
            .expect("engine present until destroy")
            .into_parts();

        channel.delete().map_err(|e| {
            log::error!("delete transmit channel failed: {}", e);
            StripError::hardware(HardwareOp::DeleteChannel, e)
        })?;
        encoder.delete().map_err(|e| {
            log::error!("delete strip encoder failed: {}", e);
            StripError::hardware(HardwareOp::DeleteEncoder, e)
        })?;

        log::info!("Destroyed {} LED strip", self.buffer.len());
        Ok(())
    }

    pub fn engine_state(&self) -> EngineState {
        self.engine().state()
    }

    /// Handle that aborts an in-flight refresh wait
    pub fn cancel_token(&self) -> CancelToken {
        self.engine().cancel_token()
    }

    /// Bound the wait of later refreshes. `None` waits forever.
    pub fn set_wait_timeout(&mut self, timeout: Option<Duration>) {
        self.engine_mut().set_wait_timeout(timeout);
    }

    fn engine(&self) -> &TransmitEngine {
        self.engine.as_ref().expect("engine present until destroy")
    }

    fn engine_mut(&mut self) -> &mut TransmitEngine {
        self.engine.as_mut().expect("engine present until destroy")
    }
}

impl LedStrip for ChannelStrip {
    fn pixel_format(&self) -> PixelFormat {
        self.buffer.format()
    }

    fn len(&self) -> usize {
        self.buffer.len()
    }

    fn bytes_per_pixel(&self) -> usize {
        self.buffer.bytes_per_pixel()
    }

    fn pixels(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    fn set_pixel(&mut self, index: usize, red: u32, green: u32, blue: u32) -> Result<()> {
        self.buffer.set_pixel(index, red, green, blue)
    }

    fn set_pixel_rgbw(
        &mut self,
        index: usize,
        red: u32,
        green: u32,
        blue: u32,
        white: u32,
    ) -> Result<()> {
        self.buffer.set_pixel_rgbw(index, red, green, blue, white)
    }

    fn refresh(&mut self) -> Result<()> {
        self.engine
            .as_mut()
            .expect("engine present until destroy")
            .refresh(self.buffer.as_bytes())
    }

    fn clear(&mut self) -> Result<()> {
        self.buffer.fill_zero();
        self.refresh()
    }
}

impl Drop for ChannelStrip {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            log::warn!("LED strip dropped without destroy, releasing handles");
            let (channel, encoder) = engine.into_parts();
            if let Err(e) = channel.delete() {
                log::warn!("delete transmit channel failed: {}", e);
            }
            if let Err(e) = encoder.delete() {
                log::warn!("delete strip encoder failed: {}", e);
            }
        }
    }
}
