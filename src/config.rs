use std::time::Duration;

use serde::Deserialize;

use crate::pixel_format::PixelFormat;

/// Resolution used when the channel config leaves it at zero (10 MHz)
pub const DEFAULT_RESOLUTION_HZ: u32 = 10_000_000;

/// Depth of the channel's internal transmit queue
pub const TRANS_QUEUE_DEPTH: usize = 4;

/// Channel memory size in symbols used when the config leaves it at zero
#[cfg(any(feature = "esp32", feature = "esp32s2"))]
pub const DEFAULT_MEM_BLOCK_SYMBOLS: usize = 64;
#[cfg(not(any(feature = "esp32", feature = "esp32s2")))]
pub const DEFAULT_MEM_BLOCK_SYMBOLS: usize = 48;

/// LED chip family, passed through to the encoder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LedModel {
    #[default]
    Ws2812,
    Sk6812,
}

/// Clock feeding the transmit channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockSource {
    #[default]
    Default,
    Apb,
    RcFast,
    Xtal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripConfig {
    /// Output pin carrying the LED data signal
    pub gpio_num: i32,
    pub max_leds: usize,
    pub pixel_format: PixelFormat,
    #[serde(default)]
    pub led_model: LedModel,
    #[serde(default)]
    pub invert_output: bool,
}

/// Transmit channel settings. Zero / `None` fields fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub resolution_hz: u32,
    pub clock_source: Option<ClockSource>,
    pub mem_block_symbols: usize,
    pub with_dma: bool,
    /// Upper bound on waiting for a transmission to finish.
    /// `None` waits forever, which matches the classic driver but can hang
    /// a caller on a stuck peripheral; set it in production.
    pub wait_timeout_ms: Option<u64>,
}

/// Fully resolved settings handed to a [`ChannelProvider`](crate::channel::ChannelProvider)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxChannelConfig {
    pub gpio_num: i32,
    pub clock_source: ClockSource,
    pub mem_block_symbols: usize,
    pub resolution_hz: u32,
    pub trans_queue_depth: usize,
    pub with_dma: bool,
    pub invert_out: bool,
}

/// Settings handed to an [`EncoderProvider`](crate::channel::EncoderProvider)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    pub resolution_hz: u32,
    pub led_model: LedModel,
}

impl ChannelConfig {
    /// Apply defaults and merge in the strip's pin settings
    pub fn resolve(&self, strip: &StripConfig) -> TxChannelConfig {
        let resolution_hz = if self.resolution_hz == 0 {
            DEFAULT_RESOLUTION_HZ
        } else {
            self.resolution_hz
        };
        let mem_block_symbols = if self.mem_block_symbols == 0 {
            DEFAULT_MEM_BLOCK_SYMBOLS
        } else {
            self.mem_block_symbols
        };

        TxChannelConfig {
            gpio_num: strip.gpio_num,
            clock_source: self.clock_source.unwrap_or_default(),
            mem_block_symbols,
            resolution_hz,
            trans_queue_depth: TRANS_QUEUE_DEPTH,
            with_dma: self.with_dma,
            invert_out: strip.invert_output,
        }
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }
}
