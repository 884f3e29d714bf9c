use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Result, StripError};

/// Wire order of one LED's color bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum PixelFormat {
    Rgb,
    Grb,
    /// SK6812-style strips with a dedicated white LED
    Grbw,
    Invalid,
}

/// One color component of a pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChannel {
    Red,
    Green,
    Blue,
    White,
}

const RGB_ORDER: [ColorChannel; 3] = [ColorChannel::Red, ColorChannel::Green, ColorChannel::Blue];
const GRB_ORDER: [ColorChannel; 3] = [ColorChannel::Green, ColorChannel::Red, ColorChannel::Blue];
// white is protocol-defined and always last
const GRBW_ORDER: [ColorChannel; 4] = [
    ColorChannel::Green,
    ColorChannel::Red,
    ColorChannel::Blue,
    ColorChannel::White,
];

impl PixelFormat {
    /// Number of buffer bytes one LED consumes
    pub fn bytes_per_pixel(self) -> Result<usize> {
        match self {
            Self::Rgb | Self::Grb => Ok(3),
            Self::Grbw => Ok(4),
            Self::Invalid => Err(StripError::InvalidArgument("invalid led_pixel_format")),
        }
    }

    /// Order in which color channels are laid out in the buffer
    pub fn channel_order(self) -> Result<&'static [ColorChannel]> {
        match self {
            Self::Rgb => Ok(&RGB_ORDER),
            Self::Grb => Ok(&GRB_ORDER),
            Self::Grbw => Ok(&GRBW_ORDER),
            Self::Invalid => Err(StripError::UnsupportedFormat(self)),
        }
    }
}

impl FromStr for PixelFormat {
    type Err = StripError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "RGB" => Ok(Self::Rgb),
            "GRB" => Ok(Self::Grb),
            "GRBW" => Ok(Self::Grbw),
            _ => Err(StripError::InvalidArgument("unknown pixel format")),
        }
    }
}

impl From<String> for PixelFormat {
    // Unknown names are kept as `Invalid` so strip creation can reject them
    fn from(name: String) -> Self {
        name.parse().unwrap_or(Self::Invalid)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let str = match self {
            Self::Rgb => "RGB",
            Self::Grb => "GRB",
            Self::Grbw => "GRBW",
            Self::Invalid => "INVALID",
        };
        write!(f, "{}", str)
    }
}
