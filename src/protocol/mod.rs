//! Framing used by serial LED controllers.

mod adalight;
mod awa;

use serde::Deserialize;

pub use adalight::write_adalight_frame;
pub use awa::write_awa_frame;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameProtocol {
    /// HyperSerialPico / HyperSerialESP32
    #[default]
    Awa,
    Adalight,
}

impl FrameProtocol {
    pub fn write_frame(self, pixel_data: &[u8], stride: usize, frame: &mut Vec<u8>) {
        match self {
            Self::Awa => write_awa_frame(pixel_data, stride, frame),
            Self::Adalight => write_adalight_frame(pixel_data, stride, frame),
        }
    }
}
