use crate::error::{Result, StripError};
use crate::pixel_format::{ColorChannel, PixelFormat};

/// Pixel bytes for a whole strip, laid out in the strip's wire order
#[derive(Debug, Clone)]
pub struct StripBuffer {
    format: PixelFormat,
    bytes_per_pixel: usize,
    len: usize,
    data: Vec<u8>,
}

impl StripBuffer {
    /// Allocate a zeroed buffer for `len` LEDs
    pub fn new(format: PixelFormat, len: usize) -> Result<Self> {
        let bytes_per_pixel = format.bytes_per_pixel()?;
        let bytes = len
            .checked_mul(bytes_per_pixel)
            .ok_or(StripError::OutOfMemory { bytes: usize::MAX })?;

        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|_| StripError::OutOfMemory { bytes })?;
        data.resize(bytes, 0);

        Ok(StripBuffer {
            format,
            bytes_per_pixel,
            len,
            data,
        })
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    /// Number of addressable LEDs
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Write an RGB pixel on a 3-byte strip. Each channel keeps its low 8 bits.
    pub fn set_pixel(&mut self, index: usize, red: u32, green: u32, blue: u32) -> Result<()> {
        if self.bytes_per_pixel != 3 {
            log::error!("Unsupported pixel format {} for RGB write", self.format);
            return Err(StripError::UnsupportedFormat(self.format));
        }
        let order = self.format.channel_order()?;
        let pixel = self.pixel_mut(index)?;

        for (byte, channel) in pixel.iter_mut().zip(order) {
            *byte = match channel {
                ColorChannel::Red => low_byte(red),
                ColorChannel::Green => low_byte(green),
                ColorChannel::Blue => low_byte(blue),
                ColorChannel::White => 0,
            };
        }

        Ok(())
    }

    /// Write an RGBW pixel on a 4-byte strip, always in GRBW order
    pub fn set_pixel_rgbw(
        &mut self,
        index: usize,
        red: u32,
        green: u32,
        blue: u32,
        white: u32,
    ) -> Result<()> {
        if self.bytes_per_pixel != 4 {
            log::error!("wrong LED pixel format, expected 4 bytes per pixel");
            return Err(StripError::InvalidArgument(
                "wrong LED pixel format, expected 4 bytes per pixel",
            ));
        }
        let pixel = self.pixel_mut(index)?;
        pixel.copy_from_slice(&[low_byte(green), low_byte(red), low_byte(blue), low_byte(white)]);

        Ok(())
    }

    /// Zero every LED
    pub fn fill_zero(&mut self) {
        self.data.fill(0);
    }

    fn pixel_mut(&mut self, index: usize) -> Result<&mut [u8]> {
        if index >= self.len {
            log::error!("index {} out of maximum number of LEDs ({})", index, self.len);
            return Err(StripError::InvalidArgument("index out of maximum number of LEDs"));
        }
        let start = index * self.bytes_per_pixel;
        Ok(&mut self.data[start..start + self.bytes_per_pixel])
    }
}

fn low_byte(value: u32) -> u8 {
    (value & 0xFF) as u8
}
