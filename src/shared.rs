use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::Result;
use crate::strip::LedStrip;

/// A strip that several threads can drive.
///
/// Every call holds the strip's lock, so a refresh never reads a buffer
/// that another thread is halfway through writing. Use
/// [`with_strip`](Self::with_strip) to update pixels and refresh as one step.
pub struct SharedStrip<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for SharedStrip<S> {
    fn clone(&self) -> Self {
        SharedStrip {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: LedStrip> SharedStrip<S> {
    pub fn new(strip: S) -> Self {
        SharedStrip {
            inner: Arc::new(Mutex::new(strip)),
        }
    }

    /// Run `f` with exclusive access to the strip
    pub fn with_strip<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn set_pixel(&self, index: usize, red: u32, green: u32, blue: u32) -> Result<()> {
        self.lock().set_pixel(index, red, green, blue)
    }

    pub fn set_pixel_rgbw(
        &self,
        index: usize,
        red: u32,
        green: u32,
        blue: u32,
        white: u32,
    ) -> Result<()> {
        self.lock().set_pixel_rgbw(index, red, green, blue, white)
    }

    pub fn refresh(&self) -> Result<()> {
        self.lock().refresh()
    }

    pub fn clear(&self) -> Result<()> {
        self.lock().clear()
    }

    /// Take the strip back once no other clone is alive
    pub fn try_unwrap(self) -> std::result::Result<S, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => Ok(mutex.into_inner().unwrap_or_else(PoisonError::into_inner)),
            Err(inner) => Err(SharedStrip { inner }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        // a panic mid-write leaves valid bytes behind, so keep going
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
