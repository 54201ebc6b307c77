//! The offscreen bitmap the game draws into and the platform layer blits.
//!
//! Pixels are 32 bits, stored top-down with bytes in (B, G, R, pad) order, so
//! reading a pixel as a little-endian `u32` gives `0x00RRGGBB`.

use crate::common::{OffscreenBuffer, BYTES_PER_PIXEL};
use crate::error::{Error, Result};
use image::{Rgb, RgbImage};
use std::path::Path;

pub struct PixelSurface {
    memory: Vec<u8>,
    width: usize,
    height: usize,
    pitch: usize,
}

impl PixelSurface {
    pub fn new(width: i32, height: i32) -> Result<Self> {
        let mut surface = PixelSurface {
            memory: Vec::new(),
            width: 0,
            height: 0,
            pitch: 0,
        };
        surface.resize(width, height)?;
        Ok(surface)
    }

    /// Like `new`, but with rows padded out to `pitch` bytes.
    pub fn with_pitch(width: i32, height: i32, pitch: usize) -> Result<Self> {
        let mut surface = PixelSurface {
            memory: Vec::new(),
            width: 0,
            height: 0,
            pitch: 0,
        };
        surface.allocate(width, height, Some(pitch))?;
        Ok(surface)
    }

    /// Reallocates the bitmap for the new client size. On failure the
    /// previous bitmap is left in place.
    pub fn resize(&mut self, width: i32, height: i32) -> Result<()> {
        self.allocate(width, height, None)
    }

    fn allocate(&mut self, width: i32, height: i32, pitch: Option<usize>) -> Result<()> {
        if width <= 0 || height <= 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        let new_width = width as usize;
        let new_height = height as usize;
        let min_pitch = new_width * BYTES_PER_PIXEL;
        let new_pitch = pitch.unwrap_or(min_pitch);
        if new_pitch < min_pitch {
            return Err(Error::InvalidDimensions { width, height });
        }

        let bitmap_memory_size = new_pitch
            .checked_mul(new_height)
            .ok_or(Error::AllocationFailure { bytes: usize::MAX })?;
        let mut memory = Vec::new();
        memory
            .try_reserve_exact(bitmap_memory_size)
            .map_err(|_| Error::AllocationFailure {
                bytes: bitmap_memory_size,
            })?;
        memory.resize(bitmap_memory_size, 0);

        self.memory = memory;
        self.width = new_width;
        self.height = new_height;
        self.pitch = new_pitch;
        debug!(
            "resized offscreen buffer to {}x{} (pitch {})",
            self.width, self.height, self.pitch
        );

        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Lends the bitmap out for a single tick of drawing.
    pub fn buffer(&mut self) -> OffscreenBuffer<'_> {
        OffscreenBuffer {
            memory: &mut self.memory,
            width: self.width,
            height: self.height,
            pitch: self.pitch,
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        debug_assert!(x < self.width && y < self.height);
        let offset = y * self.pitch + x * BYTES_PER_PIXEL;
        let mut bytes = [0; BYTES_PER_PIXEL];
        bytes.copy_from_slice(&self.memory[offset..offset + BYTES_PER_PIXEL]);
        u32::from_le_bytes(bytes)
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let offset = y as usize * self.pitch + x as usize * BYTES_PER_PIXEL;
            let bgrx = &self.memory[offset..offset + BYTES_PER_PIXEL];
            Rgb([bgrx[2], bgrx[1], bgrx[0]])
        })
    }

    pub fn save_screenshot<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_rgb_image().save(path.as_ref())?;
        info!("saved screenshot to {}", path.as_ref().display());
        Ok(())
    }
}
