//! The services the frame loop needs from the operating system.
//!
//! Each device is picked once at startup. When the real library or device is
//! missing, a stub that reports `DeviceUnavailable` stands in for it and the
//! loop skips that device's work every tick.

use crate::error::{Error, Result};
use crate::input::GamepadState;
use crate::sound::{PlayCursors, RingRegion};
use crate::surface::PixelSurface;

pub trait SoundDevice {
    /// Starts looping playback of the ring.
    fn play(&mut self) -> Result<()>;

    fn current_position(&mut self) -> Result<PlayCursors>;

    /// Locks `region` of the ring and hands it to `fill` as one or two
    /// spans of interleaved samples, the second one starting at offset zero.
    /// The lock is released before returning.
    fn lock_region(
        &mut self,
        region: RingRegion,
        fill: &mut dyn FnMut(&mut [i16], &mut [i16]),
    ) -> Result<()>;
}

pub trait InputDevice {
    fn controller_count(&self) -> usize;

    fn get_state(&mut self, controller_index: usize) -> Result<GamepadState>;
}

pub trait Display {
    fn present(&mut self, surface: &PixelSurface) -> Result<()>;
}

/// Used when no sound device could be opened.
#[derive(Debug, Default)]
pub struct NullSoundDevice;

impl SoundDevice for NullSoundDevice {
    fn play(&mut self) -> Result<()> {
        Err(Error::DeviceUnavailable("no sound device".into()))
    }

    fn current_position(&mut self) -> Result<PlayCursors> {
        Err(Error::DeviceUnavailable("no sound device".into()))
    }

    fn lock_region(
        &mut self,
        _region: RingRegion,
        _fill: &mut dyn FnMut(&mut [i16], &mut [i16]),
    ) -> Result<()> {
        Err(Error::DeviceUnavailable("no sound device".into()))
    }
}

/// Used when no gamepad library could be loaded.
#[derive(Debug, Default)]
pub struct StubInput;

impl InputDevice for StubInput {
    fn controller_count(&self) -> usize {
        0
    }

    fn get_state(&mut self, controller_index: usize) -> Result<GamepadState> {
        Err(Error::DeviceUnavailable(format!(
            "controller {} is not connected",
            controller_index
        )))
    }
}

/// Drops every frame.
#[derive(Debug, Default)]
pub struct NullDisplay;

impl Display for NullDisplay {
    fn present(&mut self, _surface: &PixelSurface) -> Result<()> {
        Ok(())
    }
}
