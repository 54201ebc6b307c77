//! A platform layer without a window or sound card.
//!
//! The sound device is simulated: a ring of samples whose play cursor moves
//! forward as the caller reports elapsed time. Frames are counted and
//! dropped, and the last one can be saved as a screenshot.

use crate::clock::FrameClock;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::frame::{Context, SoundFill};
use crate::platform::{Display, SoundDevice, StubInput};
use crate::sound::{PlayCursors, RingRegion, BYTES_PER_SAMPLE};
use crate::surface::PixelSurface;

pub const DEFAULT_HEADLESS_FRAMES: u32 = 120;

/// Real devices only report cursor movement in chunks; 480 samples is 10ms
/// at 48kHz.
pub const DEFAULT_CURSOR_GRANULARITY: u32 = 480 * BYTES_PER_SAMPLE;

pub struct SimulatedSoundDevice {
    ring: Vec<i16>,
    sound_buffer_size: u32,
    /// Bytes consumed since playback started.
    played_bytes: u64,
    /// How far ahead of the play cursor the device is already committed.
    write_ahead_bytes: u32,
    granularity: u32,
    playing: bool,
    fail_queries: u32,
    fail_locks: u32,
}

impl SimulatedSoundDevice {
    pub fn new(sound_buffer_size: u32) -> Self {
        debug_assert!(sound_buffer_size % BYTES_PER_SAMPLE == 0);
        SimulatedSoundDevice {
            ring: vec![0; (sound_buffer_size / 2) as usize],
            sound_buffer_size,
            played_bytes: 0,
            write_ahead_bytes: 0,
            granularity: BYTES_PER_SAMPLE,
            playing: false,
            fail_queries: 0,
            fail_locks: 0,
        }
    }

    /// Reports cursors rounded down to a multiple of `granularity` bytes.
    pub fn with_granularity(mut self, granularity: u32) -> Self {
        debug_assert!(granularity > 0 && granularity % BYTES_PER_SAMPLE == 0);
        self.granularity = granularity;
        self
    }

    pub fn with_write_ahead(mut self, write_ahead_bytes: u32) -> Self {
        self.write_ahead_bytes = write_ahead_bytes;
        self
    }

    /// Moves the play cursor forward. Does nothing until `play` is called.
    pub fn advance(&mut self, bytes: u32) {
        if self.playing {
            self.played_bytes += u64::from(bytes - bytes % BYTES_PER_SAMPLE);
        }
    }

    pub fn advance_seconds(&mut self, seconds: f32, samples_per_second: u32) {
        let samples = (seconds * samples_per_second as f32) as u32;
        self.advance(samples * BYTES_PER_SAMPLE);
    }

    /// Makes the next `count` position queries fail.
    pub fn fail_queries(&mut self, count: u32) {
        self.fail_queries = count;
    }

    /// Makes the next `count` locks fail.
    pub fn fail_locks(&mut self, count: u32) {
        self.fail_locks = count;
    }

    pub fn played_bytes(&self) -> u64 {
        self.played_bytes
    }

    pub fn ring(&self) -> &[i16] {
        &self.ring
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    fn play_cursor(&self) -> u32 {
        let cursor = (self.played_bytes % u64::from(self.sound_buffer_size)) as u32;
        cursor - cursor % self.granularity
    }
}

impl SoundDevice for SimulatedSoundDevice {
    fn play(&mut self) -> Result<()> {
        self.playing = true;
        Ok(())
    }

    fn current_position(&mut self) -> Result<PlayCursors> {
        if self.fail_queries > 0 {
            self.fail_queries -= 1;
            return Err(Error::DeviceUnavailable("simulated query failure".into()));
        }

        let play_cursor = self.play_cursor();
        let write_cursor = (play_cursor + self.write_ahead_bytes) % self.sound_buffer_size;
        Ok(PlayCursors {
            play_cursor,
            write_cursor,
        })
    }

    fn lock_region(
        &mut self,
        region: RingRegion,
        fill: &mut dyn FnMut(&mut [i16], &mut [i16]),
    ) -> Result<()> {
        if self.fail_locks > 0 {
            self.fail_locks -= 1;
            return Err(Error::DeviceUnavailable("simulated lock failure".into()));
        }
        if region.byte_to_lock >= self.sound_buffer_size
            || region.bytes_to_write > self.sound_buffer_size
        {
            return Err(Error::CursorOutOfRange {
                cursor: region.byte_to_lock.max(region.bytes_to_write),
                size: self.sound_buffer_size,
            });
        }

        let (region1, region2) = region.split(self.sound_buffer_size);
        let (head, tail) = self.ring.split_at_mut(region1.start / 2);
        let region1_samples = &mut tail[..region1.len() / 2];
        let region2_samples = &mut head[..region2.len() / 2];
        fill(region1_samples, region2_samples);

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct HeadlessDisplay {
    pub frames_presented: u64,
}

impl Display for HeadlessDisplay {
    fn present(&mut self, surface: &PixelSurface) -> Result<()> {
        self.frames_presented += 1;
        trace!(
            "presented frame {} ({}x{})",
            self.frames_presented,
            surface.width(),
            surface.height()
        );
        Ok(())
    }
}

pub fn main(config: Config) -> Result<()> {
    let frames = config.frames.unwrap_or(DEFAULT_HEADLESS_FRAMES);
    let samples_per_second = config.samples_per_second;
    let mut context = Context::new(config)?;

    let mut sound = SimulatedSoundDevice::new(context.sound_output.sound_buffer_size)
        .with_granularity(DEFAULT_CURSOR_GRANULARITY)
        .with_write_ahead(DEFAULT_CURSOR_GRANULARITY);
    let mut input = StubInput;
    let mut display = HeadlessDisplay::default();

    context.start_sound(&mut sound)?;

    let mut clock = FrameClock::new(context.config.target_seconds_per_frame());
    let mut skipped = 0;
    for _ in 0..frames {
        if !context.running {
            break;
        }
        context.begin_frame();
        if context.tick(&mut sound, &mut input, &mut display) == SoundFill::Skipped {
            skipped += 1;
        }

        let frame_seconds = clock.wait_for_frame_end();
        sound.advance_seconds(frame_seconds, samples_per_second);
    }

    if let Some(path) = &context.config.screenshot {
        context.back_buffer.save_screenshot(path)?;
    }

    info!(
        "headless run finished: {} frames, {} samples written, {} fills skipped",
        display.frames_presented, context.sound_output.running_sample_index, skipped
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_waits_for_play_and_respects_granularity() {
        let mut device = SimulatedSoundDevice::new(4_000).with_granularity(40);
        device.advance(100);
        assert_eq!(device.current_position().unwrap().play_cursor, 0);

        device.play().unwrap();
        device.advance(100);
        assert_eq!(device.current_position().unwrap().play_cursor, 80);
        device.advance(3_960);
        assert_eq!(device.current_position().unwrap().play_cursor, 40);
    }

    #[test]
    fn write_cursor_wraps() {
        let mut device = SimulatedSoundDevice::new(4_000).with_write_ahead(400);
        device.play().unwrap();
        device.advance(3_800);
        let cursors = device.current_position().unwrap();
        assert_eq!(cursors.play_cursor, 3_800);
        assert_eq!(cursors.write_cursor, 200);
    }

    #[test]
    fn wrapping_lock_hands_out_both_ends() {
        let mut device = SimulatedSoundDevice::new(40);
        let region = RingRegion {
            byte_to_lock: 32,
            bytes_to_write: 16,
        };
        device
            .lock_region(region, &mut |region1, region2| {
                assert_eq!(region1.len(), 4);
                assert_eq!(region2.len(), 4);
                for sample in region1.iter_mut() {
                    *sample = 1;
                }
                for sample in region2.iter_mut() {
                    *sample = 2;
                }
            })
            .unwrap();
        assert_eq!(&device.ring()[16..], &[1, 1, 1, 1]);
        assert_eq!(&device.ring()[..4], &[2, 2, 2, 2]);
        assert!(device.ring()[4..16].iter().all(|&s| s == 0));
    }

    #[test]
    fn injected_failures_are_one_shot() {
        let mut device = SimulatedSoundDevice::new(400);
        device.fail_queries(1);
        assert!(device.current_position().unwrap_err().is_recoverable());
        assert!(device.current_position().is_ok());
    }

    #[test]
    fn short_headless_run_keeps_sound_fed() {
        let mut config = Config::default();
        config.window_width = 32;
        config.window_height = 16;
        config.game_update_hz = 200.0;
        config.frames = Some(5);
        main(config).unwrap();
    }
}
