//! Keeping the looping hardware sound buffer fed.
//!
//! The device plays its buffer in a loop and reports where it is reading
//! from (the play cursor). Each tick we write from wherever the previous fill
//! stopped up to `latency_sample_count` samples past the play cursor. The
//! write position comes from `running_sample_index` alone, never from the
//! cursor, so audio that is already queued is not written twice.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::platform::SoundDevice;
use std::mem::size_of;
use std::ops::Range;

/// Interleaved 16-bit stereo.
pub const BYTES_PER_SAMPLE: u32 = (size_of::<i16>() * 2) as u32;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlayCursors {
    pub play_cursor: u32,
    pub write_cursor: u32,
}

/// A span of the ring buffer to overwrite, possibly wrapping past its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingRegion {
    pub byte_to_lock: u32,
    pub bytes_to_write: u32,
}

impl RingRegion {
    pub fn sample_count(&self, bytes_per_sample: u32) -> usize {
        (self.bytes_to_write / bytes_per_sample) as usize
    }

    /// The byte ranges the region covers: up to the end of the ring, then
    /// from offset zero. The second range is empty unless the region wraps.
    pub fn split(&self, sound_buffer_size: u32) -> (Range<usize>, Range<usize>) {
        debug_assert!(self.byte_to_lock < sound_buffer_size);
        debug_assert!(self.bytes_to_write <= sound_buffer_size);

        let start = self.byte_to_lock as usize;
        let region1_size = self
            .bytes_to_write
            .min(sound_buffer_size - self.byte_to_lock) as usize;
        let region2_size = self.bytes_to_write as usize - region1_size;

        (start..start + region1_size, 0..region2_size)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoundOutput {
    pub samples_per_second: u32,
    pub bytes_per_sample: u32,
    pub sound_buffer_size: u32,
    pub latency_sample_count: u32,
    /// Samples committed to the ring since startup. Only grows.
    pub running_sample_index: u64,
    pub t_sine: f32,
}

impl SoundOutput {
    pub fn new(
        samples_per_second: u32,
        sound_buffer_size: u32,
        latency_sample_count: u32,
    ) -> Result<Self> {
        if samples_per_second == 0 {
            return Err(Error::InvalidSoundConfig("sample rate must not be zero"));
        }
        if sound_buffer_size == 0 || sound_buffer_size % BYTES_PER_SAMPLE != 0 {
            return Err(Error::InvalidSoundConfig(
                "buffer size must be a non-zero multiple of the sample size",
            ));
        }
        if latency_sample_count == 0
            || u64::from(latency_sample_count) >= u64::from(sound_buffer_size / BYTES_PER_SAMPLE)
        {
            return Err(Error::InvalidSoundConfig(
                "latency must be shorter than the sound buffer",
            ));
        }

        Ok(SoundOutput {
            samples_per_second,
            bytes_per_sample: BYTES_PER_SAMPLE,
            sound_buffer_size,
            latency_sample_count,
            running_sample_index: 0,
            t_sine: 0.0,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        SoundOutput::new(
            config.samples_per_second,
            config.sound_buffer_size,
            config.latency_sample_count,
        )
    }

    pub fn latency_bytes(&self) -> u32 {
        self.latency_sample_count * self.bytes_per_sample
    }

    /// The first byte no fill has written yet.
    pub fn byte_to_lock(&self) -> u32 {
        ((self.running_sample_index * u64::from(self.bytes_per_sample))
            % u64::from(self.sound_buffer_size)) as u32
    }

    /// Where we want the queued audio to end for the given play cursor.
    pub fn target_cursor(&self, play_cursor: u32) -> u32 {
        ((u64::from(play_cursor) + u64::from(self.latency_bytes()))
            % u64::from(self.sound_buffer_size)) as u32
    }

    /// The region to fill this tick, or `None` when the queue already reaches
    /// the target.
    pub fn region_to_fill(&self, play_cursor: u32) -> Result<Option<RingRegion>> {
        if play_cursor >= self.sound_buffer_size {
            return Err(Error::CursorOutOfRange {
                cursor: play_cursor,
                size: self.sound_buffer_size,
            });
        }

        let byte_to_lock = self.byte_to_lock();
        let target_cursor = self.target_cursor(play_cursor);
        let size = u64::from(self.sound_buffer_size);
        let bytes_to_write =
            ((u64::from(target_cursor) + size - u64::from(byte_to_lock)) % size) as u32;

        if bytes_to_write == 0 {
            Ok(None)
        } else {
            Ok(Some(RingRegion {
                byte_to_lock,
                bytes_to_write,
            }))
        }
    }

    /// The region written before playback starts: from the first unwritten
    /// byte to one latency ahead of a cursor sitting at the start.
    pub fn prime_region(&self) -> Option<RingRegion> {
        self.region_to_fill(0).ok().flatten()
    }

    /// The entire ring. Clearing it doesn't count as producing samples.
    pub fn whole_buffer(&self) -> RingRegion {
        RingRegion {
            byte_to_lock: 0,
            bytes_to_write: self.sound_buffer_size,
        }
    }

    pub fn advance(&mut self, sample_count: usize) {
        self.running_sample_index += sample_count as u64;
    }

    /// How far the device's write cursor runs ahead of its play cursor.
    pub fn audio_latency(&self, cursors: PlayCursors) -> (u32, f32) {
        let mut unwrapped_write_cursor = cursors.write_cursor;
        if unwrapped_write_cursor < cursors.play_cursor {
            unwrapped_write_cursor += self.sound_buffer_size;
        }
        let audio_latency_bytes = unwrapped_write_cursor - cursors.play_cursor;
        let audio_latency_seconds = (audio_latency_bytes / self.bytes_per_sample) as f32
            / self.samples_per_second as f32;
        (audio_latency_bytes, audio_latency_seconds)
    }
}

/// Zeroes the whole ring. The running index is left alone.
pub fn clear_sound_buffer(
    device: &mut dyn SoundDevice,
    sound_output: &SoundOutput,
) -> Result<()> {
    device.lock_region(sound_output.whole_buffer(), &mut |region1, region2| {
        for sample in region1.iter_mut().chain(region2.iter_mut()) {
            *sample = 0;
        }
    })
}

/// Copies `source` into the locked region and advances the running index
/// by the number of stereo samples that made it into the ring.
pub fn fill_sound_buffer(
    device: &mut dyn SoundDevice,
    sound_output: &mut SoundOutput,
    region: RingRegion,
    source: &[i16],
) -> Result<()> {
    let mut copied = 0;
    device.lock_region(region, &mut |region1, region2| {
        let region1_count = region1.len().min(source.len());
        region1[..region1_count].copy_from_slice(&source[..region1_count]);

        let rest = &source[region1_count..];
        let region2_count = region2.len().min(rest.len());
        region2[..region2_count].copy_from_slice(&rest[..region2_count]);

        copied = region1_count + region2_count;
    })?;

    debug_assert_eq!(copied, region.sample_count(sound_output.bytes_per_sample) * 2);
    sound_output.advance(copied / 2);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sound_output() -> SoundOutput {
        // 1000 samples of ring, 100 samples of latency.
        SoundOutput::new(48_000, 4_000, 100).unwrap()
    }

    #[test]
    fn rejects_bad_configuration() {
        assert!(SoundOutput::new(0, 4_000, 100).is_err());
        assert!(SoundOutput::new(48_000, 0, 100).is_err());
        assert!(SoundOutput::new(48_000, 4_002, 100).is_err());
        assert!(SoundOutput::new(48_000, 4_000, 1_000).is_err());
        assert!(SoundOutput::new(48_000, 4_000, 0).is_err());
    }

    #[test]
    fn first_region_runs_from_zero_to_latency() {
        let output = sound_output();
        assert_eq!(
            output.prime_region(),
            Some(RingRegion {
                byte_to_lock: 0,
                bytes_to_write: 400,
            })
        );
    }

    #[test]
    fn region_continues_from_running_index_not_cursor() {
        let mut output = sound_output();
        output.advance(100);
        let region = output.region_to_fill(80).unwrap().unwrap();
        assert_eq!(region.byte_to_lock, 400);
        assert_eq!(region.bytes_to_write, 80);
    }

    #[test]
    fn region_wraps_past_the_end_of_the_ring() {
        let mut output = sound_output();
        output.advance(950);
        // target = (3_900 + 400) % 4_000 = 300
        let region = output.region_to_fill(3_900).unwrap().unwrap();
        assert_eq!(region.byte_to_lock, 3_800);
        assert_eq!(region.bytes_to_write, 500);

        let (region1, region2) = region.split(output.sound_buffer_size);
        assert_eq!(region1, 3_800..4_000);
        assert_eq!(region2, 0..300);
    }

    #[test]
    fn caught_up_queue_writes_nothing() {
        let mut output = sound_output();
        output.advance(150);
        // target = 200 + 400 = 600 = byte_to_lock
        assert_eq!(output.region_to_fill(200).unwrap(), None);
    }

    #[test]
    fn out_of_range_cursor_is_rejected() {
        let output = sound_output();
        assert!(matches!(
            output.region_to_fill(4_000),
            Err(Error::CursorOutOfRange {
                cursor: 4_000,
                size: 4_000
            })
        ));
    }

    #[test]
    fn split_without_wrap_has_empty_second_range() {
        let region = RingRegion {
            byte_to_lock: 100,
            bytes_to_write: 200,
        };
        let (region1, region2) = region.split(4_000);
        assert_eq!(region1, 100..300);
        assert!(region2.is_empty());
    }

    #[test]
    fn whole_buffer_split_covers_the_ring_once() {
        let output = sound_output();
        let (region1, region2) = output.whole_buffer().split(output.sound_buffer_size);
        assert_eq!(region1, 0..4_000);
        assert!(region2.is_empty());
    }

    #[test]
    fn latency_handles_write_cursor_wrap() {
        let output = sound_output();
        let cursors = PlayCursors {
            play_cursor: 3_800,
            write_cursor: 200,
        };
        let (bytes, _) = output.audio_latency(cursors);
        assert_eq!(bytes, 400);
    }
}
