use crate::common::SoundOutputBuffer;
use std::f32::consts::PI;

pub const DEFAULT_TONE_HZ: u32 = 256;
pub const DEFAULT_TONE_VOLUME: f32 = 3_000.0;

/// Samples per cycle, truncated the same way the fill loop steps the phase.
/// `None` when the tone cannot be represented at this sample rate.
pub fn wave_period(samples_per_second: u32, tone_hz: u32) -> Option<u32> {
    if tone_hz == 0 {
        return None;
    }
    match samples_per_second / tone_hz {
        0 => None,
        period => Some(period),
    }
}

/// Writes a sine tone into every frame of the buffer, continuing from the
/// phase left behind by the previous call.
pub fn output_sound(sound_buffer: &mut SoundOutputBuffer, tone_hz: u32, tone_volume: f32) {
    let wave_period = match wave_period(sound_buffer.samples_per_second, tone_hz) {
        Some(period) => period,
        None => {
            trace!(
                "tone {}Hz is out of range, writing {} samples of silence",
                tone_hz,
                sound_buffer.sample_count()
            );
            for sample in sound_buffer.samples.iter_mut() {
                *sample = 0;
            }
            return;
        }
    };

    let tau = 2.0 * PI;
    let t_sine = &mut *sound_buffer.t_sine;
    for frame in sound_buffer.samples.chunks_exact_mut(2) {
        let sine_value = t_sine.sin();
        let sample_value = (sine_value * tone_volume) as i16;

        frame[0] = sample_value;
        frame[1] = sample_value;

        *t_sine += tau / wave_period as f32;
        if *t_sine > tau {
            *t_sine -= tau;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthesize(t_sine: &mut f32, frames: usize, tone_hz: u32) -> Vec<i16> {
        let mut samples = vec![0; frames * 2];
        let mut buffer = SoundOutputBuffer {
            samples_per_second: 48_000,
            samples: &mut samples,
            t_sine,
        };
        output_sound(&mut buffer, tone_hz, DEFAULT_TONE_VOLUME);
        samples
    }

    #[test]
    fn wave_period_truncates() {
        assert_eq!(wave_period(48_000, 256), Some(187));
        assert_eq!(wave_period(48_000, 0), None);
        assert_eq!(wave_period(48_000, 96_000), None);
    }

    #[test]
    fn one_period_is_one_sine_cycle() {
        let mut t_sine = 0.0;
        let samples = synthesize(&mut t_sine, 188, 256);
        let left = |i: usize| samples[i * 2];

        assert_eq!(left(0), 0);
        assert!(left(47) >= 2_995, "peak was {}", left(47));
        assert!(left(140) <= -2_995, "trough was {}", left(140));
        assert!(left(187).abs() <= 1, "end of cycle was {}", left(187));
        assert!(t_sine >= 0.0 && t_sine <= 2.0 * PI);
    }

    #[test]
    fn channels_carry_the_same_sample() {
        let mut t_sine = 0.0;
        let samples = synthesize(&mut t_sine, 500, 440);
        for frame in samples.chunks(2) {
            assert_eq!(frame[0], frame[1]);
        }
    }

    #[test]
    fn phase_carries_across_calls() {
        for &(first, second) in &[(1, 1), (100, 87), (187, 187), (3_199, 1_601)] {
            let mut split_phase = 0.0;
            let mut split = synthesize(&mut split_phase, first, 256);
            split.extend(synthesize(&mut split_phase, second, 256));

            let mut whole_phase = 0.0;
            let whole = synthesize(&mut whole_phase, first + second, 256);

            assert_eq!(split, whole);
            assert_eq!(split_phase.to_bits(), whole_phase.to_bits());
        }
    }

    #[test]
    fn buffer_counts_stereo_frames() {
        let mut samples = vec![0; 2 * 375];
        let mut t_sine = 0.0;
        let buffer = SoundOutputBuffer {
            samples_per_second: 48_000,
            samples: &mut samples,
            t_sine: &mut t_sine,
        };
        assert_eq!(buffer.sample_count(), 375);
    }

    #[test]
    fn out_of_range_tone_is_silent() {
        let mut t_sine = 1.0;
        let samples = synthesize(&mut t_sine, 64, 0);
        assert!(samples.iter().all(|&s| s == 0));
        assert_eq!(t_sine, 1.0);
    }
}
