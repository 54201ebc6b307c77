use crate::sound::BYTES_PER_SAMPLE;
use crate::tone::{DEFAULT_TONE_HZ, DEFAULT_TONE_VOLUME};
use std::{env, path::PathBuf, str::FromStr};

pub const DEFAULT_SAMPLES_PER_SECOND: u32 = 48_000;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub window_width: i32,
    pub window_height: i32,

    pub samples_per_second: u32,
    /// Size of the looping sound buffer in bytes.
    pub sound_buffer_size: u32,
    pub latency_sample_count: u32,

    pub tone_hz: u32,
    pub tone_volume: f32,

    pub game_update_hz: f32,
    pub debug_sync_display: bool,

    /// Stop after this many frames. Only the headless platform honours it.
    pub frames: Option<u32>,
    pub screenshot: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config::with_sample_rate(DEFAULT_SAMPLES_PER_SECOND)
    }
}

impl Config {
    /// Defaults with a one second sound buffer and a fifteenth of a second
    /// of latency at the given rate. A rate whose buffer doesn't fit in a
    /// `u32` gets a saturated size that `SoundOutput::new` rejects.
    pub fn with_sample_rate(samples_per_second: u32) -> Self {
        Config {
            window_width: 1280,
            window_height: 720,
            samples_per_second,
            sound_buffer_size: samples_per_second.saturating_mul(BYTES_PER_SAMPLE),
            latency_sample_count: samples_per_second / 15,
            tone_hz: DEFAULT_TONE_HZ,
            tone_volume: DEFAULT_TONE_VOLUME,
            game_update_hz: 30.0,
            debug_sync_display: false,
            frames: None,
            screenshot: None,
        }
    }

    pub fn from_env() -> Self {
        Config::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from `HANDMADE_*` variables. Values that don't parse
    /// are ignored with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut samples_per_second = DEFAULT_SAMPLES_PER_SECOND;
        override_from(&lookup, "HANDMADE_SAMPLE_RATE", &mut samples_per_second);
        if samples_per_second == 0 {
            warn!("HANDMADE_SAMPLE_RATE must not be zero, using the default");
            samples_per_second = DEFAULT_SAMPLES_PER_SECOND;
        } else if samples_per_second.checked_mul(BYTES_PER_SAMPLE).is_none() {
            warn!(
                "HANDMADE_SAMPLE_RATE {} is too large for a sound buffer, using the default",
                samples_per_second
            );
            samples_per_second = DEFAULT_SAMPLES_PER_SECOND;
        }

        let mut config = Config::with_sample_rate(samples_per_second);
        override_from(&lookup, "HANDMADE_LATENCY_SAMPLES", &mut config.latency_sample_count);
        override_from(&lookup, "HANDMADE_TONE_HZ", &mut config.tone_hz);
        let default_update_hz = config.game_update_hz;
        override_from(&lookup, "HANDMADE_UPDATE_HZ", &mut config.game_update_hz);
        if !config.game_update_hz.is_finite() || config.game_update_hz <= 0.0 {
            warn!("HANDMADE_UPDATE_HZ must be a positive rate, using the default");
            config.game_update_hz = default_update_hz;
        }
        override_from(&lookup, "HANDMADE_SYNC_DISPLAY", &mut config.debug_sync_display);

        let mut frames = 0;
        if override_from(&lookup, "HANDMADE_FRAMES", &mut frames) {
            config.frames = Some(frames);
        }
        config.screenshot = lookup("HANDMADE_SCREENSHOT").map(PathBuf::from);

        config
    }

    pub fn target_seconds_per_frame(&self) -> f32 {
        1.0 / self.game_update_hz
    }
}

fn override_from<F, T>(lookup: &F, name: &str, value: &mut T) -> bool
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Debug,
{
    match lookup(name) {
        Some(raw) => match raw.trim().parse() {
            Ok(parsed) => {
                info!("{} = {:?}", name, parsed);
                *value = parsed;
                true
            }
            Err(_) => {
                warn!("ignoring {}: could not parse {:?}", name, raw);
                false
            }
        },
        None => false,
    }
}
