//! One pass of the main loop.
//!
//! Everything the loop mutates lives in `Context`; the platform layer owns
//! the context and the devices and calls `begin_frame`, feeds keyboard
//! events, then calls `tick` once per frame.

use crate::common::{
    ControllerInput, Input, SoundOutputBuffer, KEYBOARD_CONTROLLER, MAX_GAMEPADS,
};
use crate::config::Config;
use crate::debug::{debug_sync_display, SoundMarkers};
use crate::error::Result;
use crate::input::{self, process_gamepad};
use crate::platform::{Display, InputDevice, SoundDevice};
use crate::sound::{
    clear_sound_buffer, fill_sound_buffer, PlayCursors, RingRegion, SoundOutput,
};
use crate::surface::PixelSurface;
use crate::tone::output_sound;
use crate::{update_and_render, GameState};

/// What happened to the sound buffer during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundFill {
    Written(RingRegion),
    /// The queue already reached the target.
    UpToDate,
    /// The device couldn't be queried or locked.
    Skipped,
}

pub struct Context {
    pub config: Config,
    pub back_buffer: PixelSurface,
    pub sound_output: SoundOutput,
    pub game: GameState,
    pub markers: SoundMarkers,
    pub running: bool,
    samples: Vec<i16>,
    new_input: Input,
    old_input: Input,
}

impl Context {
    pub fn new(config: Config) -> Result<Self> {
        let back_buffer = PixelSurface::new(config.window_width, config.window_height)?;
        let sound_output = SoundOutput::from_config(&config)?;
        // no single fill is longer than the ring
        let samples = vec![0; (sound_output.sound_buffer_size / 2) as usize];
        let game = GameState::new(config.tone_hz, config.tone_volume);

        Ok(Context {
            config,
            back_buffer,
            sound_output,
            game,
            markers: SoundMarkers::default(),
            running: true,
            samples,
            new_input: Input::default(),
            old_input: Input::default(),
        })
    }

    pub fn resize(&mut self, width: i32, height: i32) -> Result<()> {
        self.back_buffer.resize(width, height)
    }

    /// The input being built for the coming tick.
    pub fn new_input(&self) -> &Input {
        &self.new_input
    }

    /// The input the last tick ran with.
    pub fn last_input(&self) -> &Input {
        &self.old_input
    }

    pub fn keyboard_controller(&mut self) -> &mut ControllerInput {
        self.new_input.get_controller_mut(KEYBOARD_CONTROLLER)
    }

    pub fn begin_frame(&mut self) {
        input::begin_frame(&self.old_input, &mut self.new_input);
        self.new_input.dt_for_frame = self.config.target_seconds_per_frame();
    }

    /// Clears the ring, queues the first latency's worth of tone and starts
    /// playback.
    pub fn start_sound(&mut self, sound: &mut dyn SoundDevice) -> Result<()> {
        clear_sound_buffer(sound, &self.sound_output)?;

        if let Some(region) = self.sound_output.prime_region() {
            let sample_count = region.sample_count(self.sound_output.bytes_per_sample);
            let samples = &mut self.samples[..sample_count * 2];
            let mut sound_buffer = SoundOutputBuffer {
                samples_per_second: self.sound_output.samples_per_second,
                samples,
                t_sine: &mut self.sound_output.t_sine,
            };
            output_sound(&mut sound_buffer, self.game.tone_hz, self.game.tone_volume);
            fill_sound_buffer(
                sound,
                &mut self.sound_output,
                region,
                &self.samples[..sample_count * 2],
            )?;
        }

        sound.play()?;
        info!(
            "sound started: {} bytes buffered, {} samples of latency",
            self.sound_output.sound_buffer_size, self.sound_output.latency_sample_count
        );
        Ok(())
    }

    pub fn tick(
        &mut self,
        sound: &mut dyn SoundDevice,
        input: &mut dyn InputDevice,
        display: &mut dyn Display,
    ) -> SoundFill {
        self.poll_gamepads(input);

        // a cursor outside the ring counts as a failed query
        let sync = match sound.current_position() {
            Ok(cursors) => match self.sound_output.region_to_fill(cursors.play_cursor) {
                Ok(region) => Some((cursors, region)),
                Err(e) => {
                    warn!("Sound invalid: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("Sound invalid: {}", e);
                None
            }
        };

        let sample_count = match sync {
            Some((_, Some(region))) => region.sample_count(self.sound_output.bytes_per_sample),
            _ => 0,
        };
        let t_sine_before_update = self.sound_output.t_sine;
        {
            let mut buffer = self.back_buffer.buffer();
            let mut sound_buffer = SoundOutputBuffer {
                samples_per_second: self.sound_output.samples_per_second,
                samples: &mut self.samples[..sample_count * 2],
                t_sine: &mut self.sound_output.t_sine,
            };
            update_and_render(
                &mut self.game,
                &self.new_input,
                &mut buffer,
                &mut sound_buffer,
            );
        }

        let fill = match sync {
            Some((cursors, Some(region))) => {
                self.trace_fill(cursors, region);
                self.markers.record_output(cursors, region);
                match fill_sound_buffer(
                    sound,
                    &mut self.sound_output,
                    region,
                    &self.samples[..sample_count * 2],
                ) {
                    Ok(()) => SoundFill::Written(region),
                    Err(e) => {
                        warn!("Could not lock sound buffer for filling: {}", e);
                        // the samples never reached the ring
                        self.sound_output.t_sine = t_sine_before_update;
                        SoundFill::Skipped
                    }
                }
            }
            Some((_, None)) => SoundFill::UpToDate,
            None => SoundFill::Skipped,
        };

        if self.config.debug_sync_display {
            debug_sync_display(
                &mut self.back_buffer.buffer(),
                &self.markers,
                &self.sound_output,
            );
        }

        if let Err(e) = display.present(&self.back_buffer) {
            warn!("could not present frame: {}", e);
        }

        if let Ok(cursors) = sound.current_position() {
            self.markers.record_flip(cursors);
        }
        self.markers.advance();

        std::mem::swap(&mut self.new_input, &mut self.old_input);

        fill
    }

    fn poll_gamepads(&mut self, input: &mut dyn InputDevice) {
        let max_controller_count = input.controller_count().min(MAX_GAMEPADS);
        for controller_index in 0..MAX_GAMEPADS {
            let our_controller_index = controller_index + 1;
            let old_controller = self.old_input.get_controller(our_controller_index);
            let new_controller = self.new_input.get_controller_mut(our_controller_index);

            if controller_index >= max_controller_count {
                *new_controller = ControllerInput::default();
                continue;
            }

            match input.get_state(controller_index) {
                Ok(pad) => process_gamepad(&pad, old_controller, new_controller),
                Err(e) => {
                    trace!("{}", e);
                    *new_controller = ControllerInput::default();
                }
            }
        }
    }

    fn trace_fill(&self, cursors: PlayCursors, region: RingRegion) {
        let (audio_latency_bytes, audio_latency_seconds) =
            self.sound_output.audio_latency(cursors);
        trace!(
            "BTL:{} TC:{} BTW:{} - PC:{} WC:{} DELTA:{} ({}s)",
            region.byte_to_lock,
            self.sound_output.target_cursor(cursors.play_cursor),
            region.bytes_to_write,
            cursors.play_cursor,
            cursors.write_cursor,
            audio_latency_bytes,
            audio_latency_seconds
        );
    }
}
