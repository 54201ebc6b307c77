//! equivalent to handmade.h & handmade.cpp
//!
//! The platform-independent half of the skeleton: the back buffer, the
//! sound ring bookkeeping, input digitization and the placeholder game that
//! draws a gradient and plays a tone.

pub mod clock;
pub mod common;
pub mod config;
pub mod debug;
pub mod error;
pub mod frame;
pub mod input;
pub mod os;
pub mod platform;
pub mod render;
pub mod sound;
pub mod surface;
pub mod tone;

pub use config::Config;
pub use error::{Error, Result};
pub use frame::{Context, SoundFill};

use common::*;

#[macro_use]
extern crate log;

#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub tone_hz: u32,
    pub tone_volume: f32,
    pub blue_offset: i32,
    pub green_offset: i32,
}

impl GameState {
    pub fn new(tone_hz: u32, tone_volume: f32) -> Self {
        GameState {
            tone_hz,
            tone_volume,
            blue_offset: 0,
            green_offset: 0,
        }
    }
}

/// Runs once per tick with the input built for it. `sound_buffer` is sized
/// to the region the platform layer is about to write and may be empty.
pub fn update_and_render(
    game_state: &mut GameState,
    input: &Input,
    buffer: &mut OffscreenBuffer,
    sound_buffer: &mut SoundOutputBuffer,
) {
    game_state.blue_offset = game_state.blue_offset.wrapping_add(1);

    for controller in input.controllers.iter().filter(|c| c.is_connected) {
        if controller.is_analog {
            // use analog movement tuning
            game_state.blue_offset += (4.0 * controller.stick_average_x) as i32;
            game_state.tone_hz = (256.0 + 128.0 * controller.stick_average_y) as u32;
        } else {
            // use digital movement tuning
            if controller.move_left.ended_down {
                game_state.blue_offset -= 1;
            }
            if controller.move_right.ended_down {
                game_state.blue_offset += 1;
            }
        }

        if controller.action_down.ended_down {
            game_state.green_offset += 1;
        }
    }

    tone::output_sound(sound_buffer, game_state.tone_hz, game_state.tone_volume);
    render::render_weird_gradient(buffer, game_state.blue_offset, game_state.green_offset);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::PixelSurface;

    fn run(game_state: &mut GameState, input: &Input, frames: usize) -> Vec<i16> {
        let mut surface = PixelSurface::new(4, 4).unwrap();
        let mut samples = vec![0; frames * 2];
        let mut t_sine = 0.0;
        let mut sound_buffer = SoundOutputBuffer {
            samples_per_second: 48_000,
            samples: &mut samples,
            t_sine: &mut t_sine,
        };
        update_and_render(game_state, input, &mut surface.buffer(), &mut sound_buffer);
        samples
    }

    #[test]
    fn idle_update_nudges_the_gradient() {
        let mut game_state = GameState::new(256, 3_000.0);
        run(&mut game_state, &Input::default(), 0);
        run(&mut game_state, &Input::default(), 0);
        assert_eq!(game_state.blue_offset, 2);
        assert_eq!(game_state.green_offset, 0);
        assert_eq!(game_state.tone_hz, 256);
    }

    #[test]
    fn analog_stick_bends_the_tone() {
        let mut game_state = GameState::new(256, 3_000.0);
        let mut input = Input::default();
        let pad = &mut input.controllers[1];
        pad.is_connected = true;
        pad.is_analog = true;
        pad.stick_average_x = 1.0;
        pad.stick_average_y = 0.5;

        let samples = run(&mut game_state, &input, 16);
        assert_eq!(game_state.tone_hz, 320);
        assert_eq!(game_state.blue_offset, 5);
        assert!(samples.iter().any(|&s| s != 0));
    }

    #[test]
    fn disconnected_controllers_are_ignored() {
        let mut game_state = GameState::new(256, 3_000.0);
        let mut input = Input::default();
        input.controllers[2].is_analog = true;
        input.controllers[2].stick_average_y = -1.0;
        input.controllers[2].action_down.ended_down = true;

        run(&mut game_state, &input, 0);
        assert_eq!(game_state.tone_hz, 256);
        assert_eq!(game_state.green_offset, 0);
    }

    #[test]
    fn action_button_scrolls_green() {
        let mut game_state = GameState::new(256, 3_000.0);
        let mut input = Input::default();
        input.controllers[0].is_connected = true;
        input.controllers[0].action_down.ended_down = true;
        input.controllers[0].move_left.ended_down = true;

        run(&mut game_state, &input, 0);
        assert_eq!(game_state.green_offset, 1);
        assert_eq!(game_state.blue_offset, 0);
    }
}
