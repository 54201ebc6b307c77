//! Types shared between the platform layer and the game.

pub const BYTES_PER_PIXEL: usize = 4;

/// Controller 0 is the keyboard, the rest are gamepads.
pub const KEYBOARD_CONTROLLER: usize = 0;
pub const MAX_GAMEPADS: usize = 4;
pub const BUTTON_COUNT: usize = 12;

/// A borrowed view of the back buffer, valid for one tick.
pub struct OffscreenBuffer<'a> {
    pub memory: &'a mut [u8],
    pub width: usize,
    pub height: usize,
    pub pitch: usize,
}

impl<'a> OffscreenBuffer<'a> {
    /// The visible pixels of row `y`, excluding any pitch padding.
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        debug_assert!(y < self.height);
        let start = y * self.pitch;
        &mut self.memory[start..start + self.width * BYTES_PER_PIXEL]
    }
}

pub struct SoundOutputBuffer<'a> {
    pub samples_per_second: u32,
    /// Interleaved stereo, left then right.
    pub samples: &'a mut [i16],
    /// Running sine phase, owned by the sound output so it survives between
    /// ticks.
    pub t_sine: &'a mut f32,
}

impl<'a> SoundOutputBuffer<'a> {
    pub fn sample_count(&self) -> usize {
        self.samples.len() / 2
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ButtonState {
    pub half_transition_count: i32,
    pub ended_down: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ControllerInput {
    pub is_connected: bool,
    pub is_analog: bool,
    pub stick_average_x: f32,
    pub stick_average_y: f32,

    pub move_up: ButtonState,
    pub move_down: ButtonState,
    pub move_left: ButtonState,
    pub move_right: ButtonState,

    pub action_up: ButtonState,
    pub action_down: ButtonState,
    pub action_left: ButtonState,
    pub action_right: ButtonState,

    pub left_shoulder: ButtonState,
    pub right_shoulder: ButtonState,

    pub back: ButtonState,
    pub start: ButtonState,
}

impl ControllerInput {
    pub fn buttons(&self) -> [&ButtonState; BUTTON_COUNT] {
        [
            &self.move_up,
            &self.move_down,
            &self.move_left,
            &self.move_right,
            &self.action_up,
            &self.action_down,
            &self.action_left,
            &self.action_right,
            &self.left_shoulder,
            &self.right_shoulder,
            &self.back,
            &self.start,
        ]
    }

    pub fn buttons_mut(&mut self) -> [&mut ButtonState; BUTTON_COUNT] {
        [
            &mut self.move_up,
            &mut self.move_down,
            &mut self.move_left,
            &mut self.move_right,
            &mut self.action_up,
            &mut self.action_down,
            &mut self.action_left,
            &mut self.action_right,
            &mut self.left_shoulder,
            &mut self.right_shoulder,
            &mut self.back,
            &mut self.start,
        ]
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Input {
    pub dt_for_frame: f32,
    pub controllers: [ControllerInput; MAX_GAMEPADS + 1],
}

impl Input {
    pub fn get_controller(&self, controller_index: usize) -> &ControllerInput {
        debug_assert!(controller_index < self.controllers.len());
        &self.controllers[controller_index]
    }

    pub fn get_controller_mut(&mut self, controller_index: usize) -> &mut ControllerInput {
        debug_assert!(controller_index < self.controllers.len());
        &mut self.controllers[controller_index]
    }
}
