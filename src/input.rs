//! Turning raw device state into per-tick button and stick values.

use crate::common::{ButtonState, ControllerInput, Input, KEYBOARD_CONTROLLER};

/// Button bits, laid out like XInput's `wButtons`.
pub mod buttons {
    pub const DPAD_UP: u16 = 0x0001;
    pub const DPAD_DOWN: u16 = 0x0002;
    pub const DPAD_LEFT: u16 = 0x0004;
    pub const DPAD_RIGHT: u16 = 0x0008;
    pub const START: u16 = 0x0010;
    pub const BACK: u16 = 0x0020;
    pub const LEFT_SHOULDER: u16 = 0x0100;
    pub const RIGHT_SHOULDER: u16 = 0x0200;
    pub const A: u16 = 0x1000;
    pub const B: u16 = 0x2000;
    pub const X: u16 = 0x4000;
    pub const Y: u16 = 0x8000;
}

pub const LEFT_THUMB_DEADZONE: i16 = 7849;

/// Stick deflection past which the stick also counts as a d-pad press.
pub const STICK_BUTTON_THRESHOLD: f32 = 0.5;

/// One poll of a gamepad.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GamepadState {
    pub buttons: u16,
    pub thumb_lx: i16,
    pub thumb_ly: i16,
}

pub fn process_digital_button(
    button_state: u16,
    old_state: &ButtonState,
    button_bit: u16,
) -> ButtonState {
    let ended_down = (button_state & button_bit) == button_bit;
    ButtonState {
        ended_down,
        half_transition_count: if old_state.ended_down != ended_down {
            1
        } else {
            0
        },
    }
}

/// Keyboard events arrive one at a time, so transitions accumulate.
pub fn process_keyboard_message(new_state: &mut ButtonState, is_down: bool) {
    if new_state.ended_down != is_down {
        new_state.ended_down = is_down;
        new_state.half_transition_count += 1;
    }
}

/// Maps a raw axis into [-1, 1], with everything inside the dead zone at 0.
pub fn process_stick_value(value: i16, dead_zone_threshold: i16) -> f32 {
    let value = f32::from(value);
    let dead_zone = f32::from(dead_zone_threshold);

    if value < -dead_zone {
        (value + dead_zone) / (32768.0 - dead_zone)
    } else if value > dead_zone {
        (value - dead_zone) / (32767.0 - dead_zone)
    } else {
        0.0
    }
}

pub fn process_gamepad(pad: &GamepadState, old: &ControllerInput, new: &mut ControllerInput) {
    new.is_connected = true;
    new.is_analog = old.is_analog;

    // TODO: This is a square deadzone, check whether a round one plays better.
    new.stick_average_x = process_stick_value(pad.thumb_lx, LEFT_THUMB_DEADZONE);
    new.stick_average_y = process_stick_value(pad.thumb_ly, LEFT_THUMB_DEADZONE);
    if new.stick_average_x != 0.0 || new.stick_average_y != 0.0 {
        new.is_analog = true;
    }

    if pad.buttons & buttons::DPAD_UP != 0 {
        new.stick_average_y = 1.0;
        new.is_analog = false;
    }
    if pad.buttons & buttons::DPAD_DOWN != 0 {
        new.stick_average_y = -1.0;
        new.is_analog = false;
    }
    if pad.buttons & buttons::DPAD_LEFT != 0 {
        new.stick_average_x = -1.0;
        new.is_analog = false;
    }
    if pad.buttons & buttons::DPAD_RIGHT != 0 {
        new.stick_average_x = 1.0;
        new.is_analog = false;
    }

    let threshold = STICK_BUTTON_THRESHOLD;
    let stick_bit = |pressed: bool| if pressed { 1 } else { 0 };
    new.move_left = process_digital_button(
        stick_bit(new.stick_average_x < -threshold),
        &old.move_left,
        1,
    );
    new.move_right = process_digital_button(
        stick_bit(new.stick_average_x > threshold),
        &old.move_right,
        1,
    );
    new.move_down = process_digital_button(
        stick_bit(new.stick_average_y < -threshold),
        &old.move_down,
        1,
    );
    new.move_up = process_digital_button(
        stick_bit(new.stick_average_y > threshold),
        &old.move_up,
        1,
    );

    new.action_down = process_digital_button(pad.buttons, &old.action_down, buttons::A);
    new.action_right = process_digital_button(pad.buttons, &old.action_right, buttons::B);
    new.action_left = process_digital_button(pad.buttons, &old.action_left, buttons::X);
    new.action_up = process_digital_button(pad.buttons, &old.action_up, buttons::Y);
    new.left_shoulder =
        process_digital_button(pad.buttons, &old.left_shoulder, buttons::LEFT_SHOULDER);
    new.right_shoulder =
        process_digital_button(pad.buttons, &old.right_shoulder, buttons::RIGHT_SHOULDER);
    new.start = process_digital_button(pad.buttons, &old.start, buttons::START);
    new.back = process_digital_button(pad.buttons, &old.back, buttons::BACK);
}

/// Resets `new` for a tick: the keyboard keeps which keys are held, since
/// only up/down events are reported for it, and every count starts at zero.
pub fn begin_frame(old: &Input, new: &mut Input) {
    let old_keyboard = old.get_controller(KEYBOARD_CONTROLLER);
    let new_keyboard = new.get_controller_mut(KEYBOARD_CONTROLLER);
    *new_keyboard = ControllerInput::default();
    new_keyboard.is_connected = true;
    for (new_button, old_button) in new_keyboard
        .buttons_mut()
        .iter_mut()
        .zip(old_keyboard.buttons().iter())
    {
        new_button.ended_down = old_button.ended_down;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_counted_only_on_change() {
        let held = [false, true, true, false, false, true, false, true, true, true];
        let mut old = ButtonState::default();
        for &is_held in held.iter() {
            let mask = if is_held { buttons::A } else { 0 };
            let new = process_digital_button(mask, &old, buttons::A);
            assert_eq!(new.ended_down, is_held);
            let expected = if is_held != old.ended_down { 1 } else { 0 };
            assert_eq!(new.half_transition_count, expected);
            old = new;
        }
    }

    #[test]
    fn digital_button_needs_every_bit() {
        let old = ButtonState::default();
        assert!(!process_digital_button(0x0001, &old, 0x0003).ended_down);
        assert!(process_digital_button(0x00F3, &old, 0x0003).ended_down);
    }

    #[test]
    fn keyboard_counts_each_edge() {
        let mut state = ButtonState::default();
        process_keyboard_message(&mut state, true);
        process_keyboard_message(&mut state, true);
        process_keyboard_message(&mut state, false);
        process_keyboard_message(&mut state, true);
        assert!(state.ended_down);
        assert_eq!(state.half_transition_count, 3);
    }

    #[test]
    fn stick_dead_zone_and_range() {
        assert_eq!(process_stick_value(0, LEFT_THUMB_DEADZONE), 0.0);
        assert_eq!(process_stick_value(LEFT_THUMB_DEADZONE, LEFT_THUMB_DEADZONE), 0.0);
        assert_eq!(process_stick_value(-LEFT_THUMB_DEADZONE, LEFT_THUMB_DEADZONE), 0.0);
        assert_eq!(process_stick_value(i16::max_value(), LEFT_THUMB_DEADZONE), 1.0);
        assert_eq!(process_stick_value(i16::min_value(), LEFT_THUMB_DEADZONE), -1.0);

        let half = process_stick_value(20_000, LEFT_THUMB_DEADZONE);
        assert!(half > 0.0 && half < 1.0);
    }

    #[test]
    fn dpad_overrides_stick_and_drives_move_buttons() {
        let old = ControllerInput::default();
        let mut new = ControllerInput::default();
        let pad = GamepadState {
            buttons: buttons::DPAD_UP | buttons::DPAD_LEFT | buttons::A,
            thumb_lx: 30_000,
            thumb_ly: 0,
        };
        process_gamepad(&pad, &old, &mut new);

        assert!(new.is_connected);
        assert!(!new.is_analog);
        assert_eq!(new.stick_average_x, -1.0);
        assert_eq!(new.stick_average_y, 1.0);
        assert!(new.move_up.ended_down);
        assert!(new.move_left.ended_down);
        assert!(!new.move_right.ended_down);
        assert!(!new.move_down.ended_down);
        assert!(new.action_down.ended_down);
        assert_eq!(new.action_down.half_transition_count, 1);
    }

    #[test]
    fn stick_marks_controller_analog() {
        let old = ControllerInput::default();
        let mut new = ControllerInput::default();
        let pad = GamepadState {
            buttons: 0,
            thumb_lx: 0,
            thumb_ly: -32_768,
        };
        process_gamepad(&pad, &old, &mut new);
        assert!(new.is_analog);
        assert_eq!(new.stick_average_y, -1.0);
        assert!(new.move_down.ended_down);
    }

    #[test]
    fn begin_frame_carries_keyboard_state_and_clears_counts() {
        let mut old = Input::default();
        old.controllers[KEYBOARD_CONTROLLER].move_up = ButtonState {
            ended_down: true,
            half_transition_count: 2,
        };
        old.controllers[KEYBOARD_CONTROLLER].stick_average_x = 0.7;

        let mut new = old.clone();
        new.controllers[KEYBOARD_CONTROLLER].move_down.half_transition_count = 5;
        begin_frame(&old, &mut new);

        let keyboard = new.get_controller(KEYBOARD_CONTROLLER);
        assert!(keyboard.is_connected);
        assert_eq!(
            keyboard.move_up,
            ButtonState {
                ended_down: true,
                half_transition_count: 0
            }
        );
        assert_eq!(keyboard.move_down, ButtonState::default());
        assert_eq!(keyboard.stick_average_x, 0.0);
    }
}
