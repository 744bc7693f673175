//! # Controller Event Mapper Module
//!
//! Drains raw evdev events into a running controller state and produces a
//! normalized [`ControllerSnapshot`] on demand.
//!
//! ## Axis Codes (EV_ABS)
//!
//! | Axis | evdev Code | Snapshot Axis |
//! |------|------------|---------------|
//! | Left Stick X | ABS_X | `LeftX` |
//! | Left Stick Y | ABS_Y | `LeftY` |
//! | Right Stick X | ABS_Z | `RightX` |
//! | Right Stick Y | ABS_RZ | `RightY` |
//! | L2 Trigger | ABS_RX | `LeftTrigger` |
//! | R2 Trigger | ABS_RY | `RightTrigger` |
//! | D-Pad X | ABS_HAT0X | hat x |
//! | D-Pad Y | ABS_HAT0Y | hat y (sign flipped, up = +1) |
//!
//! ## Button Codes (EV_KEY)
//!
//! | Button | evdev Code |
//! |--------|------------|
//! | Cross (×) | BTN_SOUTH |
//! | Circle (○) | BTN_EAST |
//! | Square (□) | BTN_WEST |
//! | Triangle (△) | BTN_NORTH |
//! | L1 / R1 | BTN_TL / BTN_TR |
//! | L2 / R2 click | BTN_TL2 / BTN_TR2 |
//! | Share / Options / PS | BTN_SELECT / BTN_START / BTN_MODE |
//! | L3 / R3 | BTN_THUMBL / BTN_THUMBR |
//! | Touchpad | BTN_TOUCH |

use evdev::{AbsoluteAxisType, InputEvent, InputEventKind, Key};

use super::calibration::AxisRange;
use super::snapshot::{Axis, Button, ControllerSnapshot, Hat};

/// Raw ranges for every snapshot axis, indexed like [`Axis::ALL`].
pub type AxisRanges = [AxisRange; Axis::COUNT];

/// Accumulates evdev events and exposes the latest state as a snapshot.
///
/// Not thread-safe; owned by the polling loop.
///
/// # Examples
///
/// ```
/// use evdev::{AbsoluteAxisType, EventType, InputEvent};
/// use rov_teleop::controller::mapper::EventMapper;
/// use rov_teleop::controller::snapshot::Axis;
///
/// let mut mapper = EventMapper::new();
/// mapper.process_event(&InputEvent::new(EventType::ABSOLUTE, AbsoluteAxisType::ABS_RX.0, 255));
///
/// assert_eq!(mapper.snapshot().axis(Axis::LeftTrigger), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct EventMapper {
    ranges: AxisRanges,
    raw_axes: [i32; Axis::COUNT],
    buttons: [bool; Button::COUNT],
    hat: Option<(i32, i32)>,
}

impl Default for EventMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl EventMapper {
    /// Creates a mapper with DualSense (0-255) ranges and no hat.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ranges([AxisRange::default(); Axis::COUNT], false)
    }

    /// Creates a mapper for a device with the given axis ranges.
    ///
    /// Sticks start at the middle of their range and triggers at their
    /// minimum. When `has_hat` is set the snapshot reports a centered hat
    /// until the first hat event.
    #[must_use]
    pub fn with_ranges(ranges: AxisRanges, has_hat: bool) -> Self {
        let mut raw_axes = [0; Axis::COUNT];
        for (idx, axis) in Axis::ALL.iter().enumerate() {
            let range = ranges[idx];
            raw_axes[idx] = match axis {
                Axis::LeftTrigger | Axis::RightTrigger => range.min,
                _ => range.min + (range.max - range.min + 1) / 2,
            };
        }
        Self {
            ranges,
            raw_axes,
            buttons: [false; Button::COUNT],
            hat: has_hat.then_some((0, 0)),
        }
    }

    /// Processes a single evdev event. Sync and unknown events are ignored.
    pub fn process_event(&mut self, event: &InputEvent) {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => self.process_axis_event(axis, event.value()),
            InputEventKind::Key(key) => self.process_key_event(key, event.value() != 0),
            _ => {}
        }
    }

    /// Builds a normalized snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ControllerSnapshot {
        let mut builder = ControllerSnapshot::builder();
        for (idx, axis) in Axis::ALL.iter().enumerate() {
            builder = builder.axis(*axis, self.ranges[idx].normalize(self.raw_axes[idx]));
        }
        for button in BUTTON_KEYS.iter().map(|(_, button)| *button) {
            builder = builder.button(button, self.buttons[button as usize]);
        }
        if let Some((x, y)) = self.hat {
            // evdev reports up as -1
            builder = builder.hat(Hat::new(x, -y));
        }
        builder.build()
    }

    fn process_axis_event(&mut self, axis: AbsoluteAxisType, value: i32) {
        let target = match axis {
            AbsoluteAxisType::ABS_X => Axis::LeftX,
            AbsoluteAxisType::ABS_Y => Axis::LeftY,
            AbsoluteAxisType::ABS_Z => Axis::RightX,
            AbsoluteAxisType::ABS_RZ => Axis::RightY,
            AbsoluteAxisType::ABS_RX => Axis::LeftTrigger,
            AbsoluteAxisType::ABS_RY => Axis::RightTrigger,
            AbsoluteAxisType::ABS_HAT0X => {
                let (_, y) = self.hat.unwrap_or_default();
                self.hat = Some((value, y));
                return;
            }
            AbsoluteAxisType::ABS_HAT0Y => {
                let (x, _) = self.hat.unwrap_or_default();
                self.hat = Some((x, value));
                return;
            }
            // Gyro, accelerometer, touchpad coordinates
            _ => return,
        };
        self.raw_axes[target as usize] = value;
    }

    fn process_key_event(&mut self, key: Key, pressed: bool) {
        if let Some((_, button)) = BUTTON_KEYS.iter().find(|(code, _)| *code == key) {
            self.buttons[*button as usize] = pressed;
        }
    }
}

/// evdev key code for each snapshot button.
const BUTTON_KEYS: [(Key, Button); Button::COUNT] = [
    (Key::BTN_SOUTH, Button::South),
    (Key::BTN_EAST, Button::East),
    (Key::BTN_WEST, Button::West),
    (Key::BTN_NORTH, Button::North),
    (Key::BTN_TL, Button::L1),
    (Key::BTN_TR, Button::R1),
    (Key::BTN_TL2, Button::L2),
    (Key::BTN_TR2, Button::R2),
    (Key::BTN_SELECT, Button::Share),
    (Key::BTN_START, Button::Options),
    (Key::BTN_MODE, Button::Ps),
    (Key::BTN_THUMBL, Button::L3),
    (Key::BTN_THUMBR, Button::R3),
    (Key::BTN_TOUCH, Button::Touchpad),
];
