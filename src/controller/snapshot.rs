//! # Controller Snapshot Module
//!
//! Normalized, read-only view of the controller at one poll.
//!
//! ## Conventions
//!
//! | Input | Range | Rest | Notes |
//! |-------|-------|------|-------|
//! | Stick X | -1.0..1.0 | 0.0 | Right is positive |
//! | Stick Y | -1.0..1.0 | 0.0 | Up is **negative** |
//! | Trigger | -1.0..1.0 | -1.0 | Fully pressed reads 1.0 |
//! | Hat X | -1/0/1 | 0 | Right is positive |
//! | Hat Y | -1/0/1 | 0 | Up is positive |

use serde::Deserialize;

/// Analog axes exposed by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Left stick horizontal.
    LeftX,
    /// Left stick vertical (up is negative).
    LeftY,
    /// Right stick horizontal.
    RightX,
    /// Right stick vertical (up is negative).
    RightY,
    /// L2 analog trigger.
    LeftTrigger,
    /// R2 analog trigger.
    RightTrigger,
}

impl Axis {
    /// Number of analog axes.
    pub const COUNT: usize = 6;

    /// All axes in index order.
    pub const ALL: [Axis; Axis::COUNT] = [
        Axis::LeftX,
        Axis::LeftY,
        Axis::RightX,
        Axis::RightY,
        Axis::LeftTrigger,
        Axis::RightTrigger,
    ];

    /// Rest position of the axis when untouched.
    #[must_use]
    pub fn rest_value(self) -> f32 {
        match self {
            Axis::LeftTrigger | Axis::RightTrigger => -1.0,
            _ => 0.0,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Digital buttons exposed by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    /// Cross (×).
    South,
    /// Circle (○).
    East,
    /// Square (□).
    West,
    /// Triangle (△).
    North,
    /// Left bumper.
    L1,
    /// Right bumper.
    R1,
    /// L2 digital click.
    L2,
    /// R2 digital click.
    R2,
    /// Share / select.
    Share,
    /// Options / start.
    Options,
    /// PS / mode.
    Ps,
    /// Left stick click.
    L3,
    /// Right stick click.
    R3,
    /// Touchpad click.
    Touchpad,
}

impl Button {
    /// Number of buttons.
    pub const COUNT: usize = 14;

    fn index(self) -> usize {
        self as usize
    }
}

/// Directional pad state, each component in {-1, 0, 1}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Hat {
    /// -1 = left, 1 = right.
    pub x: i8,
    /// -1 = down, 1 = up.
    pub y: i8,
}

impl Hat {
    /// Builds a hat state, collapsing each component to its sign.
    #[must_use]
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x: x.signum() as i8,
            y: y.signum() as i8,
        }
    }
}

/// Controller state captured once per tick.
///
/// # Examples
///
/// ```
/// use rov_teleop::controller::snapshot::{Axis, Button, ControllerSnapshot};
///
/// let snapshot = ControllerSnapshot::builder()
///     .axis(Axis::LeftY, -0.6)
///     .button(Button::L1, true)
///     .build();
///
/// assert_eq!(snapshot.axis(Axis::LeftY), -0.6);
/// assert!(snapshot.button(Button::L1));
/// assert!(!snapshot.button(Button::R1));
/// assert_eq!(snapshot.axis(Axis::LeftTrigger), -1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSnapshot {
    axes: [f32; Axis::COUNT],
    buttons: [bool; Button::COUNT],
    hat: Option<Hat>,
}

impl Default for ControllerSnapshot {
    /// Sticks centered, triggers released, buttons up, no hat.
    fn default() -> Self {
        let mut axes = [0.0; Axis::COUNT];
        for axis in Axis::ALL {
            axes[axis.index()] = axis.rest_value();
        }
        Self {
            axes,
            buttons: [false; Button::COUNT],
            hat: None,
        }
    }
}

impl ControllerSnapshot {
    /// Starts a snapshot from the rest state.
    #[must_use]
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder {
            snapshot: Self::default(),
        }
    }

    /// Returns the value of an axis, in -1.0..=1.0.
    #[must_use]
    pub fn axis(&self, axis: Axis) -> f32 {
        self.axes[axis.index()]
    }

    /// Returns whether a button is held.
    #[must_use]
    pub fn button(&self, button: Button) -> bool {
        self.buttons[button.index()]
    }

    /// Returns the directional pad, if the controller has one.
    #[must_use]
    pub fn hat(&self) -> Option<Hat> {
        self.hat
    }
}

/// Builder used by the event accumulator and by tests.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    snapshot: ControllerSnapshot,
}

impl SnapshotBuilder {
    /// Sets an axis; values are clamped into -1.0..=1.0.
    #[must_use]
    pub fn axis(mut self, axis: Axis, value: f32) -> Self {
        self.snapshot.axes[axis.index()] = if value.is_nan() {
            axis.rest_value()
        } else {
            value.clamp(-1.0, 1.0)
        };
        self
    }

    /// Sets a button.
    #[must_use]
    pub fn button(mut self, button: Button, pressed: bool) -> Self {
        self.snapshot.buttons[button.index()] = pressed;
        self
    }

    /// Sets the directional pad.
    #[must_use]
    pub fn hat(mut self, hat: Hat) -> Self {
        self.snapshot.hat = Some(hat);
        self
    }

    /// Finishes the snapshot.
    #[must_use]
    pub fn build(self) -> ControllerSnapshot {
        self.snapshot
    }
}
