//! # Claw Mapper Module
//!
//! Maps a controller snapshot to the two servos of a single-claw gripper.
//!
//! | Channel | Input | Behaviour |
//! |---------|-------|-----------|
//! | claw | L2 / R2 triggers | Close / open, latched |
//! | roll | L1 / R1 bumpers | One step per tick while held |
//!
//! A trigger counts as pulled once it reaches the threshold (inclusive).
//! When both triggers or both bumpers are held, the closing / left-rolling
//! input wins. A roll step that would leave the roll range is skipped.

use tracing::{debug, info};

use super::detent::Detent;
use super::{ActuatorCommand, ChannelRange};
use crate::controller::snapshot::{Axis, Button, ControllerSnapshot};

/// Servo angle of the closed claw.
pub const CLAW_CLOSED: i32 = 90;
/// Servo angle of the open claw.
pub const CLAW_OPEN: i32 = 180;
/// Lowest roll angle.
pub const ROLL_MIN: i32 = 0;
/// Highest roll angle.
pub const ROLL_MAX: i32 = 180;
/// Roll angle at startup.
pub const ROLL_START: i32 = 90;
/// Trigger position that counts as pulled.
pub const TRIGGER_THRESHOLD: f32 = 0.9;

/// Wire name of the claw channel.
pub const CLAW_CHANNEL: &str = "claw";
/// Wire name of the roll channel.
pub const ROLL_CHANNEL: &str = "roll";

/// Claw jaw position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grip {
    Closed,
    Open,
}

/// Tunables for the claw profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ClawSettings {
    pub closed: i32,
    pub open: i32,
    pub roll_min: i32,
    pub roll_max: i32,
    pub roll_start: i32,
    pub roll_step: i32,
    pub trigger_threshold: f32,
    pub close_trigger: Axis,
    pub open_trigger: Axis,
    pub roll_left: Button,
    pub roll_right: Button,
}

impl Default for ClawSettings {
    fn default() -> Self {
        Self {
            closed: CLAW_CLOSED,
            open: CLAW_OPEN,
            roll_min: ROLL_MIN,
            roll_max: ROLL_MAX,
            roll_start: ROLL_START,
            roll_step: 1,
            trigger_threshold: TRIGGER_THRESHOLD,
            close_trigger: Axis::LeftTrigger,
            open_trigger: Axis::RightTrigger,
            roll_left: Button::L1,
            roll_right: Button::R1,
        }
    }
}

/// Stateful mapper holding the latched grip and the roll accumulator.
///
/// # Examples
///
/// ```
/// use rov_teleop::command::claw::{ClawMapper, ClawSettings, Grip};
/// use rov_teleop::controller::snapshot::{Axis, ControllerSnapshot};
///
/// let mut claw = ClawMapper::starting_at(ClawSettings::default(), Grip::Open, 90);
/// let snapshot = ControllerSnapshot::builder()
///     .axis(Axis::LeftTrigger, 1.0)
///     .axis(Axis::RightTrigger, 0.0)
///     .build();
///
/// let command = claw.map(&snapshot);
/// assert_eq!(command.get("claw"), Some(90));
/// assert_eq!(claw.grip(), Grip::Closed);
/// ```
#[derive(Debug, Clone)]
pub struct ClawMapper {
    settings: ClawSettings,
    claw_range: ChannelRange,
    roll_range: ChannelRange,
    grip: Grip,
    roll: i32,
}

impl ClawMapper {
    /// Creates a mapper with the claw closed and roll at its start angle.
    #[must_use]
    pub fn new(settings: ClawSettings) -> Self {
        let roll = settings.roll_start;
        Self::starting_at(settings, Grip::Closed, roll)
    }

    /// Creates a mapper from an explicit starting state.
    #[must_use]
    pub fn starting_at(settings: ClawSettings, grip: Grip, roll: i32) -> Self {
        let claw_range = ChannelRange::new(settings.closed, settings.open, settings.closed);
        let roll_range = ChannelRange::new(settings.roll_min, settings.roll_max, settings.roll_start);
        let roll = roll_range.clamp(roll as i64);
        Self {
            settings,
            claw_range,
            roll_range,
            grip,
            roll,
        }
    }

    /// Current latched grip.
    pub fn grip(&self) -> Grip {
        self.grip
    }

    /// Current roll angle.
    pub fn roll(&self) -> i32 {
        self.roll
    }

    /// Applies one tick of input and returns the resulting command.
    pub fn map(&mut self, snapshot: &ControllerSnapshot) -> ActuatorCommand {
        let threshold = self.settings.trigger_threshold;
        let grip_detent = Detent::resolve(
            snapshot.axis(self.settings.close_trigger) >= threshold,
            snapshot.axis(self.settings.open_trigger) >= threshold,
        );
        if let Some(grip) = grip_detent.select(Some(Grip::Closed), None, Some(Grip::Open)) {
            if grip != self.grip {
                self.grip = grip;
                info!(
                    "Claw set to {} (opened: {})",
                    self.grip_angle(),
                    grip == Grip::Open
                );
            }
        }

        let roll_detent = Detent::resolve(
            snapshot.button(self.settings.roll_left),
            snapshot.button(self.settings.roll_right),
        );
        // A step that overflows is out of range too
        let next = roll_detent
            .step()
            .checked_mul(self.settings.roll_step)
            .and_then(|delta| self.roll.checked_add(delta));
        if let Some(next) = next {
            if next != self.roll && self.roll_range.contains(next) {
                self.roll = next;
                debug!("Roll moved to {}", self.roll);
            }
        }

        self.command(self.grip_angle(), self.roll)
    }

    /// Claw closed, roll at its start angle.
    ///
    /// Closed rather than mid-travel: a closed claw is the safe idle position.
    #[must_use]
    pub fn neutral(&self) -> ActuatorCommand {
        self.command(self.claw_range.neutral(), self.roll_range.neutral())
    }

    /// Returns the internal state to the neutral position.
    pub fn reset(&mut self) {
        self.grip = Grip::Closed;
        self.roll = self.roll_range.neutral();
    }

    fn grip_angle(&self) -> i32 {
        match self.grip {
            Grip::Closed => self.settings.closed,
            Grip::Open => self.settings.open,
        }
    }

    fn command(&self, claw: i32, roll: i32) -> ActuatorCommand {
        let mut command = ActuatorCommand::new();
        command.push(CLAW_CHANNEL, claw as i64, &self.claw_range);
        command.push(ROLL_CHANNEL, roll as i64, &self.roll_range);
        command
    }
}
