//! # Thruster Mixer Module
//!
//! Maps a controller snapshot to thruster and servo pulse widths.
//!
//! ## Channel Sources
//!
//! Each output channel is driven by one source:
//!
//! - **mix**: `neutral + round(Σ axis · gain)` over one or more axes, after
//!   the dead zone. Differential drive is expressed as opposite gains.
//! - **buttons**: a low/high button pair resolved through [`Detent`].
//! - **hat**: one directional-pad component resolved through [`Detent`].
//!
//! Every result is clamped to the channel range.
//!
//! ## Default ROV Layout
//!
//! | Channel | Source | Function |
//! |---------|--------|----------|
//! | t1, t6 | -RightY · 400 | Vertical thrusters |
//! | t2 | LeftY · 400 - LeftX · 200 | Horizontal, rear left |
//! | t3 | -LeftY · 400 - LeftX · 200 | Horizontal, front left |
//! | t4 | LeftY · 400 + LeftX · 200 | Horizontal, rear right |
//! | t5 | -LeftY · 400 + LeftX · 200 | Horizontal, front right |
//! | turn | L1 / R1 → 1300 / 1700 | Gripper rotation |
//! | grip | L2 / R2 → 1300 / 1700 | Gripper jaw |
//! | cam | D-Pad down / up → 1300 / 1700 | Camera tilt |
//!
//! Stick Y reads negative when pushed up, so "forward" is `-LeftY`.

use serde::Deserialize;

use super::detent::Detent;
use super::{ActuatorCommand, ChannelRange};
use crate::controller::calibration::DeadZone;
use crate::controller::snapshot::{Axis, Button, ControllerSnapshot};

/// Forward/back gain of the default layout.
pub const FORWARD_GAIN: f32 = 400.0;
/// Yaw gain of the default layout.
pub const YAW_GAIN: f32 = 200.0;
/// Vertical gain of the default layout.
pub const VERTICAL_GAIN: f32 = 400.0;
/// Servo pulse for a held low button.
pub const SERVO_LOW: i32 = 1300;
/// Servo pulse for a held high button.
pub const SERVO_HIGH: i32 = 1700;

/// One weighted axis contribution.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MixTerm {
    /// Snapshot axis to read.
    pub axis: Axis,
    /// Pulse offset at full positive deflection.
    pub gain: f32,
}

impl MixTerm {
    fn new(axis: Axis, gain: f32) -> Self {
        Self { axis, gain }
    }
}

/// Which directional-pad component drives a hat channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HatComponent {
    /// Left (-1) / right (+1).
    X,
    /// Down (-1) / up (+1).
    #[default]
    Y,
}

/// What drives a channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelSource {
    /// Linear combination of analog axes.
    Mix { terms: Vec<MixTerm> },
    /// Opposing button pair.
    Buttons {
        low: Button,
        high: Button,
        low_value: i32,
        high_value: i32,
    },
    /// Directional-pad component.
    Hat {
        #[serde(default)]
        component: HatComponent,
        low_value: i32,
        high_value: i32,
    },
}

/// One output channel of the mixer.
///
/// `min`, `max` and `neutral` override the mixer-wide pulse range.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChannelSpec {
    pub name: String,
    pub source: ChannelSource,
    #[serde(default)]
    pub min: Option<i32>,
    #[serde(default)]
    pub max: Option<i32>,
    #[serde(default)]
    pub neutral: Option<i32>,
}

impl ChannelSpec {
    fn new(name: &str, source: ChannelSource) -> Self {
        Self {
            name: name.to_string(),
            source,
            min: None,
            max: None,
            neutral: None,
        }
    }

    fn mix(name: &str, terms: &[MixTerm]) -> Self {
        Self::new(name, ChannelSource::Mix { terms: terms.to_vec() })
    }

    fn buttons(name: &str, low: Button, high: Button) -> Self {
        Self::new(
            name,
            ChannelSource::Buttons {
                low,
                high,
                low_value: SERVO_LOW,
                high_value: SERVO_HIGH,
            },
        )
    }
}

/// The nine-channel ROV layout: six thrusters, turn, grip, camera.
#[must_use]
pub fn rov_layout() -> Vec<ChannelSpec> {
    let fwd = |sign: f32| MixTerm::new(Axis::LeftY, -sign * FORWARD_GAIN);
    let yaw = |sign: f32| MixTerm::new(Axis::LeftX, sign * YAW_GAIN);
    let vertical = MixTerm::new(Axis::RightY, -VERTICAL_GAIN);

    vec![
        ChannelSpec::mix("t1", &[vertical]),
        ChannelSpec::mix("t2", &[fwd(-1.0), yaw(-1.0)]),
        ChannelSpec::mix("t3", &[fwd(1.0), yaw(-1.0)]),
        ChannelSpec::mix("t4", &[fwd(-1.0), yaw(1.0)]),
        ChannelSpec::mix("t5", &[fwd(1.0), yaw(1.0)]),
        ChannelSpec::mix("t6", &[vertical]),
        ChannelSpec::buttons("turn", Button::L1, Button::R1),
        ChannelSpec::buttons("grip", Button::L2, Button::R2),
        ChannelSpec::new(
            "cam",
            ChannelSource::Hat {
                component: HatComponent::Y,
                low_value: SERVO_LOW,
                high_value: SERVO_HIGH,
            },
        ),
    ]
}

/// Stateless snapshot-to-command mapper for the thruster profile.
///
/// # Examples
///
/// ```
/// use rov_teleop::command::mixer::{rov_layout, ChannelMixer};
/// use rov_teleop::command::ChannelRange;
/// use rov_teleop::controller::calibration::DeadZone;
/// use rov_teleop::controller::snapshot::{Axis, ControllerSnapshot};
///
/// let mixer = ChannelMixer::new(DeadZone::new(0.05), ChannelRange::new(1100, 1900, 1500), &rov_layout());
///
/// // Left stick pushed 60% forward (up reads negative)
/// let snapshot = ControllerSnapshot::builder().axis(Axis::LeftY, -0.6).build();
/// let command = mixer.map(&snapshot);
///
/// assert_eq!(command.get("t3"), Some(1740));
/// assert_eq!(command.get("t2"), Some(1260));
/// ```
#[derive(Debug, Clone)]
pub struct ChannelMixer {
    dead_zone: DeadZone,
    channels: Vec<(ChannelSpec, ChannelRange)>,
}

impl ChannelMixer {
    /// Creates a mixer. Per-channel overrides are resolved against `pulse`.
    #[must_use]
    pub fn new(dead_zone: DeadZone, pulse: ChannelRange, specs: &[ChannelSpec]) -> Self {
        let channels = specs
            .iter()
            .map(|spec| {
                let range = ChannelRange::new(
                    spec.min.unwrap_or(pulse.min()),
                    spec.max.unwrap_or(pulse.max()),
                    spec.neutral.unwrap_or(pulse.neutral()),
                );
                (spec.clone(), range)
            })
            .collect();
        Self {
            dead_zone,
            channels,
        }
    }

    /// Maps a snapshot to a command. Total over all snapshots.
    #[must_use]
    pub fn map(&self, snapshot: &ControllerSnapshot) -> ActuatorCommand {
        let mut command = ActuatorCommand::new();
        for (spec, range) in &self.channels {
            let raw = self.channel_raw(&spec.source, range, snapshot);
            command.push(spec.name.as_str(), raw, range);
        }
        command
    }

    /// Every channel at its neutral value.
    #[must_use]
    pub fn neutral(&self) -> ActuatorCommand {
        let mut command = ActuatorCommand::new();
        for (spec, range) in &self.channels {
            command.push(spec.name.as_str(), range.neutral() as i64, range);
        }
        command
    }

    /// Resolved ranges in channel order.
    pub fn ranges(&self) -> impl Iterator<Item = &ChannelRange> {
        self.channels.iter().map(|(_, range)| range)
    }

    fn channel_raw(
        &self,
        source: &ChannelSource,
        range: &ChannelRange,
        snapshot: &ControllerSnapshot,
    ) -> i64 {
        let neutral = range.neutral() as i64;
        match source {
            ChannelSource::Mix { terms } => {
                let sum: f32 = terms
                    .iter()
                    .map(|term| self.dead_zone.apply(snapshot.axis(term.axis)) * term.gain)
                    .sum();
                // float-to-int casts saturate; NaN becomes 0
                neutral.saturating_add(sum.round() as i64)
            }
            ChannelSource::Buttons {
                low,
                high,
                low_value,
                high_value,
            } => Detent::resolve(snapshot.button(*low), snapshot.button(*high))
                .select(*low_value as i64, neutral, *high_value as i64),
            ChannelSource::Hat {
                component,
                low_value,
                high_value,
            } => {
                let detent = snapshot
                    .hat()
                    .map(|hat| match component {
                        HatComponent::X => Detent::from_hat(hat.x),
                        HatComponent::Y => Detent::from_hat(hat.y),
                    })
                    .unwrap_or(Detent::Neutral);
                detent.select(*low_value as i64, neutral, *high_value as i64)
            }
        }
    }
}
