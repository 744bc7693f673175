//! # Command Module
//!
//! Maps controller snapshots to actuator commands.
//!
//! This module handles:
//! - Channel ranges and clamping ([`ChannelRange`])
//! - The per-tick command record ([`ActuatorCommand`])
//! - Button-pair resolution ([`detent::Detent`])
//! - The thruster mixer and the claw mapper

pub mod claw;
pub mod detent;
pub mod mixer;

/// Declared bounds and rest value of one channel.
///
/// # Examples
///
/// ```
/// use rov_teleop::command::ChannelRange;
///
/// let range = ChannelRange::new(1100, 1900, 1500);
/// assert_eq!(range.clamp(2100), 1900);
/// assert_eq!(range.clamp(900), 1100);
/// assert_eq!(range.clamp(1740), 1740);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRange {
    min: i32,
    max: i32,
    neutral: i32,
}

impl ChannelRange {
    /// Creates a range. Swapped bounds are reordered and the neutral value is
    /// pulled inside the bounds.
    #[must_use]
    pub fn new(min: i32, max: i32, neutral: i32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min,
            max,
            neutral: neutral.clamp(min, max),
        }
    }

    /// Lower bound.
    #[must_use]
    pub fn min(&self) -> i32 {
        self.min
    }

    /// Upper bound.
    #[must_use]
    pub fn max(&self) -> i32 {
        self.max
    }

    /// Value meaning "no motion".
    #[must_use]
    pub fn neutral(&self) -> i32 {
        self.neutral
    }

    /// Returns whether `value` lies within the bounds.
    #[must_use]
    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Clamps a raw computed value into the bounds.
    #[must_use]
    pub fn clamp(&self, raw: i64) -> i32 {
        raw.clamp(self.min as i64, self.max as i64) as i32
    }
}

/// One named channel inside a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelValue {
    name: String,
    value: i32,
}

impl ChannelValue {
    /// Channel name as used on the wire for tagged formats.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Clamped channel value.
    pub fn value(&self) -> i32 {
        self.value
    }
}

/// Target values for every actuator at one instant.
///
/// Values can only be added through [`ActuatorCommand::push`], which clamps,
/// so every channel lies within its declared range.
///
/// # Examples
///
/// ```
/// use rov_teleop::command::{ActuatorCommand, ChannelRange};
///
/// let range = ChannelRange::new(1100, 1900, 1500);
/// let mut command = ActuatorCommand::new();
/// command.push("t1", 1740, &range);
/// command.push("t2", 2300, &range);
///
/// assert_eq!(command.get("t1"), Some(1740));
/// assert_eq!(command.get("t2"), Some(1900));
/// assert_eq!(command.values().collect::<Vec<_>>(), vec![1740, 1900]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActuatorCommand {
    channels: Vec<ChannelValue>,
}

impl ActuatorCommand {
    /// Creates an empty command.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a channel, clamping `raw` into `range`. Returns the stored value.
    pub fn push(&mut self, name: impl Into<String>, raw: i64, range: &ChannelRange) -> i32 {
        let value = range.clamp(raw);
        self.channels.push(ChannelValue {
            name: name.into(),
            value,
        });
        value
    }

    /// Channels in wire order.
    pub fn channels(&self) -> &[ChannelValue] {
        &self.channels
    }

    /// Channel values in wire order.
    pub fn values(&self) -> impl Iterator<Item = i32> + '_ {
        self.channels.iter().map(|channel| channel.value)
    }

    /// Looks up a channel value by name.
    pub fn get(&self, name: &str) -> Option<i32> {
        self.channels
            .iter()
            .find(|channel| channel.name == name)
            .map(|channel| channel.value)
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns whether the command has no channels.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_reorders_bounds() {
        let range = ChannelRange::new(1900, 1100, 1500);
        assert_eq!(range.min(), 1100);
        assert_eq!(range.max(), 1900);
    }

    #[test]
    fn test_range_pulls_neutral_inside() {
        assert_eq!(ChannelRange::new(90, 180, 0).neutral(), 90);
        assert_eq!(ChannelRange::new(90, 180, 500).neutral(), 180);
    }

    #[test]
    fn test_clamp_extreme_raw_values() {
        let range = ChannelRange::new(0, 180, 90);
        assert_eq!(range.clamp(i64::MAX), 180);
        assert_eq!(range.clamp(i64::MIN), 0);
    }

    #[test]
    fn test_command_preserves_order() {
        let range = ChannelRange::new(0, 10, 5);
        let mut command = ActuatorCommand::new();
        for (idx, name) in ["a", "b", "c"].iter().enumerate() {
            command.push(*name, idx as i64, &range);
        }
        let names: Vec<_> = command.channels().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(command.len(), 3);
        assert!(!command.is_empty());
    }

    #[test]
    fn test_command_get_missing_channel() {
        assert_eq!(ActuatorCommand::new().get("claw"), None);
    }
}
