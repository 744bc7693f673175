//! # Wire Format
//!
//! Text encoding of actuator commands. Every line is ASCII and ends in `\n`.
//!
//! | Format | Lines per command | Example |
//! |--------|-------------------|---------|
//! | `Csv` | 1 | `1500,1740,1260,1740,1260,1500,1500,1500,1500\n` |
//! | `Tagged` | 1 per channel | `claw:90\n`, `roll:90\n` |
//!
//! Channel order and count are agreed out-of-band with the receiving board;
//! there is no header, checksum or acknowledgement.

use crate::command::ActuatorCommand;

/// Line terminator.
pub const LINE_END: char = '\n';

/// Line layout understood by the receiving board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// All channel values, comma separated, on one line.
    Csv,
    /// One `name:value` line per channel.
    Tagged,
}

impl WireFormat {
    /// Encodes a command into its lines, in wire order.
    ///
    /// # Examples
    ///
    /// ```
    /// use rov_teleop::command::{ActuatorCommand, ChannelRange};
    /// use rov_teleop::serial::wire::WireFormat;
    ///
    /// let range = ChannelRange::new(0, 2000, 1500);
    /// let mut command = ActuatorCommand::new();
    /// command.push("a", 1500, &range);
    /// command.push("b", 1740, &range);
    ///
    /// assert_eq!(WireFormat::Csv.encode(&command), vec!["1500,1740\n"]);
    /// assert_eq!(WireFormat::Tagged.encode(&command), vec!["a:1500\n", "b:1740\n"]);
    /// ```
    #[must_use]
    pub fn encode(self, command: &ActuatorCommand) -> Vec<String> {
        match self {
            WireFormat::Csv => {
                let mut line = command
                    .values()
                    .map(|value| value.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                line.push(LINE_END);
                vec![line]
            }
            WireFormat::Tagged => command
                .channels()
                .iter()
                .map(|channel| format!("{}:{}{}", channel.name(), channel.value(), LINE_END))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ChannelRange;

    fn command(values: &[(&str, i64)]) -> ActuatorCommand {
        let range = ChannelRange::new(-2000, 2000, 0);
        let mut command = ActuatorCommand::new();
        for (name, value) in values {
            command.push(*name, *value, &range);
        }
        command
    }

    #[test]
    fn test_csv_nine_channel_neutral() {
        let neutral = command(&[
            ("t1", 1500),
            ("t2", 1500),
            ("t3", 1500),
            ("t4", 1500),
            ("t5", 1500),
            ("t6", 1500),
            ("turn", 1500),
            ("grip", 1500),
            ("cam", 1500),
        ]);
        assert_eq!(
            WireFormat::Csv.encode(&neutral),
            vec!["1500,1500,1500,1500,1500,1500,1500,1500,1500\n"]
        );
    }

    #[test]
    fn test_csv_negative_values() {
        assert_eq!(WireFormat::Csv.encode(&command(&[("a", -5), ("b", 0)])), vec!["-5,0\n"]);
    }

    #[test]
    fn test_csv_empty_command_is_bare_newline() {
        assert_eq!(WireFormat::Csv.encode(&ActuatorCommand::new()), vec!["\n"]);
    }

    #[test]
    fn test_tagged_one_line_per_channel() {
        let lines = WireFormat::Tagged.encode(&command(&[("claw", 90), ("roll", 91)]));
        assert_eq!(lines, vec!["claw:90\n", "roll:91\n"]);
        assert!(lines.iter().all(|line| line.is_ascii()));
    }

    #[test]
    fn test_tagged_empty_command_has_no_lines() {
        assert!(WireFormat::Tagged.encode(&ActuatorCommand::new()).is_empty());
    }
}
