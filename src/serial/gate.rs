//! # Transmission Gate
//!
//! Suppresses re-transmission of an unchanged command line.
//!
//! The gate remembers the last line handed to the transport and lets a new
//! line through only when it differs byte-for-byte. A line is remembered
//! as soon as it is attempted, so a write that fails is not retried while
//! the input stays the same; the next *different* line writes again.

/// Last-line memory for one wire slot.
///
/// # Examples
///
/// ```
/// use rov_teleop::serial::gate::TransmissionGate;
///
/// let mut gate = TransmissionGate::new();
/// assert!(gate.admit("1500,1500\n"));
/// gate.record("1500,1500\n");
/// assert!(!gate.admit("1500,1500\n"));
/// assert!(gate.admit("1740,1500\n"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransmissionGate {
    last_line: Option<String>,
}

impl TransmissionGate {
    /// Creates a gate that has not seen any line.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether `line` differs from the last recorded line.
    #[must_use]
    pub fn admit(&self, line: &str) -> bool {
        self.last_line.as_deref() != Some(line)
    }

    /// Records `line` as the last transmitted line.
    pub fn record(&mut self, line: &str) {
        match &mut self.last_line {
            Some(last) => {
                last.clear();
                last.push_str(line);
            }
            None => self.last_line = Some(line.to_string()),
        }
    }

    /// Last recorded line, if any.
    pub fn last_line(&self) -> Option<&str> {
        self.last_line.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_gate_admits_anything() {
        let gate = TransmissionGate::new();
        assert!(gate.admit("claw:90\n"));
        assert!(gate.admit(""));
        assert_eq!(gate.last_line(), None);
    }

    #[test]
    fn test_identical_line_rejected() {
        let mut gate = TransmissionGate::new();
        gate.record("claw:90\n");
        assert!(!gate.admit("claw:90\n"));
    }

    #[test]
    fn test_comparison_is_byte_exact() {
        let mut gate = TransmissionGate::new();
        gate.record("1500,1500\n");
        assert!(gate.admit("1500,1500"));
        assert!(gate.admit("1500,1500\r\n"));
        assert!(gate.admit(" 1500,1500\n"));
    }

    #[test]
    fn test_record_replaces_previous() {
        let mut gate = TransmissionGate::new();
        gate.record("a\n");
        gate.record("b\n");
        assert_eq!(gate.last_line(), Some("b\n"));
        assert!(gate.admit("a\n"));
    }
}
