//! # Detent Module
//!
//! Three-position resolution for a pair of opposing digital inputs.
//!
//! When both inputs of a pair are held the **low** input wins. The order is
//! fixed so the outcome of a simultaneous press never depends on event
//! timing.

/// Resolved position of an opposing input pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detent {
    /// Low input held (close, rotate left, tilt down).
    Low,
    /// Neither input held.
    Neutral,
    /// High input held and low input released.
    High,
}

impl Detent {
    /// Resolves a button pair, low first.
    ///
    /// # Examples
    ///
    /// ```
    /// use rov_teleop::command::detent::Detent;
    ///
    /// assert_eq!(Detent::resolve(false, false), Detent::Neutral);
    /// assert_eq!(Detent::resolve(false, true), Detent::High);
    /// assert_eq!(Detent::resolve(true, true), Detent::Low);
    /// ```
    #[must_use]
    pub fn resolve(low: bool, high: bool) -> Self {
        if low {
            Detent::Low
        } else if high {
            Detent::High
        } else {
            Detent::Neutral
        }
    }

    /// Resolves one hat component: negative is low, positive is high.
    #[must_use]
    pub fn from_hat(component: i8) -> Self {
        Self::resolve(component < 0, component > 0)
    }

    /// Picks the value for this position.
    #[must_use]
    pub fn select<T>(self, low: T, neutral: T, high: T) -> T {
        match self {
            Detent::Low => low,
            Detent::Neutral => neutral,
            Detent::High => high,
        }
    }

    /// Step direction for incremental actuators.
    #[must_use]
    pub fn step(self) -> i32 {
        self.select(-1, 0, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_truth_table() {
        assert_eq!(Detent::resolve(false, false), Detent::Neutral);
        assert_eq!(Detent::resolve(true, false), Detent::Low);
        assert_eq!(Detent::resolve(false, true), Detent::High);
    }

    #[test]
    fn test_simultaneous_press_low_wins() {
        assert_eq!(Detent::resolve(true, true), Detent::Low);
    }

    #[test]
    fn test_from_hat() {
        assert_eq!(Detent::from_hat(-1), Detent::Low);
        assert_eq!(Detent::from_hat(0), Detent::Neutral);
        assert_eq!(Detent::from_hat(1), Detent::High);
    }

    #[test]
    fn test_select_and_step() {
        assert_eq!(Detent::Low.select(1300, 1500, 1700), 1300);
        assert_eq!(Detent::Neutral.select(1300, 1500, 1700), 1500);
        assert_eq!(Detent::High.select(1300, 1500, 1700), 1700);
        assert_eq!(Detent::Low.step(), -1);
        assert_eq!(Detent::Neutral.step(), 0);
        assert_eq!(Detent::High.step(), 1);
    }
}
