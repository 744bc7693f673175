//! # Calibration Module
//!
//! Converts raw evdev axis values to the normalized -1.0..1.0 range and
//! filters stick noise with a dead zone.
//!
//! ## Dead Zone
//!
//! A dead zone eliminates small stick movements near center to prevent drift.
//! Magnitudes strictly below the threshold read as exactly 0.0. A value whose
//! magnitude equals the threshold is active and passes through unchanged; the
//! remaining range is **not** rescaled, so gains act on the raw deflection.
//!
//! ## Usage
//!
//! ```
//! use rov_teleop::controller::calibration::DeadZone;
//!
//! let dz = DeadZone::new(0.05);
//!
//! assert_eq!(dz.apply(0.02), 0.0);
//! assert_eq!(dz.apply(-0.049), 0.0);
//! assert_eq!(dz.apply(0.05), 0.05);
//! assert_eq!(dz.apply(0.6), 0.6);
//! ```

/// Largest accepted dead-zone threshold.
pub const MAX_DEAD_ZONE: f32 = 0.5;

/// Symmetric dead zone around the axis center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadZone {
    /// Threshold as a fraction of full deflection (0.0 to 0.5).
    threshold: f32,
}

impl Default for DeadZone {
    fn default() -> Self {
        Self { threshold: 0.05 }
    }
}

impl DeadZone {
    /// Creates a dead zone. Thresholds outside 0.0..=0.5 are clamped.
    #[must_use]
    pub fn new(threshold: f32) -> Self {
        let threshold = if threshold.is_nan() { 0.0 } else { threshold };
        Self {
            threshold: threshold.clamp(0.0, MAX_DEAD_ZONE),
        }
    }

    /// Returns the configured threshold.
    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Applies the dead zone to a normalized value.
    ///
    /// Returns 0.0 when `abs(value) < threshold`, otherwise `value`.
    /// NaN reads as 0.0.
    #[must_use]
    pub fn apply(&self, value: f32) -> f32 {
        if value.is_nan() || value.abs() < self.threshold {
            0.0
        } else {
            value
        }
    }
}

/// Raw reporting range of one evdev axis.
///
/// DualSense sticks and triggers report 0-255; other pads report their own
/// bounds through absinfo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    /// Raw value at full negative deflection (or trigger released).
    pub min: i32,
    /// Raw value at full positive deflection (or trigger pressed).
    pub max: i32,
}

impl Default for AxisRange {
    fn default() -> Self {
        Self { min: 0, max: 255 }
    }
}

impl AxisRange {
    /// Creates a range, falling back to 0-255 when the bounds are degenerate.
    #[must_use]
    pub fn new(min: i32, max: i32) -> Self {
        if max > min {
            Self { min, max }
        } else {
            Self::default()
        }
    }

    /// Maps a raw value linearly onto -1.0..=1.0.
    ///
    /// # Examples
    ///
    /// ```
    /// use rov_teleop::controller::calibration::AxisRange;
    ///
    /// let range = AxisRange::new(0, 255);
    /// assert_eq!(range.normalize(0), -1.0);
    /// assert_eq!(range.normalize(255), 1.0);
    /// assert!(range.normalize(128).abs() < 0.01);
    /// ```
    #[must_use]
    pub fn normalize(&self, raw: i32) -> f32 {
        let clamped = raw.clamp(self.min, self.max);
        let span = (self.max - self.min) as f32;
        let unit = (clamped - self.min) as f32 / span;
        (unit * 2.0 - 1.0).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== DeadZone Tests ====================

    #[test]
    fn test_dead_zone_default() {
        assert!((DeadZone::default().threshold() - 0.05).abs() < f32::EPSILON);
    }

    #[test]
    fn test_dead_zone_clamps_threshold() {
        assert_eq!(DeadZone::new(0.9).threshold(), MAX_DEAD_ZONE);
        assert_eq!(DeadZone::new(-0.1).threshold(), 0.0);
        assert_eq!(DeadZone::new(f32::NAN).threshold(), 0.0);
    }

    #[test]
    fn test_dead_zone_within_zone_is_zero() {
        let dz = DeadZone::new(0.1);
        for v in [0.0, 0.05, -0.05, 0.0999, -0.0999] {
            assert_eq!(dz.apply(v), 0.0, "{} should be dead", v);
        }
    }

    #[test]
    fn test_dead_zone_boundary_is_active() {
        let dz = DeadZone::new(0.25);
        assert_eq!(dz.apply(0.25), 0.25);
        assert_eq!(dz.apply(-0.25), -0.25);
    }

    #[test]
    fn test_dead_zone_outside_zone_passes_through() {
        let dz = DeadZone::new(0.05);
        assert_eq!(dz.apply(0.6), 0.6);
        assert_eq!(dz.apply(-1.0), -1.0);
    }

    #[test]
    fn test_dead_zone_zero_threshold() {
        let dz = DeadZone::new(0.0);
        assert_eq!(dz.apply(0.001), 0.001);
        assert_eq!(dz.apply(0.0), 0.0);
    }

    #[test]
    fn test_dead_zone_nan_is_zero() {
        assert_eq!(DeadZone::default().apply(f32::NAN), 0.0);
    }

    // ==================== AxisRange Tests ====================

    #[test]
    fn test_axis_range_endpoints() {
        let range = AxisRange::new(-32768, 32767);
        assert_eq!(range.normalize(-32768), -1.0);
        assert_eq!(range.normalize(32767), 1.0);
    }

    #[test]
    fn test_axis_range_clamps_raw() {
        let range = AxisRange::default();
        assert_eq!(range.normalize(-50), -1.0);
        assert_eq!(range.normalize(400), 1.0);
    }

    #[test]
    fn test_axis_range_degenerate_falls_back() {
        assert_eq!(AxisRange::new(10, 10), AxisRange::default());
        assert_eq!(AxisRange::new(5, -5), AxisRange::default());
    }
}
