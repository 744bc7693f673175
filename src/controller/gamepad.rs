//! # Gamepad Device Module
//!
//! Game controller detection and connection using the Linux evdev interface.
//!
//! ## Controller Detection
//!
//! When no device path is configured, every `/dev/input/event*` node is
//! opened in sorted order and the first one that reports both a face button
//! (`BTN_SOUTH`) and a left stick (`ABS_X`, `ABS_Y`) is used. PS5 DualSense,
//! PS4 and Xbox pads all qualify; keyboards and mice do not.

use evdev::{AbsoluteAxisType, Device, EventStream, Key};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::calibration::AxisRange;
use super::mapper::{AxisRanges, EventMapper};
use super::snapshot::Axis;
use crate::error::{Result, TeleopError};

/// Directory scanned for input devices.
const INPUT_DIR: &str = "/dev/input";

/// evdev axis code backing each snapshot axis, in [`Axis::ALL`] order.
const AXIS_CODES: [AbsoluteAxisType; Axis::COUNT] = [
    AbsoluteAxisType::ABS_X,
    AbsoluteAxisType::ABS_Y,
    AbsoluteAxisType::ABS_Z,
    AbsoluteAxisType::ABS_RZ,
    AbsoluteAxisType::ABS_RX,
    AbsoluteAxisType::ABS_RY,
];

/// Open game controller handle.
pub struct Gamepad {
    device: Device,
    device_path: String,
}

impl std::fmt::Debug for Gamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gamepad")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl Gamepad {
    /// Opens the configured device, or auto-detects one when `path` is `None`.
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: no gamepad on the system
    /// - `Controller`: the configured path cannot be opened or is not a gamepad
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rov_teleop::controller::gamepad::Gamepad;
    ///
    /// let pad = Gamepad::open(None)?;
    /// println!("Connected to {}", pad.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::open_path(Path::new(path)),
            None => Self::detect(),
        }
    }

    fn open_path(path: &Path) -> Result<Self> {
        let device = Device::open(path).map_err(|e| {
            TeleopError::Controller(format!("Failed to open {}: {}", path.display(), e))
        })?;

        if !is_gamepad(&device) {
            return Err(TeleopError::Controller(format!(
                "{} does not look like a game controller",
                path.display()
            )));
        }

        let device_path = path.to_string_lossy().to_string();
        info!("Opened controller at {}", device_path);
        Ok(Self {
            device,
            device_path,
        })
    }

    fn detect() -> Result<Self> {
        let input_dir = Path::new(INPUT_DIR);
        if !input_dir.exists() {
            return Err(TeleopError::Controller(format!(
                "{} directory not found",
                INPUT_DIR
            )));
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(input_dir)
            .map_err(|e| TeleopError::Controller(format!("Failed to read {}: {}", INPUT_DIR, e)))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy().starts_with("event"))
                    .unwrap_or(false)
            })
            .collect();

        // Deterministic pick when several pads are connected
        paths.sort();

        for path in paths {
            match Device::open(&path) {
                Ok(device) => {
                    let id = device.input_id();
                    debug!(
                        "Found input device: {} (vendor: 0x{:04x}, product: 0x{:04x})",
                        path.display(),
                        id.vendor(),
                        id.product()
                    );

                    if is_gamepad(&device) {
                        let device_path = path.to_string_lossy().to_string();
                        info!(
                            "Found controller \"{}\" at {}",
                            device.name().unwrap_or("unknown"),
                            device_path
                        );
                        return Ok(Self {
                            device,
                            device_path,
                        });
                    }
                }
                Err(e) => {
                    // Permission denied or other errors - skip device
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(TeleopError::ControllerNotFound)
    }

    /// Returns the `/dev/input/eventX` path of this controller.
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Returns the human-readable device name.
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Builds an event mapper seeded with this device's axis ranges.
    ///
    /// Axes whose absinfo cannot be read fall back to 0-255.
    pub fn event_mapper(&self) -> EventMapper {
        let mut ranges: AxisRanges = [AxisRange::default(); Axis::COUNT];

        match self.device.get_abs_state() {
            Ok(abs) => {
                for (idx, code) in AXIS_CODES.iter().enumerate() {
                    let info = abs[code.0 as usize];
                    ranges[idx] = AxisRange::new(info.minimum, info.maximum);
                }
            }
            Err(e) => debug!("absinfo unavailable on {}: {}", self.device_path, e),
        }

        let has_hat = self
            .device
            .supported_absolute_axes()
            .map(|axes| axes.contains(AbsoluteAxisType::ABS_HAT0Y))
            .unwrap_or(false);

        EventMapper::with_ranges(ranges, has_hat)
    }

    /// Converts the handle into an async event stream for the polling loop.
    ///
    /// # Errors
    ///
    /// Returns `Controller` if the device cannot be switched to non-blocking mode.
    pub fn into_event_stream(self) -> Result<EventStream> {
        let path = self.device_path;
        self.device
            .into_event_stream()
            .map_err(|e| TeleopError::Controller(format!("Failed to stream {}: {}", path, e)))
    }
}

/// A gamepad reports a south face button and a left stick.
fn is_gamepad(device: &Device) -> bool {
    let has_button = device
        .supported_keys()
        .map(|keys| keys.contains(Key::BTN_SOUTH))
        .unwrap_or(false);
    let has_stick = device
        .supported_absolute_axes()
        .map(|axes| axes.contains(AbsoluteAxisType::ABS_X) && axes.contains(AbsoluteAxisType::ABS_Y))
        .unwrap_or(false);
    has_button && has_stick
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_codes_match_snapshot_order() {
        assert_eq!(AXIS_CODES[Axis::LeftX as usize], AbsoluteAxisType::ABS_X);
        assert_eq!(AXIS_CODES[Axis::LeftY as usize], AbsoluteAxisType::ABS_Y);
        assert_eq!(AXIS_CODES[Axis::RightX as usize], AbsoluteAxisType::ABS_Z);
        assert_eq!(AXIS_CODES[Axis::RightY as usize], AbsoluteAxisType::ABS_RZ);
        assert_eq!(AXIS_CODES[Axis::LeftTrigger as usize], AbsoluteAxisType::ABS_RX);
        assert_eq!(AXIS_CODES[Axis::RightTrigger as usize], AbsoluteAxisType::ABS_RY);
    }

    #[test]
    fn test_open_missing_path_returns_controller_error() {
        let result = Gamepad::open(Some("/dev/input/nonexistent_event_12345"));
        match result {
            Err(TeleopError::Controller(msg)) => {
                assert!(msg.contains("nonexistent_event_12345"));
                assert!(msg.contains("Failed to open"));
            }
            other => panic!("Expected Controller error, got: {:?}", other),
        }
    }

    // Integration test - only runs with real hardware
    #[test]
    #[ignore] // Run with: cargo test -- --ignored
    fn test_detect_with_real_hardware() {
        let pad = Gamepad::open(None).expect("no controller connected");
        assert!(pad.device_path().starts_with("/dev/input/event"));
        assert!(pad.name().is_some());

        let snapshot = pad.event_mapper().snapshot();
        println!("Rest snapshot: {:?}", snapshot);
    }
}
