//! # Serial Communication Module
//!
//! Handles the text link to the actuator board.
//!
//! This module handles:
//! - Opening the board's USB serial port (8N1, no flow control)
//! - Encoding commands as text lines ([`wire`])
//! - Suppressing unchanged lines ([`gate`])
//! - Logging, not raising, write failures ([`link`])

pub mod gate;
pub mod link;
pub mod port_trait;
pub mod wire;

use std::time::Duration;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::error::{Result, TeleopError};
use port_trait::TokioSerialPort;

/// Baud rate of the original Arduino sketches
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Port value that requests auto-detection
pub const AUTO_PORT: &str = "auto";

/// Device paths tried when the port is `auto` (in order of preference)
pub const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyACM0", // Arduino Uno/Mega native USB
    "/dev/ttyUSB0", // FTDI / CH340 USB-to-serial adapters
];

/// Board serial port handle
pub struct BoardSerial {
    port: TokioSerialPort,
    device_path: String,
}

impl std::fmt::Debug for BoardSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl BoardSerial {
    /// Open the configured port, or probe the defaults when `port` is `auto`.
    ///
    /// # Errors
    ///
    /// Returns `Serial` if no candidate path can be opened.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rov_teleop::serial::BoardSerial;
    /// use std::time::Duration;
    ///
    /// let serial = BoardSerial::open("/dev/ttyUSB0", 9600, Duration::from_millis(100))?;
    /// println!("Connected to {}", serial.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(port: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        if port == AUTO_PORT {
            Self::open_with_paths(DEFAULT_DEVICE_PATHS, baud_rate, timeout)
        } else {
            Self::open_with_paths(&[port], baud_rate, timeout)
        }
    }

    /// Try each path in order and keep the first that opens.
    pub fn open_with_paths(paths: &[&str], baud_rate: u32, timeout: Duration) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate, timeout) {
                Ok(port) => {
                    info!("Connected to board on {} at {} baud", path, baud_rate);
                    return Ok(Self {
                        port: TokioSerialPort::new(port),
                        device_path: path.to_string(),
                    });
                }
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            }
        }

        Err(TeleopError::Serial(format!(
            "no board found (tried: {})",
            paths.join(", ")
        )))
    }

    fn open_port(path: &str, baud_rate: u32, timeout: Duration) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .timeout(timeout)
            .open_native_async()
            .map_err(|e| TeleopError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// Path of the opened device.
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Hands the port over to a [`link::CommandLink`].
    pub fn into_port(self) -> TokioSerialPort {
        self.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(100);

    #[test]
    fn test_device_path_order() {
        assert_eq!(DEFAULT_DEVICE_PATHS[0], "/dev/ttyACM0");
        assert_eq!(DEFAULT_DEVICE_PATHS[1], "/dev/ttyUSB0");
    }

    #[test]
    fn test_open_with_invalid_paths_returns_error() {
        let result = BoardSerial::open_with_paths(
            &["/dev/nonexistent0", "/dev/nonexistent1"],
            DEFAULT_BAUD_RATE,
            TIMEOUT,
        );

        match result {
            Err(TeleopError::Serial(msg)) => {
                assert!(msg.contains("/dev/nonexistent0"));
                assert!(msg.contains("/dev/nonexistent1"));
            }
            other => panic!("Expected Serial error, got: {:?}", other),
        }
    }

    #[test]
    fn test_open_with_empty_paths_returns_error() {
        let result = BoardSerial::open_with_paths(&[], DEFAULT_BAUD_RATE, TIMEOUT);
        assert!(matches!(result, Err(TeleopError::Serial(_))));
    }

    #[test]
    fn test_open_port_with_invalid_path_returns_error() {
        let result = BoardSerial::open_port("/dev/nonexistent_serial_device_12345", DEFAULT_BAUD_RATE, TIMEOUT);
        match result {
            Err(TeleopError::Serial(msg)) => {
                assert!(msg.contains("/dev/nonexistent_serial_device_12345"));
                assert!(msg.contains("Failed to open"));
            }
            Err(other) => panic!("Expected Serial error, got: {:?}", other),
            Ok(_) => panic!("Opening a missing device should fail"),
        }
    }

    // Integration test - only runs if a board is connected
    #[tokio::test]
    #[ignore] // Run with: cargo test -- --ignored
    async fn test_send_neutral_with_real_hardware() {
        use crate::serial::port_trait::SerialPortIO;

        let serial = BoardSerial::open(AUTO_PORT, DEFAULT_BAUD_RATE, TIMEOUT)
            .expect("no board connected");
        let mut port = serial.into_port();
        port.write_all(b"1500,1500,1500,1500,1500,1500,1500,1500,1500\n")
            .await
            .expect("write failed");
        port.flush().await.expect("flush failed");
    }
}
