//! # Error Types
//!
//! Custom error types for ROV Teleop using `thiserror`.

use thiserror::Error;

/// Main error type for ROV Teleop
#[derive(Debug, Error)]
pub enum TeleopError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Controller access errors (open, read, disconnect)
    #[error("Controller error: {0}")]
    Controller(String),

    /// No usable game controller was found
    #[error("No game controller found")]
    ControllerNotFound,

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),
}

/// Result type alias for ROV Teleop
pub type Result<T> = std::result::Result<T, TeleopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(TeleopError::ControllerNotFound.to_string(), "No game controller found");
        assert_eq!(
            TeleopError::Serial("port busy".to_string()).to_string(),
            "Serial error: port busy"
        );
        assert_eq!(
            TeleopError::Controller("unplugged".to_string()).to_string(),
            "Controller error: unplugged"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: TeleopError = io.into();
        assert!(matches!(err, TeleopError::Io(_)));
    }
}
