//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and every field is optional; an empty file yields the
//! thruster profile on an auto-detected board at 9600 baud.

use serde::de::Error;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::command::claw::{self, ClawSettings};
use crate::command::mixer::{rov_layout, ChannelMixer, ChannelSource, ChannelSpec};
use crate::command::ChannelRange;
use crate::controller::calibration::{DeadZone, MAX_DEAD_ZONE};
use crate::error::{Result, TeleopError};
use crate::serial::{AUTO_PORT, DEFAULT_BAUD_RATE};

/// Which actuator board is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Nine-channel ROV: six thrusters, turn, grip, camera.
    #[default]
    Thruster,
    /// Single claw with roll.
    Claw,
}

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub thruster: ThrusterConfig,
    #[serde(default)]
    pub claw: ClawConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    /// Device path, or `auto` to probe the usual USB serial paths.
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Wait after opening the port; Arduino boards reset on connect.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// When false, lines are logged instead of written.
    #[serde(default = "default_serial_enabled")]
    pub enabled: bool,
}

/// Controller configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControllerConfig {
    /// Empty for auto-detection.
    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_dead_zone")]
    pub dead_zone: f32,
}

/// Polling loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default)]
    pub profile: Profile,

    /// Overrides the profile's default tick rate.
    #[serde(default)]
    pub tick_rate_hz: Option<u32>,

    #[serde(default = "default_status_interval_s")]
    pub status_interval_s: u64,
}

/// Thruster profile configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ThrusterConfig {
    #[serde(default = "default_pulse_min")]
    pub pulse_min: i32,

    #[serde(default = "default_pulse_max")]
    pub pulse_max: i32,

    #[serde(default = "default_pulse_neutral")]
    pub neutral: i32,

    #[serde(default = "rov_layout")]
    pub channels: Vec<ChannelSpec>,
}

/// Claw profile configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ClawConfig {
    #[serde(default = "default_claw_closed")]
    pub closed: i32,

    #[serde(default = "default_claw_open")]
    pub open: i32,

    #[serde(default = "default_roll_min")]
    pub roll_min: i32,

    #[serde(default = "default_roll_max")]
    pub roll_max: i32,

    #[serde(default = "default_roll_start")]
    pub roll_start: i32,

    #[serde(default = "default_roll_step")]
    pub roll_step: i32,

    #[serde(default = "default_trigger_threshold")]
    pub trigger_threshold: f32,
}

// Default value functions
fn default_serial_port() -> String { AUTO_PORT.to_string() }
fn default_baud_rate() -> u32 { DEFAULT_BAUD_RATE }
fn default_timeout_ms() -> u64 { 100 }
fn default_settle_ms() -> u64 { 2000 }
fn default_serial_enabled() -> bool { true }

fn default_dead_zone() -> f32 { 0.05 }

fn default_status_interval_s() -> u64 { 10 }

fn default_pulse_min() -> i32 { 1100 }
fn default_pulse_max() -> i32 { 1900 }
fn default_pulse_neutral() -> i32 { 1500 }

fn default_claw_closed() -> i32 { claw::CLAW_CLOSED }
fn default_claw_open() -> i32 { claw::CLAW_OPEN }
fn default_roll_min() -> i32 { claw::ROLL_MIN }
fn default_roll_max() -> i32 { claw::ROLL_MAX }
fn default_roll_start() -> i32 { claw::ROLL_START }
fn default_roll_step() -> i32 { 1 }
fn default_trigger_threshold() -> f32 { claw::TRIGGER_THRESHOLD }

/// Default loop rate of the thruster profile
pub const THRUSTER_TICK_RATE_HZ: u32 = 30;
/// Default loop rate of the claw profile
pub const CLAW_TICK_RATE_HZ: u32 = 60;

const VALID_BAUD_RATES: [u32; 10] = [
    1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200, 230400, 250000,
];

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
            settle_ms: default_settle_ms(),
            enabled: default_serial_enabled(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            device_path: String::new(),
            dead_zone: default_dead_zone(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            tick_rate_hz: None,
            status_interval_s: default_status_interval_s(),
        }
    }
}

impl Default for ThrusterConfig {
    fn default() -> Self {
        Self {
            pulse_min: default_pulse_min(),
            pulse_max: default_pulse_max(),
            neutral: default_pulse_neutral(),
            channels: rov_layout(),
        }
    }
}

impl Default for ClawConfig {
    fn default() -> Self {
        Self {
            closed: default_claw_closed(),
            open: default_claw_open(),
            roll_min: default_roll_min(),
            roll_max: default_roll_max(),
            roll_start: default_roll_start(),
            roll_step: default_roll_step(),
            trigger_threshold: default_trigger_threshold(),
        }
    }
}

impl ControllerConfig {
    /// Configured device path, `None` for auto-detection.
    pub fn device_path(&self) -> Option<&str> {
        if self.device_path.is_empty() {
            None
        } else {
            Some(&self.device_path)
        }
    }
}

impl SessionConfig {
    /// Loop rate for the active profile.
    pub fn tick_rate_hz(&self) -> u32 {
        self.tick_rate_hz.unwrap_or(match self.profile {
            Profile::Thruster => THRUSTER_TICK_RATE_HZ,
            Profile::Claw => CLAW_TICK_RATE_HZ,
        })
    }
}

impl ThrusterConfig {
    /// Builds the mixer for this layout.
    pub fn mixer(&self, dead_zone: DeadZone) -> ChannelMixer {
        let pulse = ChannelRange::new(self.pulse_min, self.pulse_max, self.neutral);
        ChannelMixer::new(dead_zone, pulse, &self.channels)
    }
}

impl ClawConfig {
    /// Claw settings with the default trigger and bumper assignment.
    pub fn settings(&self) -> ClawSettings {
        ClawSettings {
            closed: self.closed,
            open: self.open,
            roll_min: self.roll_min,
            roll_max: self.roll_max,
            roll_start: self.roll_start,
            roll_step: self.roll_step,
            trigger_threshold: self.trigger_threshold,
            ..ClawSettings::default()
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> TeleopError {
    TeleopError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rov_teleop::config::Config;
    ///
    /// let config = Config::load("config/rov.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Serial
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if !VALID_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(format!(
                "baud_rate must be one of: {:?}",
                VALID_BAUD_RATES
            )));
        }

        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 10000 {
            return Err(invalid("timeout_ms must be between 1 and 10000"));
        }

        if self.serial.settle_ms > 10000 {
            return Err(invalid("settle_ms must be at most 10000"));
        }

        // Controller
        let dead_zone = self.controller.dead_zone;
        if !(0.0..=MAX_DEAD_ZONE).contains(&dead_zone) {
            return Err(invalid(format!(
                "dead_zone must be between 0.0 and {}",
                MAX_DEAD_ZONE
            )));
        }

        // Session
        let rate = self.session.tick_rate_hz();
        if rate == 0 || rate > 250 {
            return Err(invalid("tick_rate_hz must be between 1 and 250"));
        }

        if self.session.status_interval_s == 0 || self.session.status_interval_s > 3600 {
            return Err(invalid("status_interval_s must be between 1 and 3600"));
        }

        self.validate_thruster()?;
        self.validate_claw()?;

        Ok(())
    }

    fn validate_thruster(&self) -> Result<()> {
        let thruster = &self.thruster;

        if thruster.pulse_min >= thruster.pulse_max {
            return Err(invalid("pulse_min must be less than pulse_max"));
        }

        if thruster.neutral < thruster.pulse_min || thruster.neutral > thruster.pulse_max {
            return Err(invalid("neutral must be within pulse range (pulse_min to pulse_max)"));
        }

        if thruster.channels.is_empty() {
            return Err(invalid("thruster layout needs at least one channel"));
        }

        let mut names = HashSet::new();
        for spec in &thruster.channels {
            if spec.name.is_empty() || spec.name.contains([',', ':', '\n']) {
                return Err(invalid(format!(
                    "channel name {:?} must be non-empty without ',' ':' or newlines",
                    spec.name
                )));
            }

            if !names.insert(spec.name.as_str()) {
                return Err(invalid(format!("duplicate channel name {:?}", spec.name)));
            }

            let min = spec.min.unwrap_or(thruster.pulse_min);
            let max = spec.max.unwrap_or(thruster.pulse_max);
            if min > max {
                return Err(invalid(format!("channel {}: min must not exceed max", spec.name)));
            }

            if let ChannelSource::Mix { terms } = &spec.source {
                if terms.is_empty() {
                    return Err(invalid(format!("channel {}: mix needs at least one term", spec.name)));
                }
                if terms.iter().any(|term| !term.gain.is_finite()) {
                    return Err(invalid(format!("channel {}: gains must be finite", spec.name)));
                }
            }
        }

        Ok(())
    }

    fn validate_claw(&self) -> Result<()> {
        let claw = &self.claw;

        if claw.closed == claw.open {
            return Err(invalid("claw closed and open positions must differ"));
        }

        if claw.roll_min >= claw.roll_max {
            return Err(invalid("roll_min must be less than roll_max"));
        }

        if claw.roll_start < claw.roll_min || claw.roll_start > claw.roll_max {
            return Err(invalid("roll_start must be within roll range (roll_min to roll_max)"));
        }

        if claw.roll_step < 1 {
            return Err(invalid("roll_step must be at least 1"));
        }

        if claw.roll_step as i64 > claw.roll_max as i64 - claw.roll_min as i64 {
            return Err(invalid("roll_step must not exceed the roll range (roll_max - roll_min)"));
        }

        if !(0.0..=1.0).contains(&claw.trigger_threshold) {
            return Err(invalid("trigger_threshold must be between 0.0 and 1.0"));
        }

        Ok(())
    }
}
