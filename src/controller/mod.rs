//! # Controller Module
//!
//! Game controller input handling.
//!
//! This module handles:
//! - Controller detection and connection via evdev
//! - Draining input events into a running state
//! - Normalizing axes into a per-tick [`snapshot::ControllerSnapshot`]
//! - Dead-zone filtering of analog inputs

pub mod calibration;
pub mod gamepad;
pub mod mapper;
pub mod snapshot;
