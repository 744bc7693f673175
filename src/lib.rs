//! # ROV Teleop Library
//!
//! Turns game controller input into serial commands for an actuator board.
//!
//! The pipeline runs once per tick:
//!
//! 1. [`controller`] folds evdev events into a [`ControllerSnapshot`](controller::snapshot::ControllerSnapshot)
//! 2. [`command`] maps the snapshot to an [`ActuatorCommand`](command::ActuatorCommand)
//!    (thruster mixer or claw mapper)
//! 3. [`serial`] encodes the command and writes only lines that changed
//!
//! [`session`] ties the stages together and owns the neutral command sent
//! at startup and shutdown.

pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod serial;
pub mod session;
pub mod shutdown;
