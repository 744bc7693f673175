//! # Teleoperation Session
//!
//! One run of the pipeline: the active profile's mapper feeding a gated
//! [`CommandLink`]. The session owns the neutral-command bookends: the
//! board receives neutral before the first mapped command and again when
//! the session ends, whatever the reason.

use std::time::Duration;
use tracing::{debug, info};

use crate::command::claw::ClawMapper;
use crate::command::mixer::ChannelMixer;
use crate::command::ActuatorCommand;
use crate::config::{Config, Profile};
use crate::controller::calibration::DeadZone;
use crate::controller::snapshot::ControllerSnapshot;
use crate::serial::link::{CommandLink, SendReport};
use crate::serial::port_trait::SerialPortIO;
use crate::serial::wire::WireFormat;

/// Snapshot-to-command mapping of the active profile.
#[derive(Debug, Clone)]
pub enum Mapping {
    /// Stateless nine-channel mixer, one CSV line per command.
    Thruster(ChannelMixer),
    /// Latched claw and roll accumulator, one tagged line per channel.
    Claw(ClawMapper),
}

impl Mapping {
    /// Builds the mapping selected by `config.session.profile`.
    pub fn from_config(config: &Config) -> Self {
        match config.session.profile {
            Profile::Thruster => {
                let dead_zone = DeadZone::new(config.controller.dead_zone);
                debug!("Thruster dead zone {}", dead_zone.threshold());
                Mapping::Thruster(config.thruster.mixer(dead_zone))
            }
            Profile::Claw => Mapping::Claw(ClawMapper::new(config.claw.settings())),
        }
    }

    pub fn profile(&self) -> Profile {
        match self {
            Mapping::Thruster(_) => Profile::Thruster,
            Mapping::Claw(_) => Profile::Claw,
        }
    }

    /// Line layout the profile's board expects.
    pub fn wire_format(&self) -> WireFormat {
        match self {
            Mapping::Thruster(_) => WireFormat::Csv,
            Mapping::Claw(_) => WireFormat::Tagged,
        }
    }

    pub fn map(&mut self, snapshot: &ControllerSnapshot) -> ActuatorCommand {
        match self {
            Mapping::Thruster(mixer) => mixer.map(snapshot),
            Mapping::Claw(claw) => claw.map(snapshot),
        }
    }

    pub fn neutral(&self) -> ActuatorCommand {
        match self {
            Mapping::Thruster(mixer) => mixer.neutral(),
            Mapping::Claw(claw) => claw.neutral(),
        }
    }

    /// Drops any latched state (claw grip, roll angle).
    pub fn reset(&mut self) {
        if let Mapping::Claw(claw) = self {
            claw.reset();
        }
    }
}

/// Mapper plus gated link for one run.
pub struct TeleopSession<P: SerialPortIO> {
    mapping: Mapping,
    link: CommandLink<P>,
    ticks: u64,
    finished: bool,
}

impl<P: SerialPortIO> std::fmt::Debug for TeleopSession<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeleopSession")
            .field("profile", &self.mapping.profile())
            .field("link", &self.link)
            .field("ticks", &self.ticks)
            .field("finished", &self.finished)
            .finish()
    }
}

impl<P: SerialPortIO> TeleopSession<P> {
    pub fn new(mapping: Mapping, port: P) -> Self {
        let link = CommandLink::new(port, mapping.wire_format());
        Self {
            mapping,
            link,
            ticks: 0,
            finished: false,
        }
    }

    /// Bounds every serial write by `write_timeout`.
    #[must_use]
    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.link = self.link.with_write_timeout(write_timeout);
        self
    }

    /// Forces the neutral command onto the wire.
    ///
    /// Call once the board has settled, before the first [`tick`](Self::tick).
    pub async fn start(&mut self) -> SendReport {
        info!("Sending neutral command ({:?} profile)", self.mapping.profile());
        self.send_neutral().await
    }

    /// Maps one snapshot and submits it through the gate.
    pub async fn tick(&mut self, snapshot: &ControllerSnapshot) -> SendReport {
        self.ticks += 1;
        let command = self.mapping.map(snapshot);
        let report = self.link.submit(&command).await;
        if report.attempted() {
            debug!("Tick {}: {:?}", self.ticks, command.values().collect::<Vec<_>>());
        }
        report
    }

    /// Writes the neutral command regardless of gate state.
    pub async fn send_neutral(&mut self) -> SendReport {
        let neutral = self.mapping.neutral();
        self.link.force(&neutral).await
    }

    /// Sends neutral, resets latched state and releases the port.
    ///
    /// Only the first call has an effect.
    pub async fn shutdown(&mut self) -> SendReport {
        if self.finished {
            return SendReport::default();
        }
        self.finished = true;

        let report = self.send_neutral().await;
        self.mapping.reset();
        self.link.close();

        info!(
            "Session ended after {} ticks ({} lines sent, {} write failures)",
            self.ticks,
            self.link.lines_sent(),
            self.link.write_failures()
        );
        report
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn link(&self) -> &CommandLink<P> {
        &self.link
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::claw::Grip;
    use crate::controller::snapshot::{Axis, Button};
    use crate::serial::port_trait::mocks::MockSerialPort;

    const NEUTRAL_CSV: &str = "1500,1500,1500,1500,1500,1500,1500,1500,1500\n";

    fn thruster_session() -> (TeleopSession<MockSerialPort>, MockSerialPort) {
        let port = MockSerialPort::new();
        let mapping = Mapping::from_config(&Config::default());
        (TeleopSession::new(mapping, port.clone()), port)
    }

    fn claw_session() -> (TeleopSession<MockSerialPort>, MockSerialPort) {
        let mut config = Config::default();
        config.session.profile = Profile::Claw;
        let port = MockSerialPort::new();
        (TeleopSession::new(Mapping::from_config(&config), port.clone()), port)
    }

    fn idle() -> ControllerSnapshot {
        ControllerSnapshot::builder().build()
    }

    #[test]
    fn test_mapping_follows_profile() {
        let mut config = Config::default();
        let thruster = Mapping::from_config(&config);
        assert_eq!(thruster.profile(), Profile::Thruster);
        assert_eq!(thruster.wire_format(), WireFormat::Csv);

        config.session.profile = Profile::Claw;
        let claw = Mapping::from_config(&config);
        assert_eq!(claw.profile(), Profile::Claw);
        assert_eq!(claw.wire_format(), WireFormat::Tagged);
    }

    #[test]
    fn test_start_writes_neutral_blocking() {
        let (mut session, port) = thruster_session();
        let report = tokio_test::block_on(session.start());
        assert_eq!(report.sent, 1);
        assert_eq!(port.get_written_lines(), vec![NEUTRAL_CSV]);
    }

    #[tokio::test]
    async fn test_idle_ticks_after_start_are_suppressed() {
        let (mut session, port) = thruster_session();
        session.start().await;

        for _ in 0..5 {
            let report = session.tick(&idle()).await;
            assert!(!report.attempted());
        }
        assert_eq!(session.ticks(), 5);
        assert_eq!(port.get_written_data().len(), 1);
    }

    #[tokio::test]
    async fn test_stick_forward_then_release() {
        let (mut session, port) = thruster_session();
        session.start().await;

        let forward = ControllerSnapshot::builder().axis(Axis::LeftY, -0.6).build();
        session.tick(&forward).await;
        session.tick(&forward).await;
        session.tick(&idle()).await;

        assert_eq!(
            port.get_written_lines(),
            vec![
                NEUTRAL_CSV,
                "1500,1260,1740,1260,1740,1500,1500,1500,1500\n",
                NEUTRAL_CSV,
            ]
        );
    }

    #[tokio::test]
    async fn test_claw_open_close_sequence() {
        let (mut session, port) = claw_session();
        session.start().await;
        assert_eq!(port.get_written_lines(), vec!["claw:90\n", "roll:90\n"]);

        let open = ControllerSnapshot::builder().axis(Axis::RightTrigger, 1.0).build();
        session.tick(&open).await;
        // Trigger released: the claw stays open, nothing new is written
        session.tick(&idle()).await;

        let close = ControllerSnapshot::builder().axis(Axis::LeftTrigger, 0.95).build();
        session.tick(&close).await;

        assert_eq!(
            port.get_written_lines(),
            vec!["claw:90\n", "roll:90\n", "claw:180\n", "claw:90\n"]
        );
    }

    #[tokio::test]
    async fn test_claw_roll_held_steps_each_tick() {
        let (mut session, port) = claw_session();
        session.start().await;

        let roll_right = ControllerSnapshot::builder().button(Button::R1, true).build();
        for _ in 0..3 {
            session.tick(&roll_right).await;
        }

        let lines = port.get_written_lines();
        assert_eq!(&lines[2..], ["roll:91\n", "roll:92\n", "roll:93\n"]);
    }

    #[tokio::test]
    async fn test_shutdown_forces_neutral_and_resets() {
        let (mut session, port) = claw_session();
        session.start().await;

        let open = ControllerSnapshot::builder()
            .axis(Axis::RightTrigger, 1.0)
            .button(Button::L1, true)
            .build();
        session.tick(&open).await;

        let report = session.shutdown().await;
        assert_eq!(report.sent, 2);
        assert!(session.is_finished());
        assert!(!session.link().port().is_open());

        let lines = port.get_written_lines();
        assert_eq!(&lines[lines.len() - 2..], ["claw:90\n", "roll:90\n"]);

        match session.mapping() {
            Mapping::Claw(claw) => {
                assert_eq!(claw.grip(), Grip::Closed);
                assert_eq!(claw.roll(), 90);
            }
            other => panic!("unexpected mapping {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_shutdown_sends_neutral_even_when_unchanged() {
        let (mut session, port) = thruster_session();
        session.start().await;
        session.shutdown().await;
        assert_eq!(port.get_written_lines(), vec![NEUTRAL_CSV, NEUTRAL_CSV]);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let (mut session, port) = thruster_session();
        session.start().await;
        session.shutdown().await;

        let second = session.shutdown().await;
        assert_eq!(second, SendReport::default());
        assert_eq!(port.get_written_data().len(), 2);
    }

    #[tokio::test]
    async fn test_write_failures_do_not_stop_ticks() {
        let (mut session, port) = thruster_session();
        port.set_write_error(std::io::ErrorKind::BrokenPipe);
        session.start().await;

        let forward = ControllerSnapshot::builder().axis(Axis::LeftY, -1.0).build();
        let report = session.tick(&forward).await;
        assert_eq!(report.failed, 1);

        port.clear_write_error();
        session.tick(&idle()).await;
        assert_eq!(port.get_written_lines(), vec![NEUTRAL_CSV]);
        assert_eq!(session.link().write_failures(), 2);
    }
}
