//! # ROV Teleop
//!
//! Drive a serial actuator board (thruster ROV or claw) from a game
//! controller.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Set up logging with tracing subscriber
//!    - Load configuration, apply command line overrides
//!    - Open the controller and the serial port (both fatal on failure)
//!    - Wait for the board to settle, then force the neutral command
//!
//! 2. **Main Loop**
//!    - Fold controller events into the current snapshot as they arrive
//!    - On every tick, map the snapshot and send it if it changed
//!    - Log status every `status_interval_s`
//!
//! 3. **Shutdown** (Ctrl+C, SIGTERM or controller lost)
//!    - Force the neutral command
//!    - Close the port
//!    - Exit non-zero if the controller was lost
//!
//! ```bash
//! rov-teleop --config rov.toml --profile claw --port /dev/ttyACM0
//! RUST_LOG=debug rov-teleop --dry-run
//! ```

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use evdev::EventStream;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rov_teleop::config::{Config, Profile};
use rov_teleop::controller::gamepad::Gamepad;
use rov_teleop::controller::mapper::EventMapper;
use rov_teleop::error::TeleopError;
use rov_teleop::serial::port_trait::{DryRunPort, SerialPortIO};
use rov_teleop::serial::BoardSerial;
use rov_teleop::session::{Mapping, TeleopSession};
use rov_teleop::shutdown::{shutdown_signal, ShutdownSignalError, StopSignal};

/// Drive an ROV thruster board or claw from a game controller over serial.
#[derive(Parser, Debug)]
#[command(name = "rov-teleop", version, about)]
struct Cli {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long, env = "ROV_TELEOP_CONFIG")]
    config: Option<PathBuf>,

    /// Actuator profile, overrides `[session] profile`.
    #[arg(long, value_enum, env = "ROV_TELEOP_PROFILE")]
    profile: Option<Profile>,

    /// Serial device path or `auto`, overrides `[serial] port`.
    #[arg(long, env = "ROV_TELEOP_PORT")]
    port: Option<String>,

    /// Log command lines instead of writing them to the board.
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(profile) = self.profile {
            config.session.profile = profile;
        }
        if let Some(port) = &self.port {
            config.serial.port = port.clone();
        }
        if self.dry_run {
            config.serial.enabled = false;
        }

        // Overrides can change the effective tick rate
        config.validate()?;
        Ok(config)
    }
}

/// Ticks between status lines.
fn status_every(tick_rate_hz: u32, status_interval_s: u64) -> u64 {
    (tick_rate_hz as u64).saturating_mul(status_interval_s).max(1)
}

fn tick_period(tick_rate_hz: u32) -> Duration {
    Duration::from_nanos(1_000_000_000 / tick_rate_hz.max(1) as u64)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!("ROV Teleop v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = cli.load_config()?;
    info!(
        "Profile {:?} at {} Hz",
        config.session.profile,
        config.session.tick_rate_hz()
    );

    let gamepad = Gamepad::open(config.controller.device_path())?;
    info!(
        "Controller: {} ({})",
        gamepad.name().unwrap_or("unnamed"),
        gamepad.device_path()
    );
    let mapper = gamepad.event_mapper();
    let events = gamepad.into_event_stream()?;

    let mapping = Mapping::from_config(&config);
    let write_timeout = Duration::from_millis(config.serial.timeout_ms);

    if config.serial.enabled {
        let serial = BoardSerial::open(&config.serial.port, config.serial.baud_rate, write_timeout)?;
        info!("Board serial port opened at: {}", serial.device_path());
        let session =
            TeleopSession::new(mapping, serial.into_port()).with_write_timeout(write_timeout);
        run(session, mapper, events, &config).await
    } else {
        warn!("Serial output disabled, logging command lines only");
        let session = TeleopSession::new(mapping, DryRunPort::new());
        run(session, mapper, events, &config).await
    }
}

/// Waits for the board to settle. Returns the stop signal if one arrived first.
async fn settle<F>(
    delay: Duration,
    shutdown: &mut Pin<&mut F>,
) -> Result<Option<StopSignal>, ShutdownSignalError>
where
    F: Future<Output = Result<StopSignal, ShutdownSignalError>>,
{
    tokio::select! {
        _ = sleep(delay) => Ok(None),
        signal = shutdown.as_mut() => signal.map(Some),
    }
}

async fn run<P: SerialPortIO>(
    mut session: TeleopSession<P>,
    mut mapper: EventMapper,
    mut events: EventStream,
    config: &Config,
) -> Result<()> {
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    if config.serial.settle_ms > 0 {
        info!("Waiting {} ms for the board to settle", config.serial.settle_ms);
        let settled = settle(Duration::from_millis(config.serial.settle_ms), &mut shutdown).await;
        match settled {
            Ok(None) => {}
            Ok(Some(signal)) => {
                info!("Received {} during startup", signal);
                session.shutdown().await;
                return Ok(());
            }
            Err(e) => {
                session.shutdown().await;
                return Err(e.into());
            }
        }
    }

    session.start().await;

    let tick_rate_hz = config.session.tick_rate_hz();
    let mut ticker = interval(tick_period(tick_rate_hz));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let log_every = status_every(tick_rate_hz, config.session.status_interval_s);

    info!("Teleop running at {} Hz, press Ctrl+C to exit", tick_rate_hz);

    let outcome = loop {
        tokio::select! {
            _ = ticker.tick() => {
                session.tick(&mapper.snapshot()).await;

                if session.ticks() % log_every == 0 {
                    info!(
                        "{} ticks, {} lines sent, {} write failures",
                        session.ticks(),
                        session.link().lines_sent(),
                        session.link().write_failures()
                    );
                }
            }

            event = events.next_event() => match event {
                Ok(event) => mapper.process_event(&event),
                Err(e) => {
                    error!("Controller lost: {}", e);
                    break Err(anyhow!(TeleopError::Controller(format!("controller lost: {}", e))));
                }
            },

            signal = &mut shutdown => match signal {
                Ok(signal) => {
                    info!("Received {}, shutting down...", signal);
                    break Ok(());
                }
                Err(e) => break Err(e.into()),
            },
        }
    };

    session.shutdown().await;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_interval_in_ticks() {
        assert_eq!(status_every(30, 10), 300);
        assert_eq!(status_every(60, 10), 600);
        assert_eq!(status_every(1, 0), 1);
        assert_eq!(status_every(250, u64::MAX), u64::MAX);
    }

    #[tokio::test]
    async fn test_settle_elapses_without_signal() {
        let shutdown = std::future::pending::<Result<StopSignal, ShutdownSignalError>>();
        tokio::pin!(shutdown);
        let settled = settle(Duration::from_millis(5), &mut shutdown).await;
        assert!(matches!(settled, Ok(None)));
    }

    #[tokio::test]
    async fn test_settle_reports_signal() {
        let shutdown = std::future::ready(Ok(StopSignal::Terminate));
        tokio::pin!(shutdown);
        let settled = settle(Duration::from_secs(60), &mut shutdown).await;
        assert!(matches!(settled, Ok(Some(StopSignal::Terminate))));
    }

    #[tokio::test]
    async fn test_settle_propagates_handler_failure() {
        let failure = std::io::Error::new(std::io::ErrorKind::Other, "no signal support");
        let shutdown = std::future::ready(Err(ShutdownSignalError::CtrlC(failure)));
        tokio::pin!(shutdown);
        let settled = settle(Duration::from_secs(60), &mut shutdown).await;
        assert!(matches!(settled, Err(ShutdownSignalError::CtrlC(_))));
    }

    #[test]
    fn test_tick_period() {
        assert_eq!(tick_period(250), Duration::from_millis(4));
        assert_eq!(tick_period(1), Duration::from_secs(1));
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "rov-teleop",
            "--profile",
            "claw",
            "--port",
            "/dev/ttyUSB1",
            "--dry-run",
        ]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.session.profile, Profile::Claw);
        assert_eq!(config.serial.port, "/dev/ttyUSB1");
        assert!(!config.serial.enabled);
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["rov-teleop"]);
        assert!(cli.config.is_none());
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_rejects_unknown_profile() {
        assert!(Cli::try_parse_from(["rov-teleop", "--profile", "drone"]).is_err());
    }
}
