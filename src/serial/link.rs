//! # Command Link
//!
//! Ties a serial port, a wire format and one [`TransmissionGate`] per wire
//! slot together. Write failures are logged and counted, never returned:
//! a dropped line must not stop a live teleoperation session. Every write
//! and flush is bounded by the write timeout, so a board that stops
//! draining its buffer costs one failed line per tick instead of a stall.

use std::io;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::gate::TransmissionGate;
use super::port_trait::SerialPortIO;
use super::wire::WireFormat;
use crate::command::ActuatorCommand;

/// Outcome counts of one submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendReport {
    /// Lines written and flushed.
    pub sent: usize,
    /// Lines skipped because they matched the last line of their slot.
    pub suppressed: usize,
    /// Lines whose write failed or found the port closed.
    pub failed: usize,
}

impl SendReport {
    /// Returns whether anything was attempted on the wire.
    pub fn attempted(&self) -> bool {
        self.sent + self.failed > 0
    }
}

/// Write timeout used until [`CommandLink::with_write_timeout`] overrides it.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(100);

/// Gated writer for actuator commands.
pub struct CommandLink<P: SerialPortIO> {
    port: P,
    format: WireFormat,
    write_timeout: Duration,
    gates: Vec<TransmissionGate>,
    lines_sent: u64,
    write_failures: u64,
}

impl<P: SerialPortIO> std::fmt::Debug for CommandLink<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandLink")
            .field("format", &self.format)
            .field("write_timeout", &self.write_timeout)
            .field("gates", &self.gates)
            .field("lines_sent", &self.lines_sent)
            .field("write_failures", &self.write_failures)
            .finish_non_exhaustive()
    }
}

impl<P: SerialPortIO> CommandLink<P> {
    /// Wraps an open port.
    pub fn new(port: P, format: WireFormat) -> Self {
        Self {
            port,
            format,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            gates: Vec::new(),
            lines_sent: 0,
            write_failures: 0,
        }
    }

    /// Bounds each write and flush by `write_timeout`.
    #[must_use]
    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    /// Sends every line of `command` that differs from its slot's last line.
    pub async fn submit(&mut self, command: &ActuatorCommand) -> SendReport {
        self.transmit(command, false).await
    }

    /// Sends every line of `command` unconditionally and records it.
    ///
    /// Used for the neutral command at startup and shutdown.
    pub async fn force(&mut self, command: &ActuatorCommand) -> SendReport {
        self.transmit(command, true).await
    }

    /// Last recorded line per slot.
    pub fn last_lines(&self) -> Vec<Option<&str>> {
        self.gates.iter().map(TransmissionGate::last_line).collect()
    }

    /// Total lines written since creation.
    pub fn lines_sent(&self) -> u64 {
        self.lines_sent
    }

    /// Total failed writes since creation.
    pub fn write_failures(&self) -> u64 {
        self.write_failures
    }

    /// Borrow the underlying port.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Releases the port. Later submissions count as failures.
    pub fn close(&mut self) {
        self.port.close();
    }

    async fn transmit(&mut self, command: &ActuatorCommand, forced: bool) -> SendReport {
        let lines = self.format.encode(command);
        if self.gates.len() < lines.len() {
            self.gates.resize_with(lines.len(), TransmissionGate::new);
        }

        let mut report = SendReport::default();
        for (slot, line) in lines.iter().enumerate() {
            let gate = &mut self.gates[slot];
            if !forced && !gate.admit(line) {
                report.suppressed += 1;
                continue;
            }

            // Recorded before the write: a failed line is not retried
            gate.record(line);

            match write_line(&mut self.port, line, self.write_timeout).await {
                Ok(()) => {
                    report.sent += 1;
                    self.lines_sent += 1;
                    debug!("Sent {:?}", line);
                }
                Err(e) => {
                    report.failed += 1;
                    self.write_failures += 1;
                    warn!("Serial write error: {} (line {:?})", e, line.trim_end());
                }
            }
        }
        report
    }
}

async fn write_line<P: SerialPortIO>(
    port: &mut P,
    line: &str,
    write_timeout: Duration,
) -> io::Result<()> {
    if !port.is_open() {
        return Err(io::Error::new(
            io::ErrorKind::NotConnected,
            "serial port is not open",
        ));
    }

    let write = async {
        port.write_all(line.as_bytes()).await?;
        port.flush().await
    };
    match timeout(write_timeout, write).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("write not drained within {:?}", write_timeout),
        )),
    }
}
