//! Operator stop signals (Ctrl+C, SIGTERM).

use tokio::signal;

#[derive(Debug, thiserror::Error)]
pub enum ShutdownSignalError {
    #[error("failed to install Ctrl+C handler: {0}")]
    CtrlC(std::io::Error),
    #[cfg(unix)]
    #[error("failed to install SIGTERM handler: {0}")]
    Sigterm(std::io::Error),
}

/// Which signal ended the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    Interrupt,
    Terminate,
}

impl std::fmt::Display for StopSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopSignal::Interrupt => write!(f, "Ctrl+C"),
            StopSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Resolves when the operator asks the process to stop.
pub async fn shutdown_signal() -> Result<StopSignal, ShutdownSignalError> {
    let ctrl_c = async {
        signal::ctrl_c().await.map_err(ShutdownSignalError::CtrlC)?;
        Ok(StopSignal::Interrupt)
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .map_err(ShutdownSignalError::Sigterm)?;
        let _ = sigterm.recv().await;
        Ok(StopSignal::Terminate)
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<StopSignal, ShutdownSignalError>>();

    tokio::select! {
        result = ctrl_c => result,
        result = terminate => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_signal_display() {
        assert_eq!(StopSignal::Interrupt.to_string(), "Ctrl+C");
        assert_eq!(StopSignal::Terminate.to_string(), "SIGTERM");
    }

    #[tokio::test]
    async fn test_pending_without_signal() {
        let result =
            tokio::time::timeout(std::time::Duration::from_millis(20), shutdown_signal()).await;
        assert!(result.is_err(), "no signal was sent");
    }
}
