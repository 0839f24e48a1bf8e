//! Termination signal handling.
//!
//! SIGINT and SIGTERM are installed before capture starts. The first signal
//! cancels the shared token; the capture loop observes it between frames and
//! performs the terminal flush itself. A second signal before the loop has
//! finished exits the process immediately, so a capture blocked inside the
//! capture library can still be killed from the terminal.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

use crate::error::CliError;

/// Exit code used when a second signal forces the process down.
pub const FORCED_EXIT_CODE: i32 = 1;

/// Installed termination signal listeners.
pub struct ShutdownSignals {
    #[cfg(unix)]
    interrupt: Signal,
    #[cfg(unix)]
    terminate: Signal,
}

impl ShutdownSignals {
    /// Install SIGINT and SIGTERM listeners.
    ///
    /// Must be called from within a tokio runtime.
    #[cfg(unix)]
    pub fn install() -> Result<Self, CliError> {
        let interrupt = signal(SignalKind::interrupt()).map_err(|e| {
            CliError::Setup(format!("couldn't set up SIGINT signal handler: {e}"))
        })?;
        let terminate = signal(SignalKind::terminate()).map_err(|e| {
            CliError::Setup(format!("couldn't set up SIGTERM signal handler: {e}"))
        })?;
        Ok(Self {
            interrupt,
            terminate,
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> Result<Self, CliError> {
        Ok(Self {})
    }

    /// Wait for the first termination signal and return its name.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> &'static str {
        let _ = tokio::signal::ctrl_c().await;
        "ctrl-c"
    }

    /// Spawn a task cancelling `token` on the first termination signal and
    /// exiting the process on the second.
    ///
    /// The task ends once `done` is cancelled.
    pub fn spawn(self, token: CancellationToken, done: CancellationToken) -> JoinHandle<()> {
        self.spawn_with(token, done, || {
            eprintln!("\nForced exit");
            std::process::exit(FORCED_EXIT_CODE)
        })
    }

    /// Like [`spawn`](Self::spawn), running `on_second` instead of exiting.
    pub fn spawn_with<F>(
        mut self,
        token: CancellationToken,
        done: CancellationToken,
        on_second: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce() + Send + 'static,
    {
        tokio::spawn(async move {
            tokio::select! {
                name = self.recv() => {
                    info!(signal = name, "termination requested");
                    token.cancel();
                }
                _ = done.cancelled() => return,
            }

            tokio::select! {
                name = self.recv() => {
                    warn!(signal = name, "second termination signal, exiting without flush");
                    on_second();
                }
                _ = done.cancelled() => {}
            }
        })
    }
}
