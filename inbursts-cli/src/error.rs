//! CLI-specific error types and exit code mapping

use inbursts_core::error::InburstsError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to the process exit status.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Invalid command-line usage.
    #[error("{0}")]
    Usage(String),

    /// Setup failed before capture started (logging, signal handlers).
    #[error("setup failed: {0}")]
    Setup(String),

    /// The capture task could not be joined.
    #[error("capture task failed: {0}")]
    Runtime(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from inbursts-core.
    #[error("{0}")]
    Core(#[from] InburstsError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                                   |
    /// |------|-----------------------------------------------------------|
    /// | 0    | Success                                                   |
    /// | 1    | Runtime failure after capture started (read/write)        |
    /// | 2    | Usage, configuration, setup or unreadable report input    |
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) | Self::Setup(_) => 2,
            Self::Core(e) if e.is_setup_failure() => 2,
            Self::Core(InburstsError::Report(_)) => 2,
            Self::Core(_) | Self::Runtime(_) | Self::JsonSerialize(_) | Self::Io(_) => 1,
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(e: anyhow::Error) -> Self {
        Self::Setup(format!("{e:#}"))
    }
}
