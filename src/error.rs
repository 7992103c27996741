//! Error handling for the installer
//!
//! Every variant of `InstallerError` is fatal: the sequencer stops, prints the
//! message in red and the process exits with status 1. Recoverable problems
//! (bad free-text input, a failed `loadkeys`) never become errors; they are
//! reported as warnings at the point where they happen.

use std::path::PathBuf;
use thiserror::Error;

/// Exit status for every fatal installer error.
pub const FATAL_EXIT_CODE: i32 = 1;

/// Main error type for the installer
#[derive(Error, Debug)]
pub enum InstallerError {
    /// Not running with EUID 0
    #[error("Root privileges required: run the installer as root")]
    NotRoot,

    /// Required system tools are not on PATH
    #[error("Missing required tools: {}", .0.join(", "))]
    MissingTools(Vec<String>),

    /// `lsblk` reported no installable disk
    #[error("No installable disks found")]
    NoDisks,

    /// The disk answer matched none of the listed disks
    #[error("Invalid disk selection: '{0}'")]
    InvalidDisk(String),

    /// The destructive-action confirmation was anything but `yes`
    #[error("Installation aborted: erasing {disk} was not confirmed")]
    NotConfirmed { disk: String },

    /// Still offline after the reconnection pass
    #[error("No network connection (reconnection attempt failed)")]
    NoNetwork,

    /// `pacstrap` returned nonzero
    #[error("Package installation failed: {0}")]
    PackageInstall(String),

    /// A configuration file that should have been written is absent
    #[error("Generated file missing: {}", .0.display())]
    MissingArtifact(PathBuf),

    /// `passwd` kept failing for one account
    #[error("Could not set the password for {user} after {attempts} attempts")]
    CredentialsFailed { user: String, attempts: u32 },

    /// An external tool exited with a nonzero status
    #[error("Command failed: {0}")]
    Command(String),

    /// Install state machine transition errors
    #[error("Install transition error: {0}")]
    InstallTransition(String),

    /// IO errors (file writes, terminal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// System errors carried up from `anyhow` contexts
    #[error("System error: {0}")]
    System(String),
}

/// Result type alias for installer operations
pub type Result<T> = std::result::Result<T, InstallerError>;

impl InstallerError {
    /// Create a command error
    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }

    /// Create a system error
    pub fn system(msg: impl Into<String>) -> Self {
        Self::System(msg.into())
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        FATAL_EXIT_CODE
    }
}

impl From<anyhow::Error> for InstallerError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the whole context chain on one line
        Self::System(format!("{:#}", err))
    }
}
