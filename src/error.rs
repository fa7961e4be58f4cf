//! Error types and Result aliases for gaiactl

use std::fmt;
use std::path::PathBuf;

/// Result type alias for gaiactl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for gaiactl
#[derive(Debug)]
pub enum Error {
    // === Connection errors ===
    /// A password prompt appeared but no password was supplied
    AuthRequired,

    /// The remote side closed the stream unexpectedly
    ConnectionClosed,

    /// Login did not reach an operational prompt in time
    LoginTimeout,

    /// Failed to spawn the transport process
    SpawnFailed {
        command: String,
        reason: String,
    },

    // === Execution errors ===
    /// A clish command failed or timed out and was not tolerated
    CommandTimeout {
        command: String,
    },

    /// An expert-mode command failed (never tolerated)
    CommandFatal {
        command: String,
    },

    /// Could not enter expert mode
    ExpertEntryFailed {
        reason: String,
    },

    /// Did not reach the clish prompt after leaving expert mode
    ExpertExitFailed,

    // === Template errors ===
    /// Failed to read a template from disk
    TemplateRead {
        path: PathBuf,
        reason: String,
    },

    // === I/O and serialization errors ===
    /// I/O errors
    Io(std::io::Error),

    /// Serialization errors
    Serde(serde_json::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors (for cases not yet categorized)
    Other(String),
}

impl Error {
    /// Whether this error may be downgraded by the tolerated-substring
    /// policy. Only clish command failures qualify; everything else is
    /// immediately fatal.
    pub fn is_tolerable(&self) -> bool {
        matches!(self, Error::CommandTimeout { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::AuthRequired => {
                write!(f, "Password required but not provided")
            }
            Error::ConnectionClosed => {
                write!(f, "Connection closed unexpectedly")
            }
            Error::LoginTimeout => {
                write!(f, "Login timed out before reaching an operational prompt")
            }
            Error::SpawnFailed { command, reason } => {
                write!(f, "Failed to spawn '{}': {}", command, reason)
            }
            Error::CommandTimeout { command } => {
                write!(f, "clish command failed or timed out: {}", command)
            }
            Error::CommandFatal { command } => {
                write!(f, "Expert command timed out or failed: {}", command)
            }
            Error::ExpertEntryFailed { reason } => {
                write!(f, "Failed entering expert mode: {}", reason)
            }
            Error::ExpertExitFailed => {
                write!(f, "Did not reach clish prompt after expert exit")
            }
            Error::TemplateRead { path, reason } => {
                write!(f, "Failed to read template '{}': {}", path.display(), reason)
            }
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Serde(err) => write!(f, "Serialization error: {}", err),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}
