//! Errors shared by the auxiliary tools.

use std::path::PathBuf;
use thiserror::Error;

/// Process exit code for success.
pub const EXIT_SUCCESS: u8 = 0;
/// Process exit code for I/O and transport failures.
pub const EXIT_FAILURE: u8 = 1;
/// Process exit code when `textpatch` finds nothing to replace.
pub const EXIT_NOT_FOUND: u8 = 2;
/// Process exit code for invalid arguments.
pub const EXIT_ARGUMENTS: u8 = 3;

/// Failure of a tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Reading or writing a file failed
    #[error("{context}: {source}")]
    Io {
        /// What was being attempted
        context: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The pattern does not occur in the file
    #[error("pattern not found in {}", path.display())]
    PatternNotFound {
        /// File that was searched
        path: PathBuf,
    },

    /// Unusable input
    #[error("invalid arguments: {0}")]
    InvalidArgument(String),

    /// The request never produced an HTTP response
    #[error("request to {url} failed: {source}")]
    Transport {
        /// Target URL
        url: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },
}

impl ToolError {
    /// Creates an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Creates an argument error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Exit code this error terminates the process with.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Io { .. } | Self::Transport { .. } => EXIT_FAILURE,
            Self::PatternNotFound { .. } => EXIT_NOT_FOUND,
            Self::InvalidArgument(_) => EXIT_ARGUMENTS,
        }
    }
}
