//! Error types for libagentnet.

use std::io;
use std::path::PathBuf;

/// Result type alias for network platform operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the network configuration subsystem.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An IP address or netmask was not a well-formed dotted-quad.
    #[error("Invalid IPv4 address '{value}': {reason}")]
    InvalidAddress { value: String, reason: String },

    /// No discovered network device carries the requested hardware address.
    #[error("No network interface found with MAC address '{mac}'")]
    InterfaceNotFound { mac: String },

    /// Reading or writing a configuration file failed.
    #[error("I/O error on '{}': {source}", path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An external command could not be run or exited unsuccessfully.
    #[error("Command '{command}' failed: {reason}")]
    CommandExecution { command: String, reason: String },

    /// The settings document could not be read or parsed.
    #[error("Invalid settings in '{}': {reason}", path.display())]
    Settings { path: PathBuf, reason: String },
}

impl Error {
    pub(crate) fn invalid_address(value: &str, reason: impl Into<String>) -> Self {
        Error::InvalidAddress {
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn file_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::FileIo {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn command(args: &[String], reason: impl Into<String>) -> Self {
        Error::CommandExecution {
            command: args.join(" "),
            reason: reason.into(),
        }
    }
}
