//! Error types for the Linux MMC backend

use std::io;
use thiserror::Error;

/// Linux MMC specific errors
#[derive(Debug, Error)]
pub enum MmcError {
    /// Failed to open the block device
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: io::Error,
    },

    /// MMC_IOC_CMD rejected the command
    #[error("MMC command CMD{opcode} failed: {source}")]
    CommandFailed {
        opcode: u32,
        #[source]
        source: nix::errno::Errno,
    },

    /// Vendor control code rejected
    #[error("Control code {code:#010x} failed: {source}")]
    ControlFailed {
        code: u32,
        #[source]
        source: nix::errno::Errno,
    },

    /// Protection toggle command list is empty
    #[error("Protection toggle command is empty")]
    EmptyToggleCommand,

    /// Protection toggle could not be started
    #[error("Failed to run '{program}': {source}")]
    ToggleSpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl From<MmcError> for io::Error {
    fn from(e: MmcError) -> Self {
        let kind = match &e {
            MmcError::OpenFailed { source, .. } | MmcError::ToggleSpawnFailed { source, .. } => {
                source.kind()
            }
            MmcError::CommandFailed { source, .. } | MmcError::ControlFailed { source, .. } => {
                io::Error::from(*source).kind()
            }
            MmcError::EmptyToggleCommand => io::ErrorKind::InvalidInput,
        };
        io::Error::new(kind, e)
    }
}

/// Result type for Linux MMC operations
pub type Result<T> = std::result::Result<T, MmcError>;
