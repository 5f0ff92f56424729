//! Error types for cidflash-core
//!
//! Every fatal condition of a run maps to one variant here. Per-attempt write
//! failures are not errors: they are recorded in a
//! [`WriteReport`](crate::writer::WriteReport) and only the aggregate
//! outcome surfaces as [`CidError::AllMechanismsFailed`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum CidError {
    /// The host-controller root could not be enumerated
    #[error("Failed to enumerate MMC hosts in {root}: {source}")]
    DiscoveryFailed {
        root: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No card exposes a CID register under the host root
    #[error("No CID register found under {0}")]
    NoCidFile(PathBuf),

    /// The CID register file could not be read
    #[error("Failed to read CID register {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The CID register file was readable but empty
    #[error("CID register {0} is empty")]
    EmptyRegister(PathBuf),

    /// Replacement value is not 16 bytes of hex
    #[error("Invalid CID '{value}': {reason}")]
    InvalidCid { value: String, reason: String },

    /// Write protection is (or may be) active and could not be cleared
    #[error("Unable to disable write protection on {device}: {reason}")]
    ProtectionDisableFailed { device: PathBuf, reason: String },

    /// The block device could not be opened for writing
    #[error("Failed to open {path} for writing: {source}")]
    DeviceOpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Neither the direct write nor any control code succeeded
    #[error("All {attempts} write mechanisms failed")]
    AllMechanismsFailed { attempts: usize },

    /// The register reads back a different value than requested
    #[error("CID verification failed: expected {expected}, register reads {actual}")]
    VerificationMismatch { expected: String, actual: String },

    /// Configuration file could not be loaded
    #[error("Configuration error in {path}: {message}")]
    Config { path: PathBuf, message: String },
}

impl CidError {
    /// Process exit code for this error
    ///
    /// | code | meaning |
    /// |------|---------|
    /// | 2 | discovery failed |
    /// | 3 | register read failed |
    /// | 4 | invalid input or configuration |
    /// | 5 | write protection could not be disabled |
    /// | 6 | block device could not be opened |
    /// | 7 | all write mechanisms failed |
    /// | 8 | verification mismatch |
    ///
    /// Code 1 is reserved for an operator abort and 0 for success.
    pub fn exit_code(&self) -> u8 {
        match self {
            CidError::DiscoveryFailed { .. } | CidError::NoCidFile(_) => 2,
            CidError::ReadFailed { .. } | CidError::EmptyRegister(_) => 3,
            CidError::InvalidCid { .. } | CidError::Config { .. } => 4,
            CidError::ProtectionDisableFailed { .. } => 5,
            CidError::DeviceOpenFailed { .. } => 6,
            CidError::AllMechanismsFailed { .. } => 7,
            CidError::VerificationMismatch { .. } => 8,
        }
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CidError>;
