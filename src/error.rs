//! CLI error type and exit codes

use cidflash_core::CidError;
use cidflash_mmc::MmcError;
use thiserror::Error;

/// Errors surfaced by CLI commands
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Cid(#[from] CidError),

    #[error(transparent)]
    Mmc(#[from] MmcError),
}

impl CliError {
    /// Process exit code, see [`CidError::exit_code`]
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Cid(e) => e.exit_code(),
            CliError::Mmc(MmcError::EmptyToggleCommand) => 4,
            CliError::Mmc(MmcError::ToggleSpawnFailed { .. }) => 5,
            CliError::Mmc(_) => 6,
        }
    }
}
