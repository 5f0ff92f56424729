//! Write protection command implementations

use super::Status;
use crate::error::CliError;
use cidflash_core::protection::{self, ProtectionState};
use cidflash_core::CidConfig;
use cidflash_mmc::CommandToggle;

/// Show current write protection status
pub fn cmd_status(config: &CidConfig) -> Result<Status, CliError> {
    let state = protection::is_protected(&config.ro_flag);

    println!(
        "Write protection on {}: {}",
        config.block_device.display(),
        state
    );
    if state == ProtectionState::Unknown {
        println!("Note: {} could not be read.", config.ro_flag.display());
    }

    Ok(Status::Success)
}

/// Disable write protection
///
/// Runs the toggle even if the flag already reads 0; success is judged only
/// from the toggle's output.
pub fn cmd_disable(config: &CidConfig) -> Result<Status, CliError> {
    let mut toggle = CommandToggle::from_config(config)?;
    protection::disable_protection(&mut toggle, &config.block_device)?;

    println!(
        "Write protection disabled on {}.",
        config.block_device.display()
    );
    Ok(Status::Success)
}
