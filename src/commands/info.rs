//! Info command implementation

use super::Status;
use crate::error::CliError;
use cidflash_core::{locator, protection, register, CidConfig};

/// Show the CID register and protection state
pub fn cmd_info(config: &CidConfig) -> Result<Status, CliError> {
    let path = locator::control_path(config)?;
    let cid = register::read(&path)?;
    let state = protection::is_protected(&config.ro_flag);

    println!("Card Information");
    println!("================");
    println!();
    println!("CID register:     {}", path.display());
    println!("CID:              {}", cid);
    println!("Block device:     {}", config.block_device.display());
    println!("Write protection: {}", state);

    Ok(Status::Success)
}
