//! Verify command implementation

use super::Status;
use crate::error::CliError;
use cidflash_core::verify::{self, Verification};
use cidflash_core::{locator, register, CidConfig, CidValue};

/// Compare the CID register against `expected`
pub fn cmd_verify(config: &CidConfig, expected: &str) -> Result<Status, CliError> {
    let expected: CidValue = expected.parse()?;
    let path = locator::control_path(config)?;
    let reading = register::read(&path)?;

    match verify::compare(&reading, &expected) {
        Verification::Match => {
            println!("Verification passed: {}", reading);
            Ok(Status::Success)
        }
        Verification::Mismatch(actual) => {
            println!("Verification FAILED!");
            println!("  Expected: {}", expected);
            println!("  Register: {}", actual);
            Ok(Status::Mismatch)
        }
    }
}
