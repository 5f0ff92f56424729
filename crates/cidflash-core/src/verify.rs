//! Post-write verification

use crate::cid::CidValue;
use crate::error::{CidError, Result};
use crate::register;
use log::debug;
use std::path::Path;
use std::time::Duration;

/// Result of comparing the register with the requested value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Match,
    /// Register holds something else; carries the text that was read
    Mismatch(String),
}

impl Verification {
    pub fn is_match(&self) -> bool {
        matches!(self, Verification::Match)
    }

    /// Turn a mismatch into [`CidError::VerificationMismatch`]
    pub fn into_result(self, expected: &CidValue) -> Result<()> {
        match self {
            Verification::Match => Ok(()),
            Verification::Mismatch(actual) => Err(CidError::VerificationMismatch {
                expected: expected.to_string(),
                actual,
            }),
        }
    }
}

/// Compare a register reading with `expected`, ignoring hex case
pub fn compare(reading: &str, expected: &CidValue) -> Verification {
    if expected.matches(reading) {
        Verification::Match
    } else {
        Verification::Mismatch(reading.trim().to_string())
    }
}

/// Wait `settle`, re-read the register at `path` and compare
///
/// No retries: a mismatch is reported as-is.
pub fn verify(path: &Path, expected: &CidValue, settle: Duration) -> Result<Verification> {
    if !settle.is_zero() {
        debug!("Waiting {:?} for the card to settle", settle);
        std::thread::sleep(settle);
    }

    let reading = register::read(path)?;
    Ok(compare(&reading, expected))
}
