//! Write-protection inspection and clearing

use crate::error::{CidError, Result};
use log::{debug, info, warn};
use std::fmt;
use std::io;
use std::path::Path;

/// Substring whose presence in the toggle output means the device is still
/// read-only
pub const READONLY_MARKER: &str = "readonly";

/// Read-only state of the block device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionState {
    /// Flag file reads `1`
    Protected,
    /// Flag file reads anything else
    Unprotected,
    /// Flag file could not be read
    Unknown,
}

impl ProtectionState {
    /// Whether a run must try to clear protection before writing
    ///
    /// `Unknown` is treated like `Protected`.
    pub fn needs_disable(self) -> bool {
        !matches!(self, ProtectionState::Unprotected)
    }
}

impl fmt::Display for ProtectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProtectionState::Protected => "write-protected",
            ProtectionState::Unprotected => "not write-protected",
            ProtectionState::Unknown => "unknown",
        })
    }
}

/// External utility able to clear the read-only flag of a block device
pub trait ProtectionToggle {
    /// Run the utility against `device` and return its stdout and stderr
    fn disable_read_only(&mut self, device: &Path) -> io::Result<String>;
}

impl<T: ProtectionToggle + ?Sized> ProtectionToggle for &mut T {
    fn disable_read_only(&mut self, device: &Path) -> io::Result<String> {
        (**self).disable_read_only(device)
    }
}

/// Read the block layer's read-only flag
pub fn is_protected(flag: &Path) -> ProtectionState {
    match std::fs::read_to_string(flag) {
        Ok(content) => {
            let state = if content.trim() == "1" {
                ProtectionState::Protected
            } else {
                ProtectionState::Unprotected
            };
            debug!("{} reads {:?}: {}", flag.display(), content.trim(), state);
            state
        }
        Err(e) => {
            warn!("Failed to check write protection via {}: {}", flag.display(), e);
            ProtectionState::Unknown
        }
    }
}

/// Clear write protection on `device`
///
/// The utility gives no explicit success signal. Success is inferred from the
/// ABSENCE of [`READONLY_MARKER`] in its lower-cased output; an output that
/// mentions it in any form is a failure.
pub fn disable_protection<T: ProtectionToggle + ?Sized>(
    toggle: &mut T,
    device: &Path,
) -> Result<()> {
    let output = toggle
        .disable_read_only(device)
        .map_err(|e| CidError::ProtectionDisableFailed {
            device: device.to_path_buf(),
            reason: e.to_string(),
        })?;

    debug!("Protection toggle output: {}", output.trim());

    if output.to_lowercase().contains(READONLY_MARKER) {
        return Err(CidError::ProtectionDisableFailed {
            device: device.to_path_buf(),
            reason: format!("toggle output still reports '{}'", READONLY_MARKER),
        });
    }

    info!("Write protection disabled on {}", device.display());
    Ok(())
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::path::PathBuf;

    /// Toggle returning a canned output and recording its invocations
    pub struct ScriptedToggle {
        pub output: io::Result<String>,
        pub calls: Vec<PathBuf>,
    }

    impl ScriptedToggle {
        pub fn with_output(output: &str) -> Self {
            Self {
                output: Ok(output.to_string()),
                calls: Vec::new(),
            }
        }

        pub fn failing(kind: io::ErrorKind) -> Self {
            Self {
                output: Err(io::Error::from(kind)),
                calls: Vec::new(),
            }
        }
    }

    impl ProtectionToggle for ScriptedToggle {
        fn disable_read_only(&mut self, device: &Path) -> io::Result<String> {
            self.calls.push(device.to_path_buf());
            match &self.output {
                Ok(s) => Ok(s.clone()),
                Err(e) => Err(io::Error::from(e.kind())),
            }
        }
    }
}
