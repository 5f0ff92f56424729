//! CID register reads

use crate::error::{CidError, Result};
use std::fs;
use std::path::Path;

/// Read the register text at `path`, trimmed of surrounding whitespace
///
/// The value is returned as the kernel formats it (lowercase hex) and is not
/// parsed; callers compare it with [`CidValue::matches`](crate::CidValue::matches).
pub fn read(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path).map_err(|e| CidError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let value = content.trim();
    if value.is_empty() {
        return Err(CidError::EmptyRegister(path.to_path_buf()));
    }
    Ok(value.to_string())
}
