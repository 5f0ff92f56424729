//! CLI command implementations
//!
//! Each command takes the effective [`CidConfig`](cidflash_core::CidConfig)
//! and returns a [`Status`] or an error; `main` turns either into the
//! process exit code.

pub mod info;
pub mod verify;
pub mod wp;
pub mod write;

/// Non-error result of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed
    Success,
    /// Operator declined a confirmation
    Aborted,
    /// Register does not hold the requested value
    Mismatch,
}

impl Status {
    pub fn exit_code(self) -> u8 {
        match self {
            Status::Success => 0,
            Status::Aborted => 1,
            Status::Mismatch => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_exit_codes() {
        assert_eq!(Status::Success.exit_code(), 0);
        assert_eq!(Status::Aborted.exit_code(), 1);
        assert_eq!(Status::Mismatch.exit_code(), 8);
    }
}
