//! Read-only flag toggling through an external command

use crate::error::{MmcError, Result};
use cidflash_core::{CidConfig, ProtectionToggle};
use log::debug;
use std::io;
use std::path::Path;
use std::process::Command;

/// Runs `<program> <args..> <device>` (by default `hdparm -r0 <device>`)
#[derive(Debug, Clone)]
pub struct CommandToggle {
    command: Vec<String>,
}

impl CommandToggle {
    pub fn new(command: Vec<String>) -> Result<Self> {
        if command.is_empty() {
            return Err(MmcError::EmptyToggleCommand);
        }
        Ok(Self { command })
    }

    /// Toggle using the command configured in `config`
    pub fn from_config(config: &CidConfig) -> Result<Self> {
        Self::new(config.toggle_command.clone())
    }

    /// Run the command and return stdout followed by stderr
    pub fn run(&self, device: &Path) -> Result<String> {
        let program = &self.command[0];
        let output = Command::new(program)
            .args(&self.command[1..])
            .arg(device)
            .output()
            .map_err(|e| MmcError::ToggleSpawnFailed {
                program: program.clone(),
                source: e,
            })?;

        debug!("'{}' exited with {}", self.command.join(" "), output.status);

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(text)
    }
}

impl ProtectionToggle for CommandToggle {
    fn disable_read_only(&mut self, device: &Path) -> io::Result<String> {
        Ok(self.run(device)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cidflash_core::protection::disable_protection;
    use cidflash_core::CidError;

    fn toggle(args: &[&str]) -> CommandToggle {
        CommandToggle::new(args.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(matches!(
            CommandToggle::new(Vec::new()),
            Err(MmcError::EmptyToggleCommand)
        ));
    }

    #[test]
    fn test_device_is_appended() {
        let output = toggle(&["echo", "setting ro to 0 on"])
            .run(Path::new("/dev/mmcblk9"))
            .unwrap();
        assert_eq!(output, "setting ro to 0 on /dev/mmcblk9\n");
    }

    #[test]
    fn test_stderr_is_included() {
        let output = toggle(&["sh", "-c", "echo out; echo err >&2"])
            .run(Path::new("/dev/mmcblk9"))
            .unwrap();
        assert_eq!(output, "out\nerr\n");
    }

    #[test]
    fn test_marker_in_output_fails_disable() {
        let mut ok = toggle(&["echo", "setting ro to 0"]);
        disable_protection(&mut ok, Path::new("/dev/mmcblk9")).unwrap();

        let mut still_ro = toggle(&["sh", "-c", "echo ' readonly = 1 (on)' >&2"]);
        assert!(matches!(
            disable_protection(&mut still_ro, Path::new("/dev/mmcblk9")),
            Err(CidError::ProtectionDisableFailed { .. })
        ));
    }

    #[test]
    fn test_missing_program() {
        let mut missing = toggle(&["cidflash-no-such-program"]);
        assert!(matches!(
            missing.run(Path::new("/dev/mmcblk9")),
            Err(MmcError::ToggleSpawnFailed { .. })
        ));
        assert!(matches!(
            disable_protection(&mut missing, Path::new("/dev/mmcblk9")),
            Err(CidError::ProtectionDisableFailed { .. })
        ));
    }
}
