//! CID register discovery
//!
//! The MMC core exposes every attached card as
//! `/sys/class/mmc_host/<host>/<host>:<rca>/cid`. The first such file, in
//! sorted host then card order, is the control path for the run.

use crate::config::CidConfig;
use crate::error::{CidError, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the register attribute inside a card directory
pub const CID_ATTRIBUTE: &str = "cid";

/// List the entries of a directory in sorted order
fn sorted_entries(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect::<Vec<_>>();
    entries.sort();
    Ok(entries)
}

/// Find the CID register of the first attached card under `root`
pub fn locate(root: &Path) -> Result<PathBuf> {
    let hosts = sorted_entries(root).map_err(|e| CidError::DiscoveryFailed {
        root: root.to_path_buf(),
        source: e,
    })?;

    for host in hosts {
        let cards = match sorted_entries(&host) {
            Ok(cards) => cards,
            Err(e) => {
                debug!("Skipping {}: {}", host.display(), e);
                continue;
            }
        };

        for card in cards {
            let cid_path = card.join(CID_ATTRIBUTE);
            if cid_path.is_file() {
                debug!("Found CID register at {}", cid_path.display());
                return Ok(cid_path);
            }
        }
        debug!("No card with a CID register under {}", host.display());
    }

    Err(CidError::NoCidFile(root.to_path_buf()))
}

/// Register path for a run: the configured override or the first card
pub fn control_path(config: &CidConfig) -> Result<PathBuf> {
    match &config.cid_file {
        Some(path) => Ok(path.clone()),
        None => locate(&config.host_root),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::ScratchDir;

    #[test]
    fn test_locate_first_card() {
        let dir = ScratchDir::new("locate");
        dir.mkdir("mmc0");
        dir.write("mmc1/power/control", "auto");
        let expected = dir.write("mmc1/mmc1:aaaa/cid", "0353445345453136");
        dir.write("mmc2/mmc2:0001/cid", "ffff");

        assert_eq!(locate(dir.path()).unwrap(), expected);
    }

    #[test]
    fn test_locate_skips_plain_files_at_host_level() {
        let dir = ScratchDir::new("locate-files");
        dir.write("uevent", "");
        let expected = dir.write("mmc0/mmc0:0001/cid", "00");
        assert_eq!(locate(dir.path()).unwrap(), expected);
    }

    #[test]
    fn test_no_register() {
        let dir = ScratchDir::new("locate-empty");
        dir.mkdir("mmc0/mmc0:0001");
        assert!(matches!(
            locate(dir.path()),
            Err(CidError::NoCidFile(_))
        ));
    }

    #[test]
    fn test_no_hosts() {
        let dir = ScratchDir::new("locate-nohost");
        assert!(matches!(
            locate(dir.path()),
            Err(CidError::NoCidFile(_))
        ));
    }

    #[test]
    fn test_missing_root() {
        let dir = ScratchDir::new("locate-missing");
        let root = dir.path().join("does-not-exist");
        assert!(matches!(
            locate(&root),
            Err(CidError::DiscoveryFailed { .. })
        ));
    }

    #[test]
    fn test_cid_file_override_skips_discovery() {
        let dir = ScratchDir::new("locate-override");
        let cid_file = dir.write("custom/cid", "00");
        let config = CidConfig {
            host_root: dir.path().join("absent"),
            cid_file: Some(cid_file.clone()),
            ..CidConfig::default()
        };
        assert_eq!(control_path(&config).unwrap(), cid_file);
    }

    #[test]
    fn test_control_path_scans_host_root() {
        let dir = ScratchDir::new("locate-scan");
        let expected = dir.write("mmc0/mmc0:0001/cid", "00");
        let config = CidConfig {
            host_root: dir.path().to_path_buf(),
            ..CidConfig::default()
        };
        assert_eq!(control_path(&config).unwrap(), expected);
    }
}
