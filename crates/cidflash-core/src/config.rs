//! Run configuration
//!
//! Every path and tunable the components touch lives in [`CidConfig`] and is
//! passed explicitly into them. Defaults target the first MMC block device;
//! a TOML file can override any subset of fields:
//!
//! ```toml
//! host_root = "/sys/class/mmc_host"
//! block_device = "/dev/mmcblk1"
//! ro_flag = "/sys/block/mmcblk1/ro"
//! control_codes = ["0x12345678", 0x87654321]
//! toggle_command = ["hdparm", "-r0"]
//! settle_delay_ms = 1000
//! ```

use crate::error::{CidError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Sysfs root holding one directory per MMC host controller
pub const DEFAULT_HOST_ROOT: &str = "/sys/class/mmc_host";

/// Block device the write mechanisms are issued against
pub const DEFAULT_BLOCK_DEVICE: &str = "/dev/mmcblk0";

/// Block-layer read-only flag for [`DEFAULT_BLOCK_DEVICE`]
pub const DEFAULT_RO_FLAG: &str = "/sys/block/mmcblk0/ro";

/// Vendor control codes tried, in order, after the direct write
pub const DEFAULT_CONTROL_CODES: [u32; 3] = [0x1234_5678, 0x8765_4321, 0xABCD_1234];

/// Protection toggle invocation; the block device path is appended
pub const DEFAULT_TOGGLE_COMMAND: [&str; 2] = ["hdparm", "-r0"];

/// Pause before the verifying read
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Configuration for a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CidConfig {
    /// Root scanned for `<host>/<card>/cid`
    pub host_root: PathBuf,
    /// Use this register file instead of scanning `host_root`
    pub cid_file: Option<PathBuf>,
    /// Raw block device opened for the write attempts
    pub block_device: PathBuf,
    /// Read-only status flag file
    pub ro_flag: PathBuf,
    /// Ordered control codes for the fallback stage
    pub control_codes: Vec<u32>,
    /// Program and leading arguments of the protection toggle
    pub toggle_command: Vec<String>,
    /// Delay before verification
    pub settle_delay: Duration,
}

impl Default for CidConfig {
    fn default() -> Self {
        Self {
            host_root: PathBuf::from(DEFAULT_HOST_ROOT),
            cid_file: None,
            block_device: PathBuf::from(DEFAULT_BLOCK_DEVICE),
            ro_flag: PathBuf::from(DEFAULT_RO_FLAG),
            control_codes: DEFAULT_CONTROL_CODES.to_vec(),
            toggle_command: DEFAULT_TOGGLE_COMMAND
                .iter()
                .map(|s| s.to_string())
                .collect(),
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// TOML file structure; absent fields keep their defaults
#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    host_root: Option<PathBuf>,
    cid_file: Option<PathBuf>,
    block_device: Option<PathBuf>,
    ro_flag: Option<PathBuf>,
    #[serde(default, deserialize_with = "deserialize_codes")]
    control_codes: Option<Vec<u32>>,
    toggle_command: Option<Vec<String>>,
    settle_delay_ms: Option<u64>,
}

/// Deserialize a list of u32 entries that can be hex strings or integers
fn deserialize_codes<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<u32>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum HexOrInt {
        Int(u32),
        Str(String),
    }

    let entries = Vec::<HexOrInt>::deserialize(deserializer)?;
    entries
        .into_iter()
        .map(|entry| match entry {
            HexOrInt::Int(n) => Ok(n),
            HexOrInt::Str(s) => parse_code(&s).map_err(serde::de::Error::custom),
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(Some)
}

/// Parse a control code that can be hex (0x...) or decimal
pub fn parse_code(s: &str) -> std::result::Result<u32, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("invalid hex '{}': {}", s, e))
    } else {
        s.parse()
            .map_err(|e| format!("invalid number '{}': {}", s, e))
    }
}

impl CidConfig {
    /// Load defaults overridden by a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| CidError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content).map_err(|message| CidError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse defaults overridden by TOML text
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, String> {
        let file: TomlConfig = toml::from_str(content).map_err(|e| e.to_string())?;
        let mut config = Self::default();

        if let Some(root) = file.host_root {
            config.host_root = root;
        }
        config.cid_file = file.cid_file;
        if let Some(dev) = file.block_device {
            config.block_device = dev;
        }
        if let Some(flag) = file.ro_flag {
            config.ro_flag = flag;
        }
        if let Some(codes) = file.control_codes {
            config.control_codes = codes;
        }
        if let Some(cmd) = file.toggle_command {
            if cmd.is_empty() {
                return Err("toggle_command must name a program".to_string());
            }
            config.toggle_command = cmd;
        }
        if let Some(ms) = file.settle_delay_ms {
            config.settle_delay = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// Point the run at another block device
    ///
    /// The read-only flag follows to `/sys/block/<name>/ro`.
    pub fn set_block_device(&mut self, device: impl Into<PathBuf>) {
        let device = device.into();
        if let Some(name) = device.file_name() {
            self.ro_flag = Path::new("/sys/block").join(name).join("ro");
        }
        self.block_device = device;
    }

    /// Render the effective configuration as TOML
    pub fn to_toml_string(&self) -> std::result::Result<String, String> {
        let output = TomlOutput {
            host_root: self.host_root.to_string_lossy().into_owned(),
            cid_file: self
                .cid_file
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            block_device: self.block_device.to_string_lossy().into_owned(),
            ro_flag: self.ro_flag.to_string_lossy().into_owned(),
            control_codes: self
                .control_codes
                .iter()
                .map(|c| format!("0x{:08X}", c))
                .collect(),
            toggle_command: &self.toggle_command,
            settle_delay_ms: u64::try_from(self.settle_delay.as_millis()).unwrap_or(u64::MAX),
        };
        toml::to_string(&output).map_err(|e| e.to_string())
    }
}

/// Serialized form of [`CidConfig`], field names matching [`TomlConfig`]
#[derive(serde::Serialize)]
struct TomlOutput<'a> {
    host_root: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cid_file: Option<String>,
    block_device: String,
    ro_flag: String,
    control_codes: Vec<String>,
    toggle_command: &'a [String],
    settle_delay_ms: u64,
}
