//! cidflash-mmc - Linux MMC backend for cidflash
//!
//! Implements the hardware seams of `cidflash-core` for Linux:
//!
//! - [`MmcOpener`] / [`MmcBlockDevice`]: opens `/dev/mmcblkN` and issues the
//!   write mechanisms. The direct mechanism is CMD26 (PROGRAM_CID) sent with
//!   the `MMC_IOC_CMD` ioctl; control codes are passed to `ioctl(2)` as-is
//!   with a 16-byte argument buffer.
//! - [`CommandToggle`]: runs `hdparm -r0 /dev/mmcblkN` (or a configured
//!   replacement) to clear the block layer's read-only flag.
//!
//! # System Requirements
//!
//! - Linux kernel with the MMC block driver (`CONFIG_MMC_BLOCK`)
//! - Read/write access to the block device, usually root
//! - `hdparm` in `PATH` when the card is write-protected
//!
//! Most cards reject CMD26 outside the factory; vendor control codes are
//! specific to the host driver. Both failures are expected and reported.
//!
//! # Device Discovery
//!
//! ```bash
//! ls /sys/class/mmc_host/*/*/cid
//! cat /sys/block/mmcblk0/ro
//! ```

pub mod device;
pub mod error;
pub mod toggle;

// Re-exports
pub use device::{MmcBlockDevice, MmcIocCmd, MmcOpener};
pub use error::{MmcError, Result};
pub use toggle::CommandToggle;
