//! cidflash-core - CID register discovery, protection handling and rewrite
//!
//! This crate holds the platform-independent part of cidflash. Everything
//! that touches hardware goes through two seams:
//!
//! - [`DeviceOpener`] / [`CidDevice`]: the block device and its write
//!   mechanisms (implemented for Linux MMC in `cidflash-mmc`)
//! - [`ProtectionToggle`]: the external utility clearing the read-only flag
//!
//! # Flow
//!
//! ```text
//! locator::locate -> register::read -> protection::is_protected
//!     -> protection::disable_protection -> CidWriter::write -> verify::verify
//! ```
//!
//! [`Session`] runs the whole flow against an [`Operator`] that answers
//! confirmation prompts.
//!
//! # Example
//!
//! ```ignore
//! use cidflash_core::{CidConfig, CidWriter};
//!
//! let config = CidConfig::default();
//! let mut writer = CidWriter::from_config(opener, &config);
//! let report = writer.write_str("0123456789abcdef0123456789abcdef")?;
//! println!("{:?}", report.outcome);
//! ```

pub mod cid;
pub mod config;
pub mod error;
pub mod locator;
pub mod protection;
pub mod register;
pub mod session;
pub mod verify;
pub mod writer;

#[cfg(test)]
pub(crate) mod testutil;

pub use cid::{CidValue, CID_HEX_LEN, CID_LEN};
pub use config::CidConfig;
pub use error::{CidError, Result};
pub use protection::{ProtectionState, ProtectionToggle};
pub use session::{Operator, Session, SessionOutcome, SessionReport, Stage};
pub use verify::Verification;
pub use writer::{
    CidDevice, CidWriter, DeviceOpener, WriteAttempt, WriteMechanism, WriteOutcome, WriteReport,
};
