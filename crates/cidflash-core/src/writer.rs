//! CID write state machine
//!
//! A write opens the block device once and walks a fixed ladder of
//! mechanisms until one succeeds:
//!
//! ```text
//! Idle -> DirectWrite -> ControlCode[0] -> ControlCode[1] -> ... -> AllFailed
//!             |               |                 |
//!             +---------------+-----------------+--> Success
//! ```
//!
//! A failing mechanism is logged and recorded, never fatal. Only an invalid
//! value or a device that cannot be opened aborts the write itself.

use crate::cid::{CidValue, CID_LEN};
use crate::config::CidConfig;
use crate::error::{CidError, Result};
use log::{debug, info, warn};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// An open handle to the card's block device
///
/// Implementations release the underlying handle on drop.
pub trait CidDevice {
    /// Program the CID register with a single direct command
    fn program_cid(&mut self, cid: &[u8; CID_LEN]) -> io::Result<()>;

    /// Issue control `code` with a 16-byte argument buffer
    fn control(&mut self, code: u32, arg: &mut [u8; CID_LEN]) -> io::Result<()>;
}

/// Opens [`CidDevice`] handles for writing
pub trait DeviceOpener {
    /// Device handle type
    type Device: CidDevice;

    /// Open `path` for writing
    fn open(&mut self, path: &Path) -> io::Result<Self::Device>;
}

/// A single way of getting a new value into the register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMechanism {
    /// Direct program-CID command
    Direct,
    /// Vendor control code
    ControlCode(u32),
}

impl fmt::Display for WriteMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMechanism::Direct => write!(f, "direct program-CID"),
            WriteMechanism::ControlCode(code) => write!(f, "control code 0x{:08X}", code),
        }
    }
}

/// Result of one mechanism
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteAttempt {
    pub mechanism: WriteMechanism,
    /// Error text when the mechanism failed
    pub error: Option<String>,
}

impl WriteAttempt {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Terminal state of a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    WrittenDirect,
    WrittenViaControlCode(u32),
    AllMechanismsFailed,
}

impl WriteOutcome {
    pub fn is_written(self) -> bool {
        !matches!(self, WriteOutcome::AllMechanismsFailed)
    }
}

/// Outcome plus every attempt made, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub outcome: WriteOutcome,
    pub attempts: Vec<WriteAttempt>,
}

impl WriteReport {
    /// Turn an exhausted ladder into [`CidError::AllMechanismsFailed`]
    pub fn into_result(self) -> Result<Self> {
        if self.outcome.is_written() {
            Ok(self)
        } else {
            Err(CidError::AllMechanismsFailed {
                attempts: self.attempts.len(),
            })
        }
    }
}

/// Drives the write ladder against one block device
pub struct CidWriter<O: DeviceOpener> {
    opener: O,
    device: PathBuf,
    control_codes: Vec<u32>,
}

impl<O: DeviceOpener> CidWriter<O> {
    pub fn new(opener: O, device: impl Into<PathBuf>, control_codes: Vec<u32>) -> Self {
        Self {
            opener,
            device: device.into(),
            control_codes,
        }
    }

    /// Writer for the block device and control codes of `config`
    pub fn from_config(opener: O, config: &CidConfig) -> Self {
        Self::new(opener, &config.block_device, config.control_codes.clone())
    }

    /// Block device path
    pub fn device(&self) -> &Path {
        &self.device
    }

    /// Control codes in the order they are tried
    pub fn control_codes(&self) -> &[u32] {
        &self.control_codes
    }

    /// Parse `hex` and write it
    ///
    /// A malformed value is rejected before the device is opened.
    pub fn write_str(&mut self, hex: &str) -> Result<WriteReport> {
        let cid: CidValue = hex.parse()?;
        self.write(&cid)
    }

    /// Write `cid`, trying the direct mechanism then each control code
    pub fn write(&mut self, cid: &CidValue) -> Result<WriteReport> {
        let mut device = self
            .opener
            .open(&self.device)
            .map_err(|e| CidError::DeviceOpenFailed {
                path: self.device.clone(),
                source: e,
            })?;
        debug!("Opened {} for writing", self.device.display());

        let mut attempts = Vec::with_capacity(self.control_codes.len() + 1);

        match device.program_cid(cid.as_bytes()) {
            Ok(()) => {
                info!("CID written with {}", WriteMechanism::Direct);
                attempts.push(WriteAttempt {
                    mechanism: WriteMechanism::Direct,
                    error: None,
                });
                return Ok(WriteReport {
                    outcome: WriteOutcome::WrittenDirect,
                    attempts,
                });
            }
            Err(e) => {
                warn!("{} failed: {}; trying control codes", WriteMechanism::Direct, e);
                attempts.push(WriteAttempt {
                    mechanism: WriteMechanism::Direct,
                    error: Some(e.to_string()),
                });
            }
        }

        for &code in &self.control_codes {
            let mechanism = WriteMechanism::ControlCode(code);
            let mut arg = cid.control_argument();
            info!("Trying {}", mechanism);

            match device.control(code, &mut arg) {
                Ok(()) => {
                    info!("CID written with {}", mechanism);
                    attempts.push(WriteAttempt {
                        mechanism,
                        error: None,
                    });
                    return Ok(WriteReport {
                        outcome: WriteOutcome::WrittenViaControlCode(code),
                        attempts,
                    });
                }
                Err(e) => {
                    warn!("{} failed: {}", mechanism, e);
                    attempts.push(WriteAttempt {
                        mechanism,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        warn!("All {} write mechanisms failed", attempts.len());
        Ok(WriteReport {
            outcome: WriteOutcome::AllMechanismsFailed,
            attempts,
        })
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory card with a programmable set of working mechanisms

    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    pub struct CardState {
        /// Register text as sysfs would show it
        pub register: String,
        pub direct_works: bool,
        pub working_code: Option<u32>,
        pub opens: usize,
        pub releases: usize,
        pub fail_open: bool,
        pub mechanisms: Vec<WriteMechanism>,
        pub control_args: Vec<Vec<u8>>,
        /// sysfs file kept in sync with `register` after a successful write
        pub mirror: Option<std::path::PathBuf>,
    }

    impl CardState {
        fn store(&mut self, bytes: &[u8]) {
            self.register = hex::encode(bytes);
            if let Some(path) = &self.mirror {
                std::fs::write(path, format!("{}\n", self.register)).unwrap();
            }
        }
    }

    /// Shared handle so tests can inspect the card after the writer used it
    #[derive(Clone, Default)]
    pub struct FakeCard(pub Rc<RefCell<CardState>>);

    impl FakeCard {
        pub fn new(register: &str) -> Self {
            let card = Self::default();
            card.0.borrow_mut().register = register.to_string();
            card
        }

        pub fn state(&self) -> std::cell::Ref<'_, CardState> {
            self.0.borrow()
        }

        pub fn configure(&self, direct_works: bool, working_code: Option<u32>) {
            let mut state = self.0.borrow_mut();
            state.direct_works = direct_works;
            state.working_code = working_code;
        }
    }

    pub struct FakeHandle(Rc<RefCell<CardState>>);

    impl Drop for FakeHandle {
        fn drop(&mut self) {
            self.0.borrow_mut().releases += 1;
        }
    }

    impl CidDevice for FakeHandle {
        fn program_cid(&mut self, cid: &[u8; CID_LEN]) -> io::Result<()> {
            let mut state = self.0.borrow_mut();
            state.mechanisms.push(WriteMechanism::Direct);
            if state.direct_works {
                state.store(cid);
                Ok(())
            } else {
                Err(io::Error::other("vendor mode rejected"))
            }
        }

        fn control(&mut self, code: u32, arg: &mut [u8; CID_LEN]) -> io::Result<()> {
            let mut state = self.0.borrow_mut();
            state.mechanisms.push(WriteMechanism::ControlCode(code));
            state.control_args.push(arg.to_vec());
            if state.working_code == Some(code) {
                state.store(&arg[..]);
                Ok(())
            } else {
                Err(io::Error::new(io::ErrorKind::Unsupported, "inappropriate ioctl"))
            }
        }
    }

    impl DeviceOpener for FakeCard {
        type Device = FakeHandle;

        fn open(&mut self, _path: &Path) -> io::Result<FakeHandle> {
            let mut state = self.0.borrow_mut();
            state.opens += 1;
            if state.fail_open {
                return Err(io::Error::from(io::ErrorKind::PermissionDenied));
            }
            Ok(FakeHandle(self.0.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeCard;
    use super::*;
    use crate::config::DEFAULT_CONTROL_CODES;

    const ORIGINAL: &str = "035344534c3136478000c3f7b2012a00";
    const NEW_CID: &str = "0123456789ABCDEF0123456789ABCDEF";

    fn writer(card: &FakeCard) -> CidWriter<FakeCard> {
        CidWriter::new(card.clone(), "/dev/mmcblk0", DEFAULT_CONTROL_CODES.to_vec())
    }

    #[test]
    fn test_invalid_length_never_opens_device() {
        let card = FakeCard::new(ORIGINAL);
        let mut w = writer(&card);
        for len in [0usize, 1, 16, 31, 33, 48] {
            let candidate = "a".repeat(len);
            assert!(matches!(
                w.write_str(&candidate),
                Err(CidError::InvalidCid { .. })
            ));
        }
        assert_eq!(card.state().opens, 0);
    }

    #[test]
    fn test_direct_write_short_circuits() {
        let card = FakeCard::new(ORIGINAL);
        card.configure(true, Some(DEFAULT_CONTROL_CODES[0]));

        let report = writer(&card).write_str(NEW_CID).unwrap();
        assert_eq!(report.outcome, WriteOutcome::WrittenDirect);
        assert_eq!(report.attempts.len(), 1);
        assert_eq!(card.state().mechanisms, vec![WriteMechanism::Direct]);
        assert!(card.state().control_args.is_empty());
        assert_eq!(card.state().register, NEW_CID.to_lowercase());
    }

    #[test]
    fn test_second_code_wins_and_stops_ladder() {
        let card = FakeCard::new(ORIGINAL);
        let second = DEFAULT_CONTROL_CODES[1];
        card.configure(false, Some(second));

        let report = writer(&card).write_str(NEW_CID).unwrap();
        assert_eq!(report.outcome, WriteOutcome::WrittenViaControlCode(second));
        assert_eq!(
            card.state().mechanisms,
            vec![
                WriteMechanism::Direct,
                WriteMechanism::ControlCode(DEFAULT_CONTROL_CODES[0]),
                WriteMechanism::ControlCode(second),
            ]
        );
        assert!(report.attempts[..2].iter().all(|a| !a.succeeded()));
        assert!(report.attempts[2].succeeded());
    }

    #[test]
    fn test_control_arguments_are_cid_bytes() {
        let card = FakeCard::new(ORIGINAL);
        card.configure(false, None);

        writer(&card).write_str(NEW_CID).unwrap();
        let expected = hex::decode(NEW_CID).unwrap();
        let state = card.state();
        assert_eq!(state.control_args.len(), DEFAULT_CONTROL_CODES.len());
        for arg in &state.control_args {
            assert_eq!(arg.len(), CID_LEN);
            assert_eq!(arg, &expected);
        }
    }

    #[test]
    fn test_all_fail_leaves_register_untouched() {
        let card = FakeCard::new(ORIGINAL);
        card.configure(false, None);

        let report = writer(&card).write_str(NEW_CID).unwrap();
        assert_eq!(report.outcome, WriteOutcome::AllMechanismsFailed);
        assert_eq!(report.attempts.len(), 1 + DEFAULT_CONTROL_CODES.len());
        assert_eq!(card.state().register, ORIGINAL);
        assert!(matches!(
            report.into_result(),
            Err(CidError::AllMechanismsFailed { attempts: 4 })
        ));
    }

    #[test]
    fn test_handle_released_on_every_path() {
        for (direct, code) in [(true, None), (false, Some(0xABCD1234)), (false, None)] {
            let card = FakeCard::new(ORIGINAL);
            card.configure(direct, code);
            writer(&card).write_str(NEW_CID).unwrap();
            assert_eq!(card.state().opens, 1);
            assert_eq!(card.state().releases, 1);
        }
    }

    #[test]
    fn test_open_failure_is_fatal() {
        let card = FakeCard::new(ORIGINAL);
        card.0.borrow_mut().fail_open = true;
        assert!(matches!(
            writer(&card).write_str(NEW_CID),
            Err(CidError::DeviceOpenFailed { .. })
        ));
        assert!(card.state().mechanisms.is_empty());
    }

    #[test]
    fn test_empty_code_list_only_tries_direct() {
        let card = FakeCard::new(ORIGINAL);
        let mut w = CidWriter::new(card.clone(), "/dev/mmcblk0", Vec::new());
        let report = w.write_str(NEW_CID).unwrap();
        assert_eq!(report.outcome, WriteOutcome::AllMechanismsFailed);
        assert_eq!(report.attempts.len(), 1);
    }
}
