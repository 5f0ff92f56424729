//! Linux MMC block device implementation

use crate::error::{MmcError, Result};
use cidflash_core::{CidDevice, DeviceOpener, CID_LEN};
use log::{debug, info};
use nix::errno::Errno;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

/// MMC constants from kernel headers (linux/mmc/core.h, linux/mmc/mmc.h)
mod mmc_consts {
    /// Block major of mmcblk devices; also the MMC_IOC_* ioctl type
    pub const MMC_BLOCK_MAJOR: u8 = 179;

    /// CMD26: program the CID register (one 16-byte data block)
    pub const MMC_PROGRAM_CID: u32 = 26;

    pub const MMC_RSP_PRESENT: u32 = 1 << 0;
    pub const MMC_RSP_CRC: u32 = 1 << 2;
    pub const MMC_RSP_OPCODE: u32 = 1 << 4;
    pub const MMC_CMD_ADTC: u32 = 1 << 5;
    pub const MMC_RSP_SPI_S1: u32 = 1 << 7;

    pub const MMC_RSP_R1: u32 = MMC_RSP_PRESENT | MMC_RSP_CRC | MMC_RSP_OPCODE;
    pub const MMC_RSP_SPI_R1: u32 = MMC_RSP_SPI_S1;
}

use mmc_consts::*;

/// MMC_IOC_CMD argument
/// Matches struct mmc_ioc_cmd from linux/mmc/ioctl.h
#[repr(C)]
#[derive(Debug, Default, Clone)]
pub struct MmcIocCmd {
    write_flag: libc::c_int,
    is_acmd: libc::c_int,
    opcode: u32,
    arg: u32,
    response: [u32; 4],
    flags: libc::c_uint,
    blksz: libc::c_uint,
    blocks: libc::c_uint,
    postsleep_min_us: libc::c_uint,
    postsleep_max_us: libc::c_uint,
    data_timeout_ns: libc::c_uint,
    cmd_timeout_ms: libc::c_uint,
    pad: u32,
    data_ptr: u64,
}

// MMC_IOC_CMD = _IOWR(MMC_BLOCK_MAJOR, 0, struct mmc_ioc_cmd)
nix::ioctl_readwrite!(mmc_ioc_cmd, MMC_BLOCK_MAJOR, 0, MmcIocCmd);

/// Build the CMD26 request writing `cid` as its single data block
///
/// `cid` must outlive the ioctl; only its address is stored.
fn program_cid_command(cid: &[u8; CID_LEN]) -> MmcIocCmd {
    MmcIocCmd {
        write_flag: 1,
        opcode: MMC_PROGRAM_CID,
        flags: MMC_RSP_SPI_R1 | MMC_RSP_R1 | MMC_CMD_ADTC,
        blksz: CID_LEN as libc::c_uint,
        blocks: 1,
        data_ptr: cid.as_ptr() as u64,
        ..Default::default()
    }
}

/// Opens MMC block devices read/write
#[derive(Debug, Default, Clone, Copy)]
pub struct MmcOpener;

impl DeviceOpener for MmcOpener {
    type Device = MmcBlockDevice;

    fn open(&mut self, path: &Path) -> io::Result<MmcBlockDevice> {
        Ok(MmcBlockDevice::open(path)?)
    }
}

/// Open handle to an MMC block device (e.g. `/dev/mmcblk0`)
///
/// The file descriptor is closed when the handle is dropped.
///
/// # Example
///
/// ```ignore
/// use cidflash_mmc::MmcBlockDevice;
///
/// let mut dev = MmcBlockDevice::open("/dev/mmcblk0")?;
/// dev.send_program_cid(&[0u8; 16])?;
/// ```
#[derive(Debug)]
pub struct MmcBlockDevice {
    file: File,
    path: PathBuf,
}

impl MmcBlockDevice {
    /// Open a block device for writing
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| MmcError::OpenFailed {
                path: path.display().to_string(),
                source: e,
            })?;

        debug!("Opened {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Device path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Issue CMD26 (PROGRAM_CID) through MMC_IOC_CMD
    pub fn send_program_cid(&mut self, cid: &[u8; CID_LEN]) -> Result<()> {
        let mut cmd = program_cid_command(cid);

        // SAFETY: valid fd, `cmd` is a properly initialized mmc_ioc_cmd and
        // `data_ptr` points at `cid`, which outlives the call
        unsafe {
            mmc_ioc_cmd(self.file.as_raw_fd(), &mut cmd).map_err(|e| {
                MmcError::CommandFailed {
                    opcode: MMC_PROGRAM_CID,
                    source: e,
                }
            })?;
        }

        info!(
            "{}: CMD{} accepted (R1 {:#010x})",
            self.path.display(),
            MMC_PROGRAM_CID,
            cmd.response[0]
        );
        Ok(())
    }

    /// Issue an arbitrary ioctl `code` with a 16-byte argument buffer
    pub fn send_control(&mut self, code: u32, arg: &mut [u8; CID_LEN]) -> Result<()> {
        // SAFETY: valid fd; the buffer is CID_LEN bytes and lives for the call.
        // A driver that expects a larger argument for `code` would overrun it,
        // the codes are caller supplied.
        let ret = unsafe { libc::ioctl(self.file.as_raw_fd(), code as _, arg.as_mut_ptr()) };

        Errno::result(ret)
            .map(drop)
            .map_err(|e| MmcError::ControlFailed { code, source: e })
    }
}

impl CidDevice for MmcBlockDevice {
    fn program_cid(&mut self, cid: &[u8; CID_LEN]) -> io::Result<()> {
        Ok(self.send_program_cid(cid)?)
    }

    fn control(&mut self, code: u32, arg: &mut [u8; CID_LEN]) -> io::Result<()> {
        Ok(self.send_control(code, arg)?)
    }
}
