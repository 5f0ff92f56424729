//! CID register value

use crate::error::CidError;
use core::fmt;
use core::str::FromStr;

/// Size of the CID register in bytes
pub const CID_LEN: usize = 16;

/// Length of the hex representation of a CID
pub const CID_HEX_LEN: usize = CID_LEN * 2;

/// A 16-byte Card Identification register value
///
/// Parsed from (and displayed as) 32 hex characters. The bytes are taken
/// verbatim; manufacturer fields and the trailing CRC7 are not interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CidValue([u8; CID_LEN]);

impl CidValue {
    /// Wrap raw register bytes
    pub const fn new(bytes: [u8; CID_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw register bytes
    pub fn as_bytes(&self) -> &[u8; CID_LEN] {
        &self.0
    }

    /// Argument buffer for a control-code attempt
    ///
    /// Always exactly [`CID_LEN`] bytes holding the CID in register order.
    pub fn control_argument(&self) -> [u8; CID_LEN] {
        self.0
    }

    /// Compare against a register reading, ignoring hex letter case
    pub fn matches(&self, reading: &str) -> bool {
        reading.trim().eq_ignore_ascii_case(&hex::encode(self.0))
    }
}

impl FromStr for CidValue {
    type Err = CidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = |reason: String| CidError::InvalidCid {
            value: s.to_string(),
            reason,
        };

        if s.len() != CID_HEX_LEN {
            return Err(invalid(format!(
                "expected {} hexadecimal characters, got {}",
                CID_HEX_LEN,
                s.len()
            )));
        }

        let mut bytes = [0u8; CID_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| invalid(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for CidValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
