//! CRC16-CCITT checksum used by the frame codec.
//!
//! The printer protects every payload with a 16-bit CRC: polynomial 0x1021,
//! initial value 0x0000, no input or output reflection and no final XOR.
//! This parameter set is catalogued as CRC-16/XMODEM, which is what the
//! [`crc`] crate provides.
//!
//! ```
//! use paragon_protocol::crc::crc16_ccitt;
//!
//! assert_eq!(crc16_ccitt(b"123456789"), 0x31C3);
//! ```

use crc::{CRC_16_XMODEM, Crc};
use paragon_core::{Error, Result};

/// Reference check value: CRC of the ASCII bytes `123456789`.
pub const CHECK_VALUE: u16 = 0x31C3;

const CRC16_CCITT: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Compute the CRC16-CCITT of `data`.
#[must_use]
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    CRC16_CCITT.checksum(data)
}

/// Run `checksum` over the reference input and compare with [`CHECK_VALUE`].
///
/// The printer client runs this with [`crc16_ccitt`] before every
/// connection attempt.
///
/// # Errors
/// `Error::ChecksumSelfTest` when the values differ.
pub fn verify_check_value(checksum: impl Fn(&[u8]) -> u16) -> Result<()> {
    let got = checksum(b"123456789");
    if got == CHECK_VALUE {
        Ok(())
    } else {
        Err(Error::ChecksumSelfTest {
            got,
            want: CHECK_VALUE,
        })
    }
}
