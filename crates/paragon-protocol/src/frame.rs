//! Frame codec: checksum-protected STX/ETX framing.
//!
//! # Wire Format
//!
//! ```text
//! STX  payload              '#'  CRC4HEX  ETX
//! 0x02 trinit<TAB>bm0<TAB>  0x23 "1A2B"   0x03
//! ```
//!
//! `CRC4HEX` is the CRC16-CCITT of the payload as four hex digits, most
//! significant nibble first. Frames are sent with uppercase digits; either
//! case is accepted on receive. The payload itself never contains STX or
//! ETX.
//!
//! # Example
//!
//! ```
//! use paragon_protocol::frame::{decode_frame, encode_frame};
//!
//! let frame = encode_frame(b"123456789");
//! assert_eq!(&frame[..], b"\x02123456789#31C3\x03");
//!
//! let payload = decode_frame(&frame).unwrap();
//! assert_eq!(&payload[..], b"123456789");
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use paragon_core::{
    Error, Result,
    constants::{CHECKSUM_MARKER, CHECKSUM_SUFFIX_LEN, END_BYTE, FRAME_OVERHEAD, START_BYTE},
};

use crate::crc::crc16_ccitt;

/// Wrap `payload` in a complete frame.
///
/// This is a total function: any payload produces a frame. Keeping STX and
/// ETX out of the payload is the caller's responsibility (command builders
/// enforce it through field validation).
#[must_use]
pub fn encode_frame(payload: &[u8]) -> Bytes {
    let checksum = format!("{:04X}", crc16_ccitt(payload));

    let mut buf = BytesMut::with_capacity(payload.len() + FRAME_OVERHEAD);
    buf.put_u8(START_BYTE);
    buf.put_slice(payload);
    buf.put_u8(CHECKSUM_MARKER);
    buf.put_slice(checksum.as_bytes());
    buf.put_u8(END_BYTE);
    buf.freeze()
}

/// Validate a received frame and return its payload.
///
/// Bytes before the first STX are ignored, so `raw` may carry leading
/// garbage. Everything after the first ETX is ignored as well.
///
/// # Errors
///
/// - `Error::MissingStartMarker` - no STX in `raw`
/// - `Error::UnterminatedFrame` - STX found but no ETX after it
/// - `Error::FrameTooShort` - fewer than 5 bytes between STX and ETX
/// - `Error::MissingChecksumMarker` - no `#` five bytes before ETX
/// - `Error::ChecksumDecode` - the 4 checksum characters are not hex
/// - `Error::ChecksumMismatch` - checksum does not match the payload
pub fn decode_frame(raw: &[u8]) -> Result<Bytes> {
    let start = raw
        .iter()
        .position(|&b| b == START_BYTE)
        .ok_or(Error::MissingStartMarker)?;
    let after_start = &raw[start + 1..];

    let end = after_start
        .iter()
        .position(|&b| b == END_BYTE)
        .ok_or(Error::UnterminatedFrame {
            received: after_start.len(),
        })?;
    let body = &after_start[..end];

    if body.len() < CHECKSUM_SUFFIX_LEN {
        return Err(Error::FrameTooShort { len: body.len() });
    }

    let marker_pos = body.len() - CHECKSUM_SUFFIX_LEN;
    if body[marker_pos] != CHECKSUM_MARKER {
        return Err(Error::MissingChecksumMarker);
    }

    let payload = &body[..marker_pos];
    let got = parse_checksum(&body[marker_pos + 1..])?;
    let want = crc16_ccitt(payload);
    if got != want {
        return Err(Error::ChecksumMismatch { got, want });
    }

    Ok(Bytes::copy_from_slice(payload))
}

/// Parse the 4 hex digits of a checksum suffix, either case.
fn parse_checksum(digits: &[u8]) -> Result<u16> {
    let decode_error = || Error::ChecksumDecode {
        text: String::from_utf8_lossy(digits).into_owned(),
    };

    let bytes = hex::decode(digits).map_err(|_| decode_error())?;
    match bytes.as_slice() {
        [hi, lo] => Ok(u16::from_be_bytes([*hi, *lo])),
        _ => Err(decode_error()),
    }
}
