//! Field value validation.
//!
//! TAB terminates a field, STX and ETX delimit the frame. A field value
//! carrying any of them would shift every following field or cut the frame
//! short, so such values are refused while the command is being built and
//! nothing is sent.
//!
//! ```
//! use paragon_protocol::validate_field_value;
//!
//! assert!(validate_field_value("na", b"Kurtka zimowa").is_ok());
//! assert!(validate_field_value("na", b"Kurtka\tzimowa").is_err());
//! ```

use paragon_core::{
    Error, Result,
    constants::{END_BYTE, FIELD_TERMINATOR, START_BYTE},
};

/// Returns `true` for bytes that may never appear inside a field value.
#[inline]
#[must_use]
pub fn is_reserved_byte(byte: u8) -> bool {
    matches!(byte, FIELD_TERMINATOR | START_BYTE | END_BYTE)
}

/// Reject a field value containing TAB, STX or ETX.
///
/// # Errors
///
/// Returns `Error::InvalidFieldValue` naming the offending mnemonic.
pub fn validate_field_value(mnemonic: &str, value: &[u8]) -> Result<()> {
    if value.iter().copied().any(is_reserved_byte) {
        return Err(Error::InvalidFieldValue {
            mnemonic: mnemonic.to_string(),
        });
    }
    Ok(())
}
