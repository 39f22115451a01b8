//! Core constants for the fiscal printer protocol and receipt generation.
//!
//! This module defines the protocol-level constants shared by every crate
//! in the workspace. Keeping them in one place guarantees that the frame
//! codec, the command builders and the session agree on the wire format.
//!
//! # Frame Structure
//!
//! Every exchange with the printer is wrapped in a checksum-protected frame:
//!
//! ```text
//! <STX>command<TAB>na...<TAB>vt0<TAB>#31C3<ETX>
//! ```
//!
//! Where:
//! - `<STX>` - Start of text marker (0x02)
//! - `command` - Lowercase command name (`trinit`, `trline`, ...)
//! - `<TAB>` - Field terminator (0x09), one after every field
//! - `#` - Checksum marker
//! - `31C3` - CRC16-CCITT of the payload as 4 uppercase hex digits
//! - `<ETX>` - End of text marker (0x03)
//!
//! # Usage
//!
//! ```
//! use paragon_core::constants::*;
//!
//! assert_eq!(START_BYTE, 0x02);
//! assert_eq!(CHECKSUM_SUFFIX_LEN, 1 + CHECKSUM_HEX_LEN);
//! ```

// ============================================================================
// Message Framing
// ============================================================================

/// Start of text marker (STX).
///
/// ```text
/// <STX>trinit<TAB>bm0<TAB>#XXXX<ETX>
/// ^^^^^
/// ```
pub const START_BYTE: u8 = 0x02; // STX

/// End of text marker (ETX).
pub const END_BYTE: u8 = 0x03; // ETX

/// Field terminator. Every field, including the command name, ends with one.
pub const FIELD_TERMINATOR: u8 = 0x09; // TAB

/// Line feed, escaped in payload logs together with TAB.
pub const LINE_FEED: u8 = 0x0A;

/// Marker byte separating the payload from its checksum.
pub const CHECKSUM_MARKER: u8 = b'#';

/// Number of hex digits carrying the CRC16 value.
pub const CHECKSUM_HEX_LEN: usize = 4;

/// Checksum suffix length: marker plus hex digits (`#31C3`).
pub const CHECKSUM_SUFFIX_LEN: usize = 1 + CHECKSUM_HEX_LEN;

/// Frame overhead in bytes: STX, checksum suffix and ETX.
///
/// ```
/// use paragon_core::constants::FRAME_OVERHEAD;
///
/// let payload = b"trinit\tbm0\t";
/// assert_eq!(payload.len() + FRAME_OVERHEAD, 18);
/// ```
pub const FRAME_OVERHEAD: usize = 2 + CHECKSUM_SUFFIX_LEN;

/// Upper bound for buffered, not yet framed, input.
///
/// A stream that grows past this without an ETX is treated as garbage.
pub const MAX_FRAME_BUFFER: usize = 64 * 1024;

// ============================================================================
// Timeout Configuration
// ============================================================================

/// Default I/O timeout when the configuration does not provide one (ms).
pub const DEFAULT_IO_TIMEOUT_MS: u64 = 5000;

/// Deadline for the response to a single transaction step (ms).
///
/// Applies to `trinit`, `trline`, `trpayment`, `trend` and form commands.
pub const STEP_RESPONSE_TIMEOUT_MS: u64 = 3000;

/// Deadline for report responses (ms).
///
/// Reports make the printer print and close its totals before it answers,
/// so they get a longer window than transaction steps.
pub const REPORT_RESPONSE_TIMEOUT_MS: u64 = 10_000;

/// Upper bound for flushing and shutting down a connection on close (ms).
pub const CLOSE_TIMEOUT_MS: u64 = 500;

// ============================================================================
// Receipt Limits
// ============================================================================

/// Maximum product name length printed on a receipt line (characters).
pub const MAX_LINE_NAME_CHARS: usize = 80;

/// Highest VAT rate index the printer accepts (`vt0`..`vt6`).
pub const MAX_VAT_RATE: u8 = 6;

/// Payment type codes accepted by the `ty` field.
///
/// 0 = cash, 2 = card, 8 = bank transfer; the rest are device specific
/// vouchers and credit forms.
pub const VALID_PAYMENT_TYPES: [u8; 8] = [0, 2, 3, 4, 5, 6, 7, 8];

/// Form number of the generic non-fiscal printout.
pub const SUPER_FORM_NUMBER: u16 = 200;

// ============================================================================
// Amount Decomposition
// ============================================================================

/// Independent randomized attempts before a decomposition is abandoned.
pub const MAX_SELECTION_ATTEMPTS: usize = 1000;

/// Maximum number of catalog lines on one generated receipt.
pub const MAX_SELECTION_DEPTH: usize = 10;

/// Below this remainder (minor units) a product fitting the range is priced
/// at exactly the remainder.
pub const SMALL_REMAINDER: i64 = 150;

/// A residual below this (minor units) is folded into the current product
/// when its price range allows it, instead of spawning a tiny trailing line.
pub const FOLD_RESIDUAL_BELOW: i64 = 500;

/// Prices are drawn from the top part of the usable range, starting at this
/// percentage of the range width.
pub const PRICE_FLOOR_PERCENT: i64 = 70;

/// Receipt name of the synthetic shipping line.
pub const SHIPPING_LINE_NAME: &str = "Wysyłka";

/// Minor units per major currency unit (grosze per złoty).
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;
