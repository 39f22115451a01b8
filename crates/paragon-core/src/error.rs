use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Framing errors
    #[error("Frame start marker (STX) not found")]
    MissingStartMarker,

    #[error("Frame end marker (ETX) not found after {received} bytes")]
    UnterminatedFrame { received: usize },

    #[error("Frame too short: {len} bytes between STX and ETX")]
    FrameTooShort { len: usize },

    #[error("Checksum marker '#' not found at expected position")]
    MissingChecksumMarker,

    #[error("Checksum decode failed: {text:?}")]
    ChecksumDecode { text: String },

    #[error("Checksum mismatch: got {got:04X}, want {want:04X}")]
    ChecksumMismatch { got: u16, want: u16 },

    #[error("Checksum self-test failed: got {got:04X}, want {want:04X}")]
    ChecksumSelfTest { got: u16, want: u16 },

    // Encoding errors
    #[error("Non-ASCII character {character:?} in {text:?}")]
    NonAsciiCharacter { character: char, text: String },

    #[error("Text {text:?} cannot be represented in {encoding}")]
    UnencodableCharacter { encoding: String, text: String },

    #[error("Unknown encoding: {0:?} (use: cp1250|latin2|mazovia|ascii)")]
    UnknownEncoding(String),

    // Command building errors
    #[error("Field {mnemonic} contains a reserved control byte (TAB, STX or ETX)")]
    InvalidFieldValue { mnemonic: String },

    // Receipt errors
    #[error("Invalid receipt: {0}")]
    InvalidReceipt(String),

    #[error("Invalid VAT rate: {0} (allowed 0-6)")]
    InvalidVatRate(i64),

    #[error("Invalid payment type: {0}")]
    InvalidPaymentType(i64),

    // Selection errors
    #[error("Invalid amount: {0} (must be positive)")]
    InvalidAmount(i64),

    #[error("No product combination found for {amount} after {attempts} attempts")]
    NoCombinationFound { amount: i64, attempts: usize },

    #[error("Selected products sum to {actual}, expected {expected}")]
    SumMismatch { expected: i64, actual: i64 },

    // Stock errors
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Product out of stock: {0}")]
    OutOfStock(String),
}

impl Error {
    /// Returns `true` for errors raised while validating a received frame.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            Error::MissingStartMarker
                | Error::UnterminatedFrame { .. }
                | Error::FrameTooShort { .. }
                | Error::MissingChecksumMarker
                | Error::ChecksumDecode { .. }
                | Error::ChecksumMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
