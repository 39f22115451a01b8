pub mod commands;
pub mod crc;
pub mod encoding;
pub mod field;
pub mod frame;
pub mod response;
pub mod stream_parser;
pub mod validation;

pub use commands::{Command, CommandName};
pub use crc::crc16_ccitt;
pub use encoding::TextEncoding;
pub use field::{Field, Mnemonic};
pub use frame::{decode_frame, encode_frame};
pub use response::{ResponseRule, Verdict, classify_response};
pub use stream_parser::{DrainFrames, ParserState, StreamParser};
pub use validation::validate_field_value;
