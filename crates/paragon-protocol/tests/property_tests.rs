//! Property-based tests for the frame codec, the stream parser and the
//! text encoders.

use paragon_core::{
    Error,
    constants::{CHECKSUM_SUFFIX_LEN, END_BYTE, START_BYTE},
};
use paragon_protocol::{StreamParser, TextEncoding, decode_frame, encode_frame};
use proptest::prelude::*;

/// Payload bytes without the frame markers.
fn payload_bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        any::<u8>().prop_filter("no frame markers", |b| *b != START_BYTE && *b != END_BYTE),
        0..256,
    )
}

/// Polish product names mixing ASCII and the diacritic subset.
fn polish_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9 ąćęłńóśźżĄĆĘŁŃÓŚŹŻ]{1,40}")
        .expect("Failed to create name regex strategy")
}

proptest! {
    /// Property: decode(encode(p)) == p for every marker-free payload.
    #[test]
    fn prop_frame_roundtrip(payload in payload_bytes()) {
        let frame = encode_frame(&payload);
        let decoded = decode_frame(&frame).unwrap();
        prop_assert_eq!(&decoded[..], &payload[..]);
    }

    /// Property: a single bit flip in the checksum suffix never decodes.
    #[test]
    fn prop_checksum_bit_flip_detected(
        payload in payload_bytes(),
        offset in 0..CHECKSUM_SUFFIX_LEN,
        bit in 0u8..8,
    ) {
        let mut frame = encode_frame(&payload).to_vec();
        let pos = frame.len() - 1 - CHECKSUM_SUFFIX_LEN + offset;
        frame[pos] ^= 1 << bit;
        prop_assert!(decode_frame(&frame).is_err());
    }

    /// Property: a single bit flip in the payload is a checksum mismatch,
    /// unless it turned the byte into a frame marker.
    #[test]
    fn prop_payload_bit_flip_detected(
        payload in payload_bytes().prop_filter("non-empty", |p| !p.is_empty()),
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut frame = encode_frame(&payload).to_vec();
        let pos = 1 + index.index(payload.len());
        frame[pos] ^= 1 << bit;

        let result = decode_frame(&frame);
        if frame[pos] == START_BYTE || frame[pos] == END_BYTE {
            prop_assert!(result.is_err());
        } else {
            let is_mismatch = matches!(result, Err(Error::ChecksumMismatch { .. }));
            prop_assert!(is_mismatch);
        }
    }

    /// Property: the stream parser yields the same frames however the byte
    /// stream is chunked.
    #[test]
    fn prop_stream_parser_chunking(
        payloads in prop::collection::vec(payload_bytes(), 1..5),
        chunk in 1usize..32,
    ) {
        let stream: Vec<u8> = payloads.iter().flat_map(|p| encode_frame(p).to_vec()).collect();

        let mut parser = StreamParser::new();
        for part in stream.chunks(chunk) {
            parser.feed(part);
        }

        let decoded: Vec<Vec<u8>> = parser
            .drain_frames()
            .map(|raw| decode_frame(&raw).unwrap().to_vec())
            .collect();
        prop_assert_eq!(decoded, payloads);
    }

    /// Property: Mazovia output has one byte per character and never fails.
    #[test]
    fn prop_mazovia_one_byte_per_char(text in "\\PC{0,40}") {
        let bytes = TextEncoding::Mazovia.encode(&text).unwrap();
        prop_assert_eq!(bytes.len(), text.chars().count());
    }

    /// Property: Polish names survive every single-byte code page with the
    /// ASCII part unchanged.
    #[test]
    fn prop_polish_names_encode(name in polish_name()) {
        for enc in [TextEncoding::Cp1250, TextEncoding::Iso8859_2, TextEncoding::Mazovia] {
            let bytes = enc.encode(&name).unwrap();
            prop_assert_eq!(bytes.len(), name.chars().count());
            for (byte, ch) in bytes.iter().zip(name.chars()) {
                if ch.is_ascii() {
                    prop_assert_eq!(*byte, ch as u8);
                } else {
                    prop_assert!(*byte >= 0x80);
                }
            }
        }
    }

    /// Property: ASCII encoding accepts exactly the ASCII strings.
    #[test]
    fn prop_ascii_strict(text in "\\PC{0,20}") {
        let result = TextEncoding::Ascii.encode(&text);
        prop_assert_eq!(result.is_ok(), text.is_ascii());
    }
}
