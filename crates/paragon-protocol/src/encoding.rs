//! Text encodings for printable field values.
//!
//! Only the values of text fields (product names, form lines, masks, header
//! lines) go through an encoding. Mnemonics, numbers and the TAB terminators
//! are always plain ASCII.
//!
//! | Name        | Accepted spellings                                  | Unmappable characters |
//! |-------------|-----------------------------------------------------|-----------------------|
//! | CP1250      | `cp1250`, `windows-1250`, `win1250`                 | error                 |
//! | ISO-8859-2  | `latin2`, `latin-2`, `iso-8859-2`, `iso8859-2`      | error                 |
//! | Mazovia     | `mazovia`                                           | replaced by a space   |
//! | ASCII       | `ascii`                                             | error                 |
//!
//! ```
//! use paragon_protocol::TextEncoding;
//!
//! let enc: TextEncoding = " Mazovia ".parse().unwrap();
//! assert_eq!(enc.encode("Żółw").unwrap(), vec![0xA1, 0xA2, 0x92, b'w']);
//! ```

use paragon_core::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Polish letters of the Mazovia code page.
const MAZOVIA_TABLE: [(char, u8); 18] = [
    ('Ą', 0x8F),
    ('Ć', 0x95),
    ('Ę', 0x90),
    ('Ł', 0x9C),
    ('Ń', 0xA5),
    ('Ó', 0xA0),
    ('Ś', 0x98),
    ('Ź', 0xA3),
    ('Ż', 0xA1),
    ('ą', 0x86),
    ('ć', 0x8D),
    ('ę', 0x91),
    ('ł', 0x92),
    ('ń', 0xA4),
    ('ó', 0xA2),
    ('ś', 0x9E),
    ('ź', 0xA6),
    ('ż', 0xA7),
];

/// Encoding applied to text field values before they go on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextEncoding {
    #[default]
    Cp1250,
    Iso8859_2,
    Mazovia,
    Ascii,
}

impl TextEncoding {
    /// Encode `text` into printer bytes.
    ///
    /// # Errors
    ///
    /// - `Error::NonAsciiCharacter` - ASCII encoding and a character above 0x7F
    /// - `Error::UnencodableCharacter` - CP1250/ISO-8859-2 cannot represent a character
    ///
    /// Mazovia never fails: characters outside its table become a space.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        match self {
            TextEncoding::Ascii => encode_ascii(text),
            TextEncoding::Cp1250 => encode_codepage(encoding_rs::WINDOWS_1250, *self, text),
            TextEncoding::Iso8859_2 => encode_codepage(encoding_rs::ISO_8859_2, *self, text),
            TextEncoding::Mazovia => Ok(encode_mazovia(text)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TextEncoding::Cp1250 => "cp1250",
            TextEncoding::Iso8859_2 => "latin2",
            TextEncoding::Mazovia => "mazovia",
            TextEncoding::Ascii => "ascii",
        }
    }
}

impl FromStr for TextEncoding {
    type Err = Error;

    /// Parse an encoding name, case-insensitive and ignoring surrounding whitespace.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cp1250" | "windows-1250" | "win1250" => Ok(TextEncoding::Cp1250),
            "latin2" | "latin-2" | "iso-8859-2" | "iso8859-2" => Ok(TextEncoding::Iso8859_2),
            "mazovia" => Ok(TextEncoding::Mazovia),
            "ascii" => Ok(TextEncoding::Ascii),
            _ => Err(Error::UnknownEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn encode_ascii(text: &str) -> Result<Vec<u8>> {
    if let Some(character) = text.chars().find(|c| !c.is_ascii()) {
        return Err(Error::NonAsciiCharacter {
            character,
            text: text.to_string(),
        });
    }
    Ok(text.as_bytes().to_vec())
}

fn encode_codepage(
    codepage: &'static encoding_rs::Encoding,
    name: TextEncoding,
    text: &str,
) -> Result<Vec<u8>> {
    let (bytes, _, had_unmappable) = codepage.encode(text);
    if had_unmappable {
        return Err(Error::UnencodableCharacter {
            encoding: name.to_string(),
            text: text.to_string(),
        });
    }
    Ok(bytes.into_owned())
}

fn encode_mazovia(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            if c.is_ascii() {
                c as u8
            } else {
                MAZOVIA_TABLE
                    .iter()
                    .find(|(letter, _)| *letter == c)
                    .map_or(b' ', |&(_, byte)| byte)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("cp1250", TextEncoding::Cp1250)]
    #[case("Windows-1250", TextEncoding::Cp1250)]
    #[case(" win1250 ", TextEncoding::Cp1250)]
    #[case("latin2", TextEncoding::Iso8859_2)]
    #[case("LATIN-2", TextEncoding::Iso8859_2)]
    #[case("iso-8859-2", TextEncoding::Iso8859_2)]
    #[case("iso8859-2", TextEncoding::Iso8859_2)]
    #[case("mazovia", TextEncoding::Mazovia)]
    #[case("ASCII", TextEncoding::Ascii)]
    fn test_parse_names(#[case] name: &str, #[case] expected: TextEncoding) {
        assert_eq!(name.parse::<TextEncoding>().unwrap(), expected);
    }

    #[rstest]
    #[case("utf-8")]
    #[case("")]
    #[case("cp852")]
    fn test_parse_unknown(#[case] name: &str) {
        assert!(matches!(
            name.parse::<TextEncoding>(),
            Err(Error::UnknownEncoding(_))
        ));
    }

    #[test]
    fn test_default_is_cp1250() {
        assert_eq!(TextEncoding::default(), TextEncoding::Cp1250);
    }

    #[test]
    fn test_cp1250_polish_letters() {
        let bytes = TextEncoding::Cp1250.encode("Łódź").unwrap();
        assert_eq!(bytes, vec![0xA3, 0xF3, 0x64, 0x9F]);
    }

    #[test]
    fn test_latin2_polish_letters() {
        let bytes = TextEncoding::Iso8859_2.encode("Łódź").unwrap();
        assert_eq!(bytes, vec![0xA3, 0xF3, 0x64, 0xBC]);
    }

    #[rstest]
    #[case(TextEncoding::Cp1250)]
    #[case(TextEncoding::Iso8859_2)]
    fn test_codepage_rejects_unmappable(#[case] enc: TextEncoding) {
        assert!(matches!(
            enc.encode("Kurtka €uro 漢"),
            Err(Error::UnencodableCharacter { .. })
        ));
    }

    #[test]
    fn test_ascii_strict() {
        assert_eq!(TextEncoding::Ascii.encode("Kurtka").unwrap(), b"Kurtka".to_vec());
        assert!(matches!(
            TextEncoding::Ascii.encode("Wysyłka"),
            Err(Error::NonAsciiCharacter { character: 'ł', .. })
        ));
    }

    #[test]
    fn test_mazovia_full_table() {
        let upper = TextEncoding::Mazovia.encode("ĄĆĘŁŃÓŚŹŻ").unwrap();
        assert_eq!(upper, vec![0x8F, 0x95, 0x90, 0x9C, 0xA5, 0xA0, 0x98, 0xA3, 0xA1]);

        let lower = TextEncoding::Mazovia.encode("ąćęłńóśźż").unwrap();
        assert_eq!(lower, vec![0x86, 0x8D, 0x91, 0x92, 0xA4, 0xA2, 0x9E, 0xA6, 0xA7]);
    }

    #[test]
    fn test_mazovia_replaces_unknown_with_space() {
        let bytes = TextEncoding::Mazovia.encode("a€b ü").unwrap();
        assert_eq!(bytes, b"a b  ".to_vec());
    }

    #[test]
    fn test_ascii_text_identical_everywhere() {
        for enc in [
            TextEncoding::Cp1250,
            TextEncoding::Iso8859_2,
            TextEncoding::Mazovia,
            TextEncoding::Ascii,
        ] {
            assert_eq!(enc.encode("Bluzka 42").unwrap(), b"Bluzka 42".to_vec());
        }
    }
}
