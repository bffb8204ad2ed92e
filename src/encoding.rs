use crate::error::CoreError;
use std::fmt::{self, Display};
use std::str::FromStr;

/// Text encodings understood by [`Buffer`](crate::Buffer) string operations.
///
/// Encoding an unrepresentable character substitutes `?`; decoding a
/// malformed byte sequence substitutes U+FFFD. Neither direction fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Ascii,
    Latin1,
    Utf16Be,
    Utf16Le,
}

impl Encoding {
    /// Resolve an encoding from its name.
    ///
    /// Matching is case-insensitive and accepts the common aliases
    /// ("utf8", "ascii", "latin1", ...). Unknown names fail with
    /// [`CoreError::UnsupportedEncoding`].
    pub fn for_name(name: &str) -> Result<Self, CoreError> {
        match name.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "us-ascii" | "ascii" => Ok(Self::Ascii),
            "iso-8859-1" | "latin1" | "latin-1" => Ok(Self::Latin1),
            "utf-16be" | "utf16be" | "utf-16" | "utf16" => Ok(Self::Utf16Be),
            "utf-16le" | "utf16le" => Ok(Self::Utf16Le),
            _ => Err(CoreError::UnsupportedEncoding(name.to_string())),
        }
    }

    /// Canonical name of this encoding.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Ascii => "US-ASCII",
            Self::Latin1 => "ISO-8859-1",
            Self::Utf16Be => "UTF-16BE",
            Self::Utf16Le => "UTF-16LE",
        }
    }

    /// Encode `s` into bytes, substituting `?` for characters the
    /// encoding cannot represent.
    pub fn encode(&self, s: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => s.as_bytes().to_vec(),
            Self::Ascii => s
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
            Self::Latin1 => s
                .chars()
                .map(|c| if (c as u32) <= 0xFF { c as u8 } else { b'?' })
                .collect(),
            Self::Utf16Be => s
                .encode_utf16()
                .flat_map(|u| u.to_be_bytes())
                .collect(),
            Self::Utf16Le => s
                .encode_utf16()
                .flat_map(|u| u.to_le_bytes())
                .collect(),
        }
    }

    /// Decode `bytes` into text, substituting U+FFFD for malformed input.
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '\u{FFFD}' })
                .collect(),
            Self::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            Self::Utf16Be => decode_utf16_with(bytes, u16::from_be_bytes),
            Self::Utf16Le => decode_utf16_with(bytes, u16::from_le_bytes),
        }
    }
}

fn decode_utf16_with(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let mut units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    // An odd trailing byte cannot form a code unit.
    if bytes.len() % 2 != 0 {
        units.push(0xFFFD);
    }
    String::from_utf16_lossy(&units)
}

impl FromStr for Encoding {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::for_name(s)
    }
}

impl Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_resolution() {
        assert_eq!(Encoding::for_name("UTF-8").unwrap(), Encoding::Utf8);
        assert_eq!(Encoding::for_name("utf8").unwrap(), Encoding::Utf8);
        assert_eq!(Encoding::for_name("US-ASCII").unwrap(), Encoding::Ascii);
        assert_eq!(Encoding::for_name("latin1").unwrap(), Encoding::Latin1);
        assert_eq!(Encoding::for_name("UTF-16").unwrap(), Encoding::Utf16Be);
        assert_eq!(Encoding::for_name("utf-16le").unwrap(), Encoding::Utf16Le);
        assert_eq!(
            Encoding::for_name("EBCDIC"),
            Err(CoreError::UnsupportedEncoding("EBCDIC".to_string()))
        );
        assert_eq!("iso-8859-1".parse::<Encoding>().unwrap(), Encoding::Latin1);
    }

    #[test]
    fn utf8_round_trip() {
        let s = "héllo wörld \u{1F600}";
        assert_eq!(Encoding::Utf8.decode(&Encoding::Utf8.encode(s)), s);
    }

    #[test]
    fn utf16_round_trip() {
        let s = "héllo \u{1F600}";
        assert_eq!(Encoding::Utf16Be.decode(&Encoding::Utf16Be.encode(s)), s);
        assert_eq!(Encoding::Utf16Le.decode(&Encoding::Utf16Le.encode(s)), s);
    }

    #[test]
    fn latin1_round_trip() {
        let s = "caf\u{E9}";
        assert_eq!(Encoding::Latin1.decode(&Encoding::Latin1.encode(s)), s);
    }

    #[test]
    fn encode_replacement() {
        assert_eq!(Encoding::Ascii.encode("a\u{E9}b"), b"a?b");
        assert_eq!(Encoding::Latin1.encode("a\u{4E2D}b"), b"a?b");
    }

    #[test]
    fn decode_replacement() {
        assert_eq!(Encoding::Ascii.decode(&[b'a', 0xFF]), "a\u{FFFD}");
        assert_eq!(Encoding::Utf8.decode(&[0xC3]), "\u{FFFD}");
        // Odd trailing byte in UTF-16 input.
        assert_eq!(Encoding::Utf16Be.decode(&[0x00, 0x41, 0x00]), "A\u{FFFD}");
    }
}
