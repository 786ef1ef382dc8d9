//! Text encodings used by MDF string channels.

use alloc::string::String;

/// Encoding of a string channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextEncoding {
    /// ISO-8859-1: each byte is one character.
    Latin1,
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    /// Decode `bytes` into a string, dropping trailing NUL characters.
    ///
    /// Invalid UTF-8 or UTF-16 sequences are replaced with U+FFFD rather than
    /// failing the whole channel. A dangling odd byte at the end of UTF-16
    /// data is ignored.
    pub fn decode(self, bytes: &[u8]) -> String {
        let mut s = match self {
            TextEncoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Utf16Le => decode_utf16(bytes, u16::from_le_bytes),
            TextEncoding::Utf16Be => decode_utf16(bytes, u16::from_be_bytes),
        };
        let trimmed = s.trim_end_matches('\0').len();
        s.truncate(trimmed);
        s
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
