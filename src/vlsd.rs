//! Variable-length signal data (VLSD).
//!
//! A VLSD block stores channel values as a run of `[u32 LE length][payload]`
//! entries, back to back, with no padding. Decoding yields one element per
//! entry, padded to the longest payload so the result has a uniform width:
//! text is padded with spaces, binary data with zero bytes.

use crate::array::{ChannelArray, FixedBytes, StringArray};
use crate::layout::SignalType;
use crate::text::TextEncoding;
use crate::{Error, Result};
use alloc::string::String;
use alloc::vec::Vec;

/// Size of the length prefix in front of every VLSD payload.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Iterator over the payloads of a VLSD block.
///
/// Yields an error, then stops, when an entry runs past the end of the block.
#[derive(Debug, Clone)]
pub struct VlsdEntries<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> VlsdEntries<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Offset of the next entry's length prefix.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for VlsdEntries<'a> {
    type Item = Result<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.data.len() {
            return None;
        }
        match read_entry(self.data, self.pos) {
            Ok((payload, next)) => {
                self.pos = next;
                Some(Ok(payload))
            }
            Err(e) => {
                self.pos = self.data.len();
                Some(Err(e))
            }
        }
    }
}

/// Read one `[length][payload]` entry at `pos`, returning the payload and the
/// offset just past it.
pub(crate) fn read_entry(data: &[u8], pos: usize) -> Result<(&[u8], usize)> {
    let available = data.len().saturating_sub(pos);
    if available < LENGTH_PREFIX_SIZE {
        return Err(Error::TruncatedStream {
            offset: pos,
            needed: LENGTH_PREFIX_SIZE,
            available,
        });
    }
    let len = u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
    if len > available - LENGTH_PREFIX_SIZE {
        return Err(Error::TruncatedStream {
            offset: pos,
            needed: LENGTH_PREFIX_SIZE.saturating_add(len),
            available,
        });
    }
    let start = pos + LENGTH_PREFIX_SIZE;
    Ok((&data[start..start + len], start + len))
}

/// How VLSD payloads of a signal type are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Text(TextEncoding),
    Bytes,
}

impl PayloadKind {
    /// Pick the payload decoding for `signal_type`.
    ///
    /// Types that are not strings or byte arrays should have been stored with
    /// a fixed length; their payloads are kept as raw bytes and a warning is
    /// logged.
    pub fn for_signal_type(signal_type: SignalType) -> Self {
        if let Some(encoding) = signal_type.text_encoding() {
            return PayloadKind::Text(encoding);
        }
        match signal_type {
            SignalType::ByteString | SignalType::ByteArray => PayloadKind::Bytes,
            other => {
                log::warn!(
                    "VLSD data of type {} should have fixed length, reading payloads as raw bytes",
                    other
                );
                PayloadKind::Bytes
            }
        }
    }
}

/// Decoded VLSD values, padded to a uniform width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VlsdArray {
    Text(StringArray),
    Bytes(FixedBytes),
}

impl VlsdArray {
    pub fn len(&self) -> usize {
        match self {
            VlsdArray::Text(t) => t.len(),
            VlsdArray::Bytes(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Padding width: the longest payload in characters (text) or bytes.
    pub fn width(&self) -> usize {
        match self {
            VlsdArray::Text(t) => t.width(),
            VlsdArray::Bytes(b) => b.width(),
        }
    }

    pub fn into_channel_array(self) -> ChannelArray {
        match self {
            VlsdArray::Text(t) => ChannelArray::Text(t),
            VlsdArray::Bytes(b) => ChannelArray::Bytes(b),
        }
    }
}

impl From<VlsdArray> for ChannelArray {
    fn from(array: VlsdArray) -> Self {
        array.into_channel_array()
    }
}

/// Accumulates VLSD payloads and pads them once all have been seen.
#[derive(Debug)]
pub(crate) struct VlsdCollector<'a> {
    kind: PayloadKind,
    texts: Vec<String>,
    blobs: Vec<&'a [u8]>,
}

impl<'a> VlsdCollector<'a> {
    pub(crate) fn new(kind: PayloadKind) -> Self {
        Self {
            kind,
            texts: Vec::new(),
            blobs: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, payload: &'a [u8]) {
        match self.kind {
            PayloadKind::Text(encoding) => self.texts.push(encoding.decode(payload)),
            PayloadKind::Bytes => self.blobs.push(payload),
        }
    }

    pub(crate) fn finish(self) -> VlsdArray {
        match self.kind {
            PayloadKind::Text(_) => VlsdArray::Text(StringArray::from_unpadded(self.texts)),
            PayloadKind::Bytes => VlsdArray::Bytes(FixedBytes::from_records(self.blobs)),
        }
    }
}

/// Decode every entry of a VLSD block.
///
/// An empty block gives an empty array.
///
/// # Errors
/// [`Error::TruncatedStream`] when the last entry's length prefix or payload
/// runs past the end of the block.
///
/// # Example
///
/// ```
/// use mdf_records::{SignalType, read_vlsd_block};
///
/// let mut block = Vec::new();
/// for value in ["ab", "", "xyz"] {
///     block.extend_from_slice(&(value.len() as u32).to_le_bytes());
///     block.extend_from_slice(value.as_bytes());
/// }
/// let values = read_vlsd_block(&block, SignalType::Utf8String)?;
/// assert_eq!(values.len(), 3);
/// assert_eq!(values.width(), 3);
/// # Ok::<(), mdf_records::Error>(())
/// ```
pub fn read_vlsd_block(block: &[u8], signal_type: SignalType) -> Result<VlsdArray> {
    let mut collector = VlsdCollector::new(PayloadKind::for_signal_type(signal_type));
    for payload in VlsdEntries::new(block) {
        collector.push(payload?);
    }
    Ok(collector.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn block(entries: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in entries {
            out.extend_from_slice(&(entry.len() as u32).to_le_bytes());
            out.extend_from_slice(entry);
        }
        out
    }

    #[test]
    fn entries_walk_the_block() {
        let data = block(&[b"one", b"", b"three"]);
        let entries: Vec<&[u8]> = VlsdEntries::new(&data).map(|e| e.unwrap()).collect();
        assert_eq!(entries, vec![&b"one"[..], &b""[..], &b"three"[..]]);
    }

    #[test]
    fn truncated_payload_is_reported_once() {
        let mut data = block(&[b"ok"]);
        data.extend_from_slice(&10u32.to_le_bytes());
        data.extend_from_slice(b"short");
        let mut entries = VlsdEntries::new(&data);
        assert!(entries.next().unwrap().is_ok());
        match entries.next() {
            Some(Err(Error::TruncatedStream {
                offset,
                needed,
                available,
            })) => {
                assert_eq!(offset, 6);
                assert_eq!(needed, 14);
                assert_eq!(available, 9);
            }
            other => panic!("unexpected entry {other:?}"),
        }
        assert!(entries.next().is_none());
    }

    #[test]
    fn truncated_length_prefix() {
        let err = read_vlsd_block(&[1, 0], SignalType::ByteArray).unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedStream {
                offset: 0,
                needed: 4,
                available: 2
            }
        ));
    }

    #[test]
    fn oversized_length_prefix() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 1, 2, 3];
        match read_vlsd_block(&data, SignalType::ByteArray) {
            Err(Error::TruncatedStream {
                offset: 0,
                needed,
                available: 7,
            }) => assert_eq!(needed, 4usize.saturating_add(u32::MAX as usize)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn latin1_and_utf16_payloads() {
        let data = block(&[&[0x41, 0xDC], &[0x42]]);
        let values = read_vlsd_block(&data, SignalType::Latin1String).unwrap();
        assert_eq!(
            values,
            VlsdArray::Text(StringArray::from_unpadded(vec!["A\u{dc}".into(), "B".into()]))
        );

        let data = block(&[&[0, b'h', 0, b'i'], &[0, b'!']]);
        let values = read_vlsd_block(&data, SignalType::Utf16BeString).unwrap();
        match values {
            VlsdArray::Text(t) => {
                assert_eq!(t.get(0), Some("hi"));
                assert_eq!(t.get(1), Some("! "));
            }
            other => panic!("unexpected array {other:?}"),
        }
    }

    #[test]
    fn text_payloads_drop_trailing_nul() {
        let data = block(&[b"abc\0", b"d\0"]);
        let values = read_vlsd_block(&data, SignalType::Utf8String).unwrap();
        assert_eq!(values.width(), 3);
    }

    #[test]
    fn numeric_type_falls_back_to_bytes() {
        let data = block(&[&[1, 2, 3], &[4]]);
        let values = read_vlsd_block(&data, SignalType::Float64).unwrap();
        match values {
            VlsdArray::Bytes(b) => {
                assert_eq!(b.width(), 3);
                assert_eq!(b.as_bytes(), &[1, 2, 3, 4, 0, 0]);
            }
            other => panic!("unexpected array {other:?}"),
        }
    }

    #[test]
    fn empty_block_is_empty_array() {
        let values = read_vlsd_block(&[], SignalType::Utf8String).unwrap();
        assert!(values.is_empty());
        assert_eq!(values.width(), 0);
    }
}
