//! Error types for record decoding.
//!
//! This module defines the [`Error`] enum which represents every failure that
//! can occur while extracting channel values from record buffers, walking VLSD
//! blocks or splitting unsorted record streams.
//!
//! # Example
//!
//! ```
//! use mdf_records::{ByteOrder, Error, RecordLayout, SignalType, decode_channel};
//!
//! // A 4-byte field starting at byte 2 of a 4-byte record cannot be read.
//! let layout = RecordLayout::new(SignalType::UnsignedInt, 32, 4).at(2, 0);
//! match decode_channel(&[0u8; 16], &layout, 4) {
//!     Err(Error::InvalidLayout(reason)) => println!("skipping channel: {reason}"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use core::fmt;

use alloc::string::String;

/// Errors that can occur while decoding MDF records.
///
/// Decode calls are all-or-nothing per channel: an error never comes with a
/// partially filled array. The unsorted splitter is the one exception and
/// reports the channels completed before the failure next to the error.
#[derive(Debug)]
pub enum Error {
    /// The layout descriptor is malformed or does not fit the buffer.
    ///
    /// Raised when the field would read past the record stride or past the
    /// end of the buffer, when a bit width is out of range, or when a float
    /// field is not a whole, byte-aligned word.
    InvalidLayout(String),

    /// A record stream or VLSD block ended in the middle of a record.
    TruncatedStream {
        /// Offset of the record (or length prefix) that could not be completed
        offset: usize,
        /// Number of bytes that record required
        needed: usize,
        /// Number of bytes left in the stream at `offset`
        available: usize,
    },

    /// An unsorted stream contained a record id with no registered group.
    UnknownRecordId {
        /// The record id that was read
        record_id: u64,
        /// Offset of the record id in the stream
        offset: usize,
    },

    /// Record ids must be 1, 2, 4 or 8 bytes wide.
    UnsupportedRecordIdSize(u8),

    /// Two decoded arrays of different element types were joined.
    ArrayMismatch {
        /// Element type of the array being appended to
        expected: String,
        /// Element type of the array being appended
        found: String,
    },

    /// A compressed data payload could not be restored.
    DecompressionError(String),

    /// A layout set could not be serialized or deserialized.
    LayoutSerializationError(String),

    /// An I/O error occurred while reading or writing a layout file.
    ///
    /// Only available with the `std` feature.
    #[cfg(feature = "std")]
    IOError(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidLayout(reason) => write!(f, "Invalid record layout: {reason}"),
            Error::TruncatedStream {
                offset,
                needed,
                available,
            } => write!(
                f,
                "Truncated stream at offset {offset}: record needs {needed} bytes, {available} available"
            ),
            Error::UnknownRecordId { record_id, offset } => {
                write!(f, "Unknown record id {record_id} at offset {offset}")
            }
            Error::UnsupportedRecordIdSize(size) => {
                write!(f, "Unsupported record id size: {size} bytes")
            }
            Error::ArrayMismatch { expected, found } => {
                write!(f, "Cannot append {found} values to a {expected} array")
            }
            Error::DecompressionError(s) => write!(f, "Decompression error: {s}"),
            Error::LayoutSerializationError(s) => write!(f, "Layout serialization error: {s}"),
            #[cfg(feature = "std")]
            Error::IOError(e) => write!(f, "I/O error: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IOError(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IOError(err)
    }
}

/// A specialized Result type for record decoding.
///
/// This is defined as `core::result::Result<T, Error>` for convenience.
pub type Result<T> = core::result::Result<T, Error>;

/// Build an [`Error::InvalidLayout`] from format arguments.
macro_rules! invalid_layout {
    ($($arg:tt)*) => {
        $crate::error::Error::InvalidLayout(alloc::format!($($arg)*))
    };
}
pub(crate) use invalid_layout;
