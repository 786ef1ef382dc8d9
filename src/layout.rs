//! Channel layout descriptors.
//!
//! A [`RecordLayout`] tells the decoder where one channel's value sits inside a
//! fixed-size record and how its bits are to be read. Layouts are produced by
//! whatever parses the MDF block structure (channel blocks, channel group
//! blocks) and are only borrowed here.
//!
//! This module provides:
//! - [`ByteOrder`]: byte order of the stored value
//! - [`SignalType`]: what kind of value the bits encode, with the MDF 3 and
//!   MDF 4 data type code tables
//! - [`RecordLayout`]: the per-channel descriptor and its invariants
//! - [`LayoutSet`]: a named list of layouts that can be stored as JSON

use crate::error::{Result, invalid_layout};
use crate::text::TextEncoding;
use alloc::string::String;
use alloc::vec::Vec;

/// Byte order of a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ByteOrder {
    /// Least significant byte first (Intel).
    #[default]
    Little,
    /// Most significant byte first (Motorola).
    Big,
}

impl ByteOrder {
    /// Byte order of the machine running the decoder.
    #[inline]
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }

    /// Returns true when values in this order can be used without a swap.
    #[inline]
    pub fn is_native(self) -> bool {
        self == Self::native()
    }
}

/// Signal type of a channel value.
///
/// Floating point and complex types carry their width in the variant; the
/// layout's `bit_count` has to agree with it. Complex variants are named after
/// the width of one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignalType {
    UnsignedInt,
    SignedInt,
    Float16,
    Float32,
    Float64,
    Complex16,
    Complex32,
    Complex64,
    /// Fixed-length byte string copied without text decoding.
    ByteString,
    /// ISO-8859-1 string, one byte per character.
    Latin1String,
    Utf8String,
    Utf16LeString,
    Utf16BeString,
    ByteArray,
    /// Type code the decoder does not know; decoded as raw bytes.
    Unknown(u8),
}

impl SignalType {
    /// Map an MDF 4 `cn_data_type` code to a signal type and byte order.
    ///
    /// Floating point and complex codes are resolved to a width using
    /// `bit_count`. MIME samples/streams and CANopen date/time values have no
    /// numeric meaning for the decoder and are treated as byte arrays.
    pub fn from_mdf4(data_type: u8, bit_count: u32) -> (Self, ByteOrder) {
        let float = |order| match bit_count {
            16 => (SignalType::Float16, order),
            32 => (SignalType::Float32, order),
            64 => (SignalType::Float64, order),
            _ => (SignalType::Unknown(data_type), order),
        };
        let complex = |order| match bit_count {
            32 => (SignalType::Complex16, order),
            64 => (SignalType::Complex32, order),
            128 => (SignalType::Complex64, order),
            _ => (SignalType::Unknown(data_type), order),
        };
        match data_type {
            0 => (SignalType::UnsignedInt, ByteOrder::Little),
            1 => (SignalType::UnsignedInt, ByteOrder::Big),
            2 => (SignalType::SignedInt, ByteOrder::Little),
            3 => (SignalType::SignedInt, ByteOrder::Big),
            4 => float(ByteOrder::Little),
            5 => float(ByteOrder::Big),
            6 => (SignalType::Latin1String, ByteOrder::Little),
            7 => (SignalType::Utf8String, ByteOrder::Little),
            8 => (SignalType::Utf16LeString, ByteOrder::Little),
            9 => (SignalType::Utf16BeString, ByteOrder::Big),
            10..=14 => (SignalType::ByteArray, ByteOrder::Little),
            15 => complex(ByteOrder::Little),
            16 => complex(ByteOrder::Big),
            other => (SignalType::Unknown(other), ByteOrder::Little),
        }
    }

    /// Map an MDF 3 signal data type code to a signal type and byte order.
    ///
    /// Codes 0 to 3 use the file's default byte order (`default_order`, taken
    /// from the identification block); codes 9 to 16 carry an explicit order.
    pub fn from_mdf3(data_type: u16, bit_count: u32, default_order: ByteOrder) -> (Self, ByteOrder) {
        let float = |order| match bit_count {
            32 => (SignalType::Float32, order),
            64 => (SignalType::Float64, order),
            _ => (SignalType::Unknown(data_type as u8), order),
        };
        match data_type {
            0 => (SignalType::UnsignedInt, default_order),
            1 => (SignalType::SignedInt, default_order),
            2 | 3 => float(default_order),
            7 => (SignalType::Latin1String, ByteOrder::Little),
            8 => (SignalType::ByteArray, ByteOrder::Little),
            9 => (SignalType::UnsignedInt, ByteOrder::Big),
            10 => (SignalType::SignedInt, ByteOrder::Big),
            11 | 12 => float(ByteOrder::Big),
            13 => (SignalType::UnsignedInt, ByteOrder::Little),
            14 => (SignalType::SignedInt, ByteOrder::Little),
            15 | 16 => float(ByteOrder::Little),
            other => (SignalType::Unknown(other.min(u8::MAX as u16) as u8), default_order),
        }
    }

    /// Returns true for the integer types handled by the bit-field extractor.
    #[inline]
    pub fn is_integer(&self) -> bool {
        matches!(self, SignalType::UnsignedInt | SignalType::SignedInt)
    }

    /// Returns true for IEEE floating point types.
    #[inline]
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            SignalType::Float16 | SignalType::Float32 | SignalType::Float64
        )
    }

    /// Returns true for complex types.
    #[inline]
    pub fn is_complex(&self) -> bool {
        matches!(
            self,
            SignalType::Complex16 | SignalType::Complex32 | SignalType::Complex64
        )
    }

    /// Returns true for integer, float and complex types.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float() || self.is_complex()
    }

    /// Text encoding of string types, `None` for everything else.
    pub fn text_encoding(&self) -> Option<TextEncoding> {
        match self {
            SignalType::Latin1String => Some(TextEncoding::Latin1),
            SignalType::Utf8String => Some(TextEncoding::Utf8),
            SignalType::Utf16LeString => Some(TextEncoding::Utf16Le),
            SignalType::Utf16BeString => Some(TextEncoding::Utf16Be),
            _ => None,
        }
    }

    /// Bit width a float or complex value must have, `None` for other types.
    pub fn fixed_bits(&self) -> Option<u32> {
        match self {
            SignalType::Float16 => Some(16),
            SignalType::Float32 => Some(32),
            SignalType::Float64 => Some(64),
            SignalType::Complex16 => Some(32),
            SignalType::Complex32 => Some(64),
            SignalType::Complex64 => Some(128),
            _ => None,
        }
    }
}

impl core::fmt::Display for SignalType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SignalType::UnsignedInt => write!(f, "uint"),
            SignalType::SignedInt => write!(f, "int"),
            SignalType::Float16 => write!(f, "float16"),
            SignalType::Float32 => write!(f, "float32"),
            SignalType::Float64 => write!(f, "float64"),
            SignalType::Complex16 => write!(f, "complex (2x float16)"),
            SignalType::Complex32 => write!(f, "complex (2x float32)"),
            SignalType::Complex64 => write!(f, "complex (2x float64)"),
            SignalType::ByteString => write!(f, "byte string"),
            SignalType::Latin1String => write!(f, "string (ISO-8859-1)"),
            SignalType::Utf8String => write!(f, "string (UTF-8)"),
            SignalType::Utf16LeString => write!(f, "string (UTF-16 LE)"),
            SignalType::Utf16BeString => write!(f, "string (UTF-16 BE)"),
            SignalType::ByteArray => write!(f, "byte array"),
            SignalType::Unknown(code) => write!(f, "unknown ({code})"),
        }
    }
}

/// Where one channel's value sits inside a fixed-size record.
///
/// Blob and string fields give their length in bits (`8 * bytes`), the same
/// way MDF 4 channel blocks do. For arrays, `bit_count` is the width of one
/// element and the elements follow each other with a whole-byte stride.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordLayout {
    pub signal_type: SignalType,
    /// Field width in bits.
    pub bit_count: u32,
    /// First byte of the field within one record.
    pub byte_offset: usize,
    /// Bit position (0..=7, LSB first) of the field within its first byte.
    pub bit_offset: u8,
    /// Bytes per record.
    pub record_stride: usize,
    pub byte_order: ByteOrder,
    /// Number of elements when the channel is a fixed-size array.
    #[cfg_attr(feature = "serde", serde(default))]
    pub array_count: Option<usize>,
}

impl RecordLayout {
    /// Create a layout for a field at the start of each record, little endian.
    pub fn new(signal_type: SignalType, bit_count: u32, record_stride: usize) -> Self {
        Self {
            signal_type,
            bit_count,
            byte_offset: 0,
            bit_offset: 0,
            record_stride,
            byte_order: ByteOrder::Little,
            array_count: None,
        }
    }

    /// Build a layout from the raw fields of an MDF 4 channel block.
    ///
    /// `record_stride` is the full record length seen by the decoder, and
    /// `byte_offset` must already include any record id prefix.
    pub fn from_mdf4_channel(
        data_type: u8,
        bit_count: u32,
        byte_offset: usize,
        bit_offset: u8,
        record_stride: usize,
    ) -> Self {
        let (signal_type, byte_order) = SignalType::from_mdf4(data_type, bit_count);
        Self {
            signal_type,
            bit_count,
            byte_offset,
            bit_offset,
            record_stride,
            byte_order,
            array_count: None,
        }
    }

    /// Place the field at `byte_offset`, `bit_offset` within each record.
    pub fn at(mut self, byte_offset: usize, bit_offset: u8) -> Self {
        self.byte_offset = byte_offset;
        self.bit_offset = bit_offset;
        self
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Turn the layout into a fixed-size array of `count` elements.
    pub fn with_array_count(mut self, count: usize) -> Self {
        self.array_count = Some(count);
        self
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        self.array_count.is_some()
    }

    /// Bytes occupied by one array element (or by the whole scalar field).
    #[inline]
    pub fn element_len(&self) -> usize {
        (self.bit_count as usize).div_ceil(8)
    }

    /// Number of bytes the field covers in each record, counted from
    /// `byte_offset`.
    pub fn field_span(&self) -> usize {
        match self.array_count {
            Some(count) => count.saturating_mul(self.element_len()),
            None => (self.bit_offset as usize + self.bit_count as usize).div_ceil(8),
        }
    }

    /// Check the descriptor's invariants.
    ///
    /// The field must fit in the record
    /// (`byte_offset + ceil((bit_offset + bit_count) / 8) <= record_stride`),
    /// bit widths must be in range for the signal type, and floats, complex
    /// values and arrays must start on a byte boundary.
    pub fn validate(&self) -> Result<()> {
        if self.record_stride == 0 {
            return Err(invalid_layout!("record stride must not be zero"));
        }
        if self.bit_count == 0 {
            return Err(invalid_layout!("bit count must not be zero"));
        }
        if self.bit_offset > 7 {
            return Err(invalid_layout!(
                "bit offset {} is outside 0..=7",
                self.bit_offset
            ));
        }
        if self.signal_type.is_integer() && self.bit_count > 64 {
            return Err(invalid_layout!(
                "{}-bit integer fields are not supported, maximum is 64",
                self.bit_count
            ));
        }
        if let Some(bits) = self.signal_type.fixed_bits() {
            if self.bit_count != bits || self.bit_offset != 0 {
                return Err(invalid_layout!(
                    "{} field must be {} bits at bit offset 0, found {} bits at bit offset {}",
                    self.signal_type,
                    bits,
                    self.bit_count,
                    self.bit_offset
                ));
            }
        }
        if let Some(count) = self.array_count {
            if count == 0 {
                return Err(invalid_layout!("array count must not be zero"));
            }
            if self.bit_offset != 0 {
                return Err(invalid_layout!("array elements must start on a byte boundary"));
            }
        }

        let end = self
            .byte_offset
            .checked_add(self.field_span())
            .ok_or_else(|| invalid_layout!("field end overflows"))?;
        if end > self.record_stride {
            return Err(invalid_layout!(
                "field ends at byte {} but records are only {} bytes long",
                end,
                self.record_stride
            ));
        }
        Ok(())
    }
}

/// A channel name paired with its layout.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NamedLayout {
    pub name: String,
    pub layout: RecordLayout,
}

/// An ordered set of channel layouts for one record format.
///
/// With the `serde_json` feature a set can be written to and read from JSON,
/// so that layouts resolved once from a file's metadata can be reused without
/// parsing the metadata again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutSet {
    pub channels: Vec<NamedLayout>,
}

impl LayoutSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a channel, keeping declaration order.
    pub fn push(&mut self, name: impl Into<String>, layout: RecordLayout) {
        self.channels.push(NamedLayout {
            name: name.into(),
            layout,
        });
    }

    /// Find a channel layout by name.
    pub fn get(&self, name: &str) -> Option<&RecordLayout> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.layout)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Validate every layout in the set.
    pub fn validate(&self) -> Result<()> {
        for channel in &self.channels {
            channel.layout.validate().map_err(|e| match e {
                crate::Error::InvalidLayout(reason) => {
                    invalid_layout!("channel {:?}: {}", channel.name, reason)
                }
                other => other,
            })?;
        }
        Ok(())
    }

    /// Parse a layout set from a JSON string.
    ///
    /// Requires the `serde` and `serde_json` features.
    #[cfg(all(feature = "serde", feature = "serde_json"))]
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            crate::Error::LayoutSerializationError(alloc::format!(
                "JSON deserialization failed: {}",
                e
            ))
        })
    }

    /// Serialize the layout set to pretty-printed JSON.
    ///
    /// Requires the `serde` and `serde_json` features.
    #[cfg(all(feature = "serde", feature = "serde_json"))]
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            crate::Error::LayoutSerializationError(alloc::format!(
                "JSON serialization failed: {}",
                e
            ))
        })
    }

    /// Save the layout set to a JSON file.
    #[cfg(all(feature = "std", feature = "serde", feature = "serde_json"))]
    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let json = self.to_json_string()?;
        std::fs::write(path, json).map_err(crate::Error::IOError)?;
        Ok(())
    }

    /// Load a layout set from a JSON file and validate it.
    #[cfg(all(feature = "std", feature = "serde", feature = "serde_json"))]
    pub fn load_from_file(path: &str) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(crate::Error::IOError)?;
        let set = Self::from_json_str(&json)?;
        set.validate()?;
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn mdf4_codes() {
        assert_eq!(
            SignalType::from_mdf4(0, 12),
            (SignalType::UnsignedInt, ByteOrder::Little)
        );
        assert_eq!(
            SignalType::from_mdf4(3, 16),
            (SignalType::SignedInt, ByteOrder::Big)
        );
        assert_eq!(
            SignalType::from_mdf4(4, 16),
            (SignalType::Float16, ByteOrder::Little)
        );
        assert_eq!(
            SignalType::from_mdf4(5, 64),
            (SignalType::Float64, ByteOrder::Big)
        );
        assert_eq!(
            SignalType::from_mdf4(15, 64),
            (SignalType::Complex32, ByteOrder::Little)
        );
        assert_eq!(SignalType::from_mdf4(11, 800).0, SignalType::ByteArray);
        assert_eq!(SignalType::from_mdf4(4, 24).0, SignalType::Unknown(4));
        assert_eq!(SignalType::from_mdf4(42, 8).0, SignalType::Unknown(42));
    }

    #[test]
    fn mdf3_codes_follow_default_order() {
        assert_eq!(
            SignalType::from_mdf3(0, 16, ByteOrder::Big),
            (SignalType::UnsignedInt, ByteOrder::Big)
        );
        assert_eq!(
            SignalType::from_mdf3(3, 64, ByteOrder::Little),
            (SignalType::Float64, ByteOrder::Little)
        );
        assert_eq!(
            SignalType::from_mdf3(10, 8, ByteOrder::Little),
            (SignalType::SignedInt, ByteOrder::Big)
        );
        assert_eq!(
            SignalType::from_mdf3(15, 32, ByteOrder::Big),
            (SignalType::Float32, ByteOrder::Little)
        );
        assert_eq!(SignalType::from_mdf3(7, 80, ByteOrder::Little).0, SignalType::Latin1String);
    }

    #[test]
    fn validate_accepts_packed_field() {
        let layout = RecordLayout::new(SignalType::UnsignedInt, 12, 4).at(2, 4);
        assert_eq!(layout.field_span(), 2);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn validate_rejects_field_past_stride() {
        let layout = RecordLayout::new(SignalType::UnsignedInt, 12, 3).at(2, 4);
        assert!(matches!(layout.validate(), Err(Error::InvalidLayout(_))));
    }

    #[test]
    fn validate_rejects_partial_float() {
        let layout = RecordLayout::new(SignalType::Float32, 24, 8);
        assert!(matches!(layout.validate(), Err(Error::InvalidLayout(_))));
        let layout = RecordLayout::new(SignalType::Float32, 32, 8).at(0, 1);
        assert!(matches!(layout.validate(), Err(Error::InvalidLayout(_))));
    }

    #[test]
    fn validate_rejects_bad_widths() {
        assert!(RecordLayout::new(SignalType::UnsignedInt, 0, 8).validate().is_err());
        assert!(RecordLayout::new(SignalType::SignedInt, 65, 16).validate().is_err());
        assert!(RecordLayout::new(SignalType::UnsignedInt, 8, 8).at(0, 8).validate().is_err());
        assert!(RecordLayout::new(SignalType::UnsignedInt, 8, 0).validate().is_err());
    }

    #[test]
    fn array_span_uses_element_length() {
        let layout = RecordLayout::new(SignalType::UnsignedInt, 16, 10)
            .at(2, 0)
            .with_array_count(4);
        assert_eq!(layout.field_span(), 8);
        assert!(layout.validate().is_ok());
        assert!(layout.clone().at(3, 0).validate().is_err());
    }

    #[test]
    fn layout_set_lookup() {
        let mut set = LayoutSet::new();
        set.push("speed", RecordLayout::new(SignalType::UnsignedInt, 16, 4));
        set.push("rpm", RecordLayout::new(SignalType::UnsignedInt, 16, 4).at(2, 0));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("rpm").map(|l| l.byte_offset), Some(2));
        assert!(set.get("torque").is_none());
        assert!(set.validate().is_ok());
    }
}
