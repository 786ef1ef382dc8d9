//! Typed channel decoding.
//!
//! A [`ChannelDecoder`] resolves a [`RecordLayout`] once into a [`SignalKind`]
//! and then decodes any number of record blocks with it. The dispatch on
//! signal type, bit width and alignment happens once per call, never per
//! record.

use crate::array::{ChannelArray, FixedBytes, StringArray};
use crate::bitfield::{self, BitField, IntWidth, check_bounds, collect_records, normalize_endianness};
use crate::layout::{ByteOrder, LayoutSet, RecordLayout, SignalType};
use crate::text::TextEncoding;
use crate::Result;
use alloc::boxed::Box;
use alloc::vec::Vec;
use half::f16;
use num_complex::Complex;

/// How a channel's bytes are turned into values, resolved from its layout.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalKind {
    /// Unsigned integer read through the bit-field extractor.
    UnsignedBits(BitField),
    /// Signed integer read through the bit-field extractor.
    SignedBits(BitField),
    /// Whole-word integer (8, 16, 32 or 64 bits at bit offset 0).
    AlignedInt {
        byte_offset: usize,
        width: IntWidth,
        byte_order: ByteOrder,
        signed: bool,
    },
    Float16 {
        byte_offset: usize,
        byte_order: ByteOrder,
    },
    Float32 {
        byte_offset: usize,
        byte_order: ByteOrder,
    },
    Float64 {
        byte_offset: usize,
        byte_order: ByteOrder,
    },
    /// Real part at `byte_offset`, imaginary part right after it.
    Complex16 {
        byte_offset: usize,
        byte_order: ByteOrder,
    },
    Complex32 {
        byte_offset: usize,
        byte_order: ByteOrder,
    },
    Complex64 {
        byte_offset: usize,
        byte_order: ByteOrder,
    },
    /// Raw copy of `len` bytes per record.
    Bytes { byte_offset: usize, len: usize },
    /// Fixed-length string field.
    Text {
        byte_offset: usize,
        len: usize,
        encoding: TextEncoding,
    },
    /// `count` consecutive elements, each decoded by `element`.
    Array {
        byte_offset: usize,
        count: usize,
        element: Box<ChannelDecoder>,
    },
}

impl SignalKind {
    /// Resolve a layout, validating it first.
    pub fn resolve(layout: &RecordLayout) -> Result<Self> {
        layout.validate()?;
        let byte_offset = layout.byte_offset;
        let byte_order = layout.byte_order;

        if let Some(count) = layout.array_count {
            if !layout.signal_type.is_numeric() {
                return Ok(SignalKind::Bytes {
                    byte_offset,
                    len: layout.field_span(),
                });
            }
            let element_layout = RecordLayout {
                byte_offset: 0,
                record_stride: layout.element_len(),
                array_count: None,
                ..layout.clone()
            };
            return Ok(SignalKind::Array {
                byte_offset,
                count,
                element: Box::new(ChannelDecoder::new(&element_layout)?),
            });
        }

        let kind = match layout.signal_type {
            SignalType::UnsignedInt | SignalType::SignedInt => {
                let signed = layout.signal_type == SignalType::SignedInt;
                if layout.bit_offset == 0 && matches!(layout.bit_count, 8 | 16 | 32 | 64) {
                    SignalKind::AlignedInt {
                        byte_offset,
                        width: IntWidth::for_bits(layout.bit_count),
                        byte_order,
                        signed,
                    }
                } else if signed {
                    SignalKind::SignedBits(BitField::from_layout(layout)?)
                } else {
                    SignalKind::UnsignedBits(BitField::from_layout(layout)?)
                }
            }
            SignalType::Float16 => SignalKind::Float16 {
                byte_offset,
                byte_order,
            },
            SignalType::Float32 => SignalKind::Float32 {
                byte_offset,
                byte_order,
            },
            SignalType::Float64 => SignalKind::Float64 {
                byte_offset,
                byte_order,
            },
            SignalType::Complex16 => SignalKind::Complex16 {
                byte_offset,
                byte_order,
            },
            SignalType::Complex32 => SignalKind::Complex32 {
                byte_offset,
                byte_order,
            },
            SignalType::Complex64 => SignalKind::Complex64 {
                byte_offset,
                byte_order,
            },
            SignalType::Latin1String
            | SignalType::Utf8String
            | SignalType::Utf16LeString
            | SignalType::Utf16BeString => SignalKind::Text {
                byte_offset,
                len: layout.field_span(),
                encoding: layout
                    .signal_type
                    .text_encoding()
                    .unwrap_or(TextEncoding::Latin1),
            },
            SignalType::ByteString | SignalType::ByteArray | SignalType::Unknown(_) => {
                SignalKind::Bytes {
                    byte_offset,
                    len: layout.field_span(),
                }
            }
        };
        Ok(kind)
    }

    /// First byte and byte length of the field inside a record.
    fn extent(&self) -> (usize, usize) {
        match self {
            SignalKind::UnsignedBits(field) | SignalKind::SignedBits(field) => {
                (field.byte_offset, field.span())
            }
            SignalKind::AlignedInt {
                byte_offset, width, ..
            } => (*byte_offset, width.bits() as usize / 8),
            SignalKind::Float16 { byte_offset, .. } => (*byte_offset, 2),
            SignalKind::Float32 { byte_offset, .. } | SignalKind::Complex16 { byte_offset, .. } => {
                (*byte_offset, 4)
            }
            SignalKind::Float64 { byte_offset, .. } | SignalKind::Complex32 { byte_offset, .. } => {
                (*byte_offset, 8)
            }
            SignalKind::Complex64 { byte_offset, .. } => (*byte_offset, 16),
            SignalKind::Bytes { byte_offset, len } | SignalKind::Text { byte_offset, len, .. } => {
                (*byte_offset, *len)
            }
            SignalKind::Array {
                byte_offset,
                count,
                element,
            } => (*byte_offset, count * element.record_stride),
        }
    }
}

#[inline]
fn read_f16(bytes: &[u8], order: ByteOrder) -> f16 {
    f16::from_ne_bytes(normalize_endianness::<2>(bytes, order))
}

#[inline]
fn read_f32(bytes: &[u8], order: ByteOrder) -> f32 {
    f32::from_ne_bytes(normalize_endianness::<4>(bytes, order))
}

#[inline]
fn read_f64(bytes: &[u8], order: ByteOrder) -> f64 {
    f64::from_ne_bytes(normalize_endianness::<8>(bytes, order))
}

/// Decoder for one channel, reusable across record blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDecoder {
    kind: SignalKind,
    record_stride: usize,
}

impl ChannelDecoder {
    /// Validate `layout` and resolve its signal kind.
    pub fn new(layout: &RecordLayout) -> Result<Self> {
        Ok(Self {
            kind: SignalKind::resolve(layout)?,
            record_stride: layout.record_stride,
        })
    }

    #[inline]
    pub fn kind(&self) -> &SignalKind {
        &self.kind
    }

    #[inline]
    pub fn record_stride(&self) -> usize {
        self.record_stride
    }

    /// Decode `record_count` records from `buffer`.
    ///
    /// The buffer must hold at least `(record_count - 1) * record_stride`
    /// bytes plus the end of the field; bytes after the field in each record
    /// are never read.
    ///
    /// # Errors
    /// [`Error::InvalidLayout`](crate::Error::InvalidLayout) when the buffer
    /// is too short. No partial result is returned.
    pub fn decode(&self, buffer: &[u8], record_count: usize) -> Result<ChannelArray> {
        let stride = self.record_stride;
        let (offset, span) = self.kind.extent();
        check_bounds(buffer, stride, record_count, offset, span)?;

        macro_rules! collect {
            ($variant:ident, $read:expr) => {
                ChannelArray::$variant(collect_records(buffer, stride, record_count, $read))
            };
        }

        let array = match &self.kind {
            SignalKind::UnsignedBits(field) => {
                bitfield::extract(buffer, stride, record_count, field, false)?
            }
            SignalKind::SignedBits(field) => {
                bitfield::extract(buffer, stride, record_count, field, true)?
            }
            &SignalKind::AlignedInt {
                byte_offset: o,
                width,
                byte_order: bo,
                signed,
            } => match (signed, width) {
                (false, IntWidth::W8) => collect!(UInt8, |r| r[o]),
                (true, IntWidth::W8) => collect!(Int8, |r| r[o] as i8),
                (false, IntWidth::W16) => {
                    collect!(UInt16, |r| u16::from_ne_bytes(normalize_endianness(&r[o..], bo)))
                }
                (true, IntWidth::W16) => {
                    collect!(Int16, |r| i16::from_ne_bytes(normalize_endianness(&r[o..], bo)))
                }
                (false, IntWidth::W32) => {
                    collect!(UInt32, |r| u32::from_ne_bytes(normalize_endianness(&r[o..], bo)))
                }
                (true, IntWidth::W32) => {
                    collect!(Int32, |r| i32::from_ne_bytes(normalize_endianness(&r[o..], bo)))
                }
                (false, IntWidth::W64) => {
                    collect!(UInt64, |r| u64::from_ne_bytes(normalize_endianness(&r[o..], bo)))
                }
                (true, IntWidth::W64) => {
                    collect!(Int64, |r| i64::from_ne_bytes(normalize_endianness(&r[o..], bo)))
                }
            },
            &SignalKind::Float16 {
                byte_offset: o,
                byte_order: bo,
            } => collect!(Float16, |r| read_f16(&r[o..], bo)),
            &SignalKind::Float32 {
                byte_offset: o,
                byte_order: bo,
            } => collect!(Float32, |r| read_f32(&r[o..], bo)),
            &SignalKind::Float64 {
                byte_offset: o,
                byte_order: bo,
            } => collect!(Float64, |r| read_f64(&r[o..], bo)),
            &SignalKind::Complex16 {
                byte_offset: o,
                byte_order: bo,
            } => collect!(Complex16, |r| Complex::new(
                read_f16(&r[o..], bo),
                read_f16(&r[o + 2..], bo)
            )),
            &SignalKind::Complex32 {
                byte_offset: o,
                byte_order: bo,
            } => collect!(Complex32, |r| Complex::new(
                read_f32(&r[o..], bo),
                read_f32(&r[o + 4..], bo)
            )),
            &SignalKind::Complex64 {
                byte_offset: o,
                byte_order: bo,
            } => collect!(Complex64, |r| Complex::new(
                read_f64(&r[o..], bo),
                read_f64(&r[o + 8..], bo)
            )),
            &SignalKind::Bytes { byte_offset, len } => {
                let mut out = FixedBytes::with_capacity(len, record_count);
                for i in 0..record_count {
                    let start = i * stride + byte_offset;
                    out.push(&buffer[start..start + len]);
                }
                ChannelArray::Bytes(out)
            }
            &SignalKind::Text {
                byte_offset,
                len,
                encoding,
            } => {
                let values = collect_records(buffer, stride, record_count, |r| {
                    encoding.decode(&r[byte_offset..byte_offset + len])
                });
                ChannelArray::Text(StringArray::from_unpadded(values))
            }
            SignalKind::Array {
                byte_offset,
                count,
                element,
            } => {
                let element_len = element.record_stride;
                let len = count * element_len;
                let mut flat = Vec::with_capacity(len * record_count);
                for i in 0..record_count {
                    let start = i * stride + byte_offset;
                    flat.extend_from_slice(&buffer[start..start + len]);
                }
                let values = element.decode(&flat, record_count * count)?;
                ChannelArray::Array {
                    count: *count,
                    values: Box::new(values),
                }
            }
        };
        Ok(array)
    }
}

/// Decode one channel from `record_count` records of `buffer`.
///
/// Shorthand for [`ChannelDecoder::new`] followed by
/// [`ChannelDecoder::decode`]; keep a `ChannelDecoder` around when the same
/// channel is decoded block after block.
///
/// # Example
///
/// ```
/// use mdf_records::{ChannelArray, RecordLayout, SignalType, decode_channel};
///
/// // Two 2-byte records, a signed 12-bit field in each.
/// let buffer = [0xFF, 0x0F, 0x01, 0x00];
/// let layout = RecordLayout::new(SignalType::SignedInt, 12, 2);
/// let values = decode_channel(&buffer, &layout, 2)?;
/// assert_eq!(values, ChannelArray::Int16(vec![-1, 1]));
/// # Ok::<(), mdf_records::Error>(())
/// ```
pub fn decode_channel(
    buffer: &[u8],
    layout: &RecordLayout,
    record_count: usize,
) -> Result<ChannelArray> {
    ChannelDecoder::new(layout)?.decode(buffer, record_count)
}

/// Decode every channel of a layout set from the same buffer, one after the
/// other.
///
/// Each channel gets its own result, so a bad layout only loses that channel.
pub fn decode_channels<'a>(
    buffer: &[u8],
    layouts: &'a LayoutSet,
    record_count: usize,
) -> Vec<(&'a str, Result<ChannelArray>)> {
    layouts
        .channels
        .iter()
        .map(|c| {
            (
                c.name.as_str(),
                decode_channel(buffer, &c.layout, record_count),
            )
        })
        .collect()
}
