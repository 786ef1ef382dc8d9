//! Bit-field extraction.
//!
//! Pulls an N-bit integer, possibly not aligned to a byte boundary, out of
//! every record of a fixed-stride buffer. For each record the covered bytes
//! are assembled per the source byte order, shifted right by the bit offset,
//! masked to the bit count and, for signed fields, sign extended.
//!
//! Bit offsets count from the least significant bit of the first byte the
//! field occupies, as in MDF channel blocks.

use crate::array::ChannelArray;
use crate::error::{Result, invalid_layout};
use crate::layout::{ByteOrder, RecordLayout};
use alloc::vec::Vec;

/// Machine integer width used to hold a field of a given bit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    /// Smallest width holding `bit_count` bits (1..=64).
    pub fn for_bits(bit_count: u32) -> Self {
        match bit_count {
            0..=8 => IntWidth::W8,
            9..=16 => IntWidth::W16,
            17..=32 => IntWidth::W32,
            _ => IntWidth::W64,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            IntWidth::W8 => 8,
            IntWidth::W16 => 16,
            IntWidth::W32 => 32,
            IntWidth::W64 => 64,
        }
    }
}

/// Position and width of an integer field inside a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    pub byte_offset: usize,
    pub bit_offset: u8,
    pub bit_count: u32,
    pub byte_order: ByteOrder,
}

impl BitField {
    /// Create a field, rejecting widths the extractor cannot handle.
    pub fn new(
        byte_offset: usize,
        bit_offset: u8,
        bit_count: u32,
        byte_order: ByteOrder,
    ) -> Result<Self> {
        if bit_count == 0 || bit_count > 64 {
            return Err(invalid_layout!(
                "bit count {} is outside 1..=64 for a scalar field",
                bit_count
            ));
        }
        if bit_offset > 7 {
            return Err(invalid_layout!("bit offset {} is outside 0..=7", bit_offset));
        }
        Ok(Self {
            byte_offset,
            bit_offset,
            bit_count,
            byte_order,
        })
    }

    /// The scalar field described by a layout.
    pub fn from_layout(layout: &RecordLayout) -> Result<Self> {
        Self::new(
            layout.byte_offset,
            layout.bit_offset,
            layout.bit_count,
            layout.byte_order,
        )
    }

    /// Number of bytes covering `[bit_offset, bit_offset + bit_count)`.
    #[inline]
    pub fn span(&self) -> usize {
        (self.bit_offset as usize + self.bit_count as usize).div_ceil(8)
    }

    #[inline]
    fn mask(&self) -> u64 {
        // 1 << 64 overflows, a full-width field keeps every bit
        if self.bit_count >= 64 {
            u64::MAX
        } else {
            (1u64 << self.bit_count) - 1
        }
    }

    /// Read the field from one record as an unsigned value.
    ///
    /// # Panics
    /// Panics if the record is shorter than `byte_offset + span()`. The
    /// array extraction functions check bounds once before looping.
    #[inline]
    pub fn read_unsigned(&self, record: &[u8]) -> u64 {
        let bytes = &record[self.byte_offset..self.byte_offset + self.span()];
        let raw = assemble(bytes, self.byte_order);
        ((raw >> self.bit_offset) as u64) & self.mask()
    }

    /// Read the field from one record as a sign-extended value.
    #[inline]
    pub fn read_signed(&self, record: &[u8]) -> i64 {
        sign_extend(self.read_unsigned(record), self.bit_count)
    }
}

/// Interpret `bytes` as one integer stored in `order`.
///
/// Up to 9 bytes are accepted, which covers a 64-bit field starting at bit
/// offset 7.
#[inline]
pub fn assemble(bytes: &[u8], order: ByteOrder) -> u128 {
    match order {
        ByteOrder::Little => bytes
            .iter()
            .rev()
            .fold(0u128, |acc, &b| (acc << 8) | b as u128),
        ByteOrder::Big => bytes.iter().fold(0u128, |acc, &b| (acc << 8) | b as u128),
    }
}

/// Copy an N-byte word and swap it into host order when `order` differs.
///
/// Swapping twice returns the original bytes. Callers pass at least `N`
/// bytes, which `check_bounds` guarantees for every record.
#[inline]
pub(crate) fn normalize_endianness<const N: usize>(bytes: &[u8], order: ByteOrder) -> [u8; N] {
    let mut word = [0u8; N];
    word.copy_from_slice(&bytes[..N]);
    if !order.is_native() {
        word.reverse();
    }
    word
}

/// Propagate bit `bit_count - 1` into the high bits of a 64-bit value.
///
/// A zero-width field carries no bits and extends to 0.
#[inline]
pub fn sign_extend(value: u64, bit_count: u32) -> i64 {
    if bit_count == 0 {
        return 0;
    }
    if bit_count >= 64 {
        return value as i64;
    }
    if value & (1u64 << (bit_count - 1)) != 0 {
        (value | (u64::MAX << bit_count)) as i64
    } else {
        value as i64
    }
}

/// Check that `span` bytes at `offset` fit in one record and that the last
/// of `record_count` records is inside the buffer.
pub(crate) fn check_bounds(
    buffer: &[u8],
    record_stride: usize,
    record_count: usize,
    offset: usize,
    span: usize,
) -> Result<()> {
    let field_end = offset
        .checked_add(span)
        .ok_or_else(|| invalid_layout!("field end overflows"))?;
    if field_end > record_stride {
        return Err(invalid_layout!(
            "field ends at byte {} but records are only {} bytes long",
            field_end,
            record_stride
        ));
    }
    if record_count == 0 {
        return Ok(());
    }
    let last_end = (record_count - 1)
        .checked_mul(record_stride)
        .and_then(|start| start.checked_add(field_end))
        .ok_or_else(|| invalid_layout!("record count {} overflows", record_count))?;
    if last_end > buffer.len() {
        return Err(invalid_layout!(
            "{} records of {} bytes need {} bytes, buffer holds {}",
            record_count,
            record_stride,
            last_end,
            buffer.len()
        ));
    }
    Ok(())
}

/// Collect one value per record, starting each record at `i * record_stride`.
#[inline]
pub(crate) fn collect_records<T, F>(
    buffer: &[u8],
    record_stride: usize,
    record_count: usize,
    read: F,
) -> Vec<T>
where
    F: Fn(&[u8]) -> T,
{
    (0..record_count)
        .map(|i| read(&buffer[i * record_stride..]))
        .collect()
}

/// Extract a bit field from `record_count` records.
///
/// The result holds the smallest machine integer able to store `bit_count`
/// bits: `u8`/`i8` up to 8 bits, then 16, 32 and 64 bits. A `record_count`
/// of zero returns an empty array without looking at the buffer.
///
/// # Errors
/// [`Error::InvalidLayout`](crate::Error::InvalidLayout) when the field does
/// not fit in the record stride or the buffer is too short for
/// `record_count` records.
pub fn extract(
    buffer: &[u8],
    record_stride: usize,
    record_count: usize,
    field: &BitField,
    signed: bool,
) -> Result<ChannelArray> {
    check_bounds(buffer, record_stride, record_count, field.byte_offset, field.span())?;

    let f = *field;
    macro_rules! collect_as {
        ($variant:ident, $read:ident, $ty:ty) => {
            ChannelArray::$variant(collect_records(buffer, record_stride, record_count, |r| {
                f.$read(r) as $ty
            }))
        };
    }
    let array = match (signed, IntWidth::for_bits(field.bit_count)) {
        (false, IntWidth::W8) => collect_as!(UInt8, read_unsigned, u8),
        (false, IntWidth::W16) => collect_as!(UInt16, read_unsigned, u16),
        (false, IntWidth::W32) => collect_as!(UInt32, read_unsigned, u32),
        (false, IntWidth::W64) => collect_as!(UInt64, read_unsigned, u64),
        (true, IntWidth::W8) => collect_as!(Int8, read_signed, i8),
        (true, IntWidth::W16) => collect_as!(Int16, read_signed, i16),
        (true, IntWidth::W32) => collect_as!(Int32, read_signed, i32),
        (true, IntWidth::W64) => collect_as!(Int64, read_signed, i64),
    };
    Ok(array)
}
