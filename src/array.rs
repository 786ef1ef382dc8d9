//! Decoded channel arrays.
//!
//! A decode call produces one [`ChannelArray`] per channel: a homogeneous,
//! owned array with one element per record. The variant (reported as an
//! [`ElementType`]) tells the conversion layer how to interpret the values.

use crate::{Error, Result};
use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use half::f16;
use num_complex::Complex;

/// Machine element type of a [`ChannelArray`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementType {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float16,
    Float32,
    Float64,
    Complex16,
    Complex32,
    Complex64,
    /// Fixed-width byte records of the given width.
    Bytes(usize),
    /// Space padded strings of the given width in characters.
    Text(usize),
    /// `count` elements of `element` per record.
    Array {
        element: Box<ElementType>,
        count: usize,
    },
}

impl ElementType {
    /// Size in bytes of one element, `None` for text.
    pub fn size_in_bytes(&self) -> Option<usize> {
        match self {
            ElementType::UInt8 | ElementType::Int8 => Some(1),
            ElementType::UInt16 | ElementType::Int16 | ElementType::Float16 => Some(2),
            ElementType::UInt32
            | ElementType::Int32
            | ElementType::Float32
            | ElementType::Complex16 => Some(4),
            ElementType::UInt64
            | ElementType::Int64
            | ElementType::Float64
            | ElementType::Complex32 => Some(8),
            ElementType::Complex64 => Some(16),
            ElementType::Bytes(width) => Some(*width),
            ElementType::Text(_) => None,
            ElementType::Array { element, count } => {
                element.size_in_bytes().map(|size| size * count)
            }
        }
    }
}

impl core::fmt::Display for ElementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ElementType::UInt8 => write!(f, "u8"),
            ElementType::UInt16 => write!(f, "u16"),
            ElementType::UInt32 => write!(f, "u32"),
            ElementType::UInt64 => write!(f, "u64"),
            ElementType::Int8 => write!(f, "i8"),
            ElementType::Int16 => write!(f, "i16"),
            ElementType::Int32 => write!(f, "i32"),
            ElementType::Int64 => write!(f, "i64"),
            ElementType::Float16 => write!(f, "f16"),
            ElementType::Float32 => write!(f, "f32"),
            ElementType::Float64 => write!(f, "f64"),
            ElementType::Complex16 => write!(f, "complex<f16>"),
            ElementType::Complex32 => write!(f, "complex<f32>"),
            ElementType::Complex64 => write!(f, "complex<f64>"),
            ElementType::Bytes(width) => write!(f, "bytes[{width}]"),
            ElementType::Text(width) => write!(f, "text[{width}]"),
            ElementType::Array { element, count } => write!(f, "[{element}; {count}]"),
        }
    }
}

/// Byte records of one uniform width, stored back to back.
///
/// Shorter records are right-padded with zero bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FixedBytes {
    width: usize,
    len: usize,
    data: Vec<u8>,
}

impl FixedBytes {
    /// Create an empty array whose records are `width` bytes wide.
    pub fn with_capacity(width: usize, capacity: usize) -> Self {
        Self {
            width,
            len: 0,
            data: Vec::with_capacity(width * capacity),
        }
    }

    /// Build an array from variable-length records, padding to the longest.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
        I::IntoIter: Clone,
    {
        let records = records.into_iter();
        let width = records.clone().map(<[u8]>::len).max().unwrap_or(0);
        let mut out = Self::with_capacity(width, records.size_hint().0);
        for record in records {
            out.push(record);
        }
        out
    }

    /// Append one record, zero padding it to the array width.
    ///
    /// Records longer than the width are cut to the width; callers that
    /// collect variable-length data use [`FixedBytes::from_records`].
    pub fn push(&mut self, record: &[u8]) {
        let take = record.len().min(self.width);
        self.data.extend_from_slice(&record[..take]);
        self.data.resize(self.data.len() + self.width - take, 0);
        self.len += 1;
    }

    /// Record width in bytes.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Option<&[u8]> {
        if index >= self.len {
            return None;
        }
        let start = index * self.width;
        Some(&self.data[start..start + self.width])
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.len).map(move |i| &self.data[i * self.width..(i + 1) * self.width])
    }

    /// All records as one contiguous slice.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Re-pad every record to a larger width.
    fn widen(&mut self, width: usize) {
        if width <= self.width {
            return;
        }
        let mut data = Vec::with_capacity(width * self.len);
        for record in self.iter() {
            data.extend_from_slice(record);
            data.resize(data.len() + width - self.width, 0);
        }
        self.data = data;
        self.width = width;
    }

    /// Append all records of `other`, widening whichever side is narrower.
    pub fn append(&mut self, mut other: FixedBytes) {
        if other.width < self.width {
            other.widen(self.width);
        } else {
            self.widen(other.width);
        }
        self.data.extend_from_slice(&other.data);
        self.len += other.len;
    }
}

/// Strings of one uniform width, right-padded with spaces.
///
/// The width is counted in characters. Use [`StringArray::trimmed`] to get a
/// value back without its padding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StringArray {
    width: usize,
    values: Vec<String>,
}

impl StringArray {
    /// Pad every string with spaces to the length of the longest one.
    pub fn from_unpadded(mut values: Vec<String>) -> Self {
        let width = values.iter().map(|s| s.chars().count()).max().unwrap_or(0);
        for value in &mut values {
            pad_to(value, width);
        }
        Self { width, values }
    }

    /// Padding width in characters.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Padded value at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Value at `index` with the padding spaces removed.
    pub fn trimmed(&self, index: usize) -> Option<&str> {
        self.get(index).map(|s| s.trim_end_matches(' '))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.values
    }

    /// Append all strings of `other`, re-padding to the larger width.
    pub fn append(&mut self, other: StringArray) {
        let width = self.width.max(other.width);
        if width > self.width {
            for value in &mut self.values {
                pad_to(value, width);
            }
        }
        self.values.extend(other.values.into_iter().map(|mut value| {
            pad_to(&mut value, width);
            value
        }));
        self.width = width;
    }
}

fn pad_to(value: &mut String, width: usize) {
    let chars = value.chars().count();
    value.extend(core::iter::repeat_n(' ', width.saturating_sub(chars)));
}

/// The decoded values of one channel, one element per record.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelArray {
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float16(Vec<f16>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Complex16(Vec<Complex<f16>>),
    Complex32(Vec<Complex<f32>>),
    Complex64(Vec<Complex<f64>>),
    Bytes(FixedBytes),
    Text(StringArray),
    /// Fixed-size arrays: `count` consecutive elements of `values` per record.
    Array {
        count: usize,
        values: Box<ChannelArray>,
    },
}

impl ChannelArray {
    /// Number of records.
    pub fn len(&self) -> usize {
        match self {
            ChannelArray::UInt8(v) => v.len(),
            ChannelArray::UInt16(v) => v.len(),
            ChannelArray::UInt32(v) => v.len(),
            ChannelArray::UInt64(v) => v.len(),
            ChannelArray::Int8(v) => v.len(),
            ChannelArray::Int16(v) => v.len(),
            ChannelArray::Int32(v) => v.len(),
            ChannelArray::Int64(v) => v.len(),
            ChannelArray::Float16(v) => v.len(),
            ChannelArray::Float32(v) => v.len(),
            ChannelArray::Float64(v) => v.len(),
            ChannelArray::Complex16(v) => v.len(),
            ChannelArray::Complex32(v) => v.len(),
            ChannelArray::Complex64(v) => v.len(),
            ChannelArray::Bytes(b) => b.len(),
            ChannelArray::Text(t) => t.len(),
            ChannelArray::Array { count, values } => values.len() / (*count).max(1),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Machine element type of the array.
    pub fn element_type(&self) -> ElementType {
        match self {
            ChannelArray::UInt8(_) => ElementType::UInt8,
            ChannelArray::UInt16(_) => ElementType::UInt16,
            ChannelArray::UInt32(_) => ElementType::UInt32,
            ChannelArray::UInt64(_) => ElementType::UInt64,
            ChannelArray::Int8(_) => ElementType::Int8,
            ChannelArray::Int16(_) => ElementType::Int16,
            ChannelArray::Int32(_) => ElementType::Int32,
            ChannelArray::Int64(_) => ElementType::Int64,
            ChannelArray::Float16(_) => ElementType::Float16,
            ChannelArray::Float32(_) => ElementType::Float32,
            ChannelArray::Float64(_) => ElementType::Float64,
            ChannelArray::Complex16(_) => ElementType::Complex16,
            ChannelArray::Complex32(_) => ElementType::Complex32,
            ChannelArray::Complex64(_) => ElementType::Complex64,
            ChannelArray::Bytes(b) => ElementType::Bytes(b.width()),
            ChannelArray::Text(t) => ElementType::Text(t.width()),
            ChannelArray::Array { count, values } => ElementType::Array {
                element: Box::new(values.element_type()),
                count: *count,
            },
        }
    }

    /// Padding width of text and byte arrays, `None` for numeric arrays.
    pub fn padding_width(&self) -> Option<usize> {
        match self {
            ChannelArray::Bytes(b) => Some(b.width()),
            ChannelArray::Text(t) => Some(t.width()),
            _ => None,
        }
    }

    /// Returns true for integer arrays (signed or unsigned).
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ChannelArray::UInt8(_)
                | ChannelArray::UInt16(_)
                | ChannelArray::UInt32(_)
                | ChannelArray::UInt64(_)
                | ChannelArray::Int8(_)
                | ChannelArray::Int16(_)
                | ChannelArray::Int32(_)
                | ChannelArray::Int64(_)
        )
    }

    /// Returns true for floating point arrays.
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            ChannelArray::Float16(_) | ChannelArray::Float32(_) | ChannelArray::Float64(_)
        )
    }

    /// Convert a scalar numeric array to `f64`, useful for applying
    /// conversion formulas. Returns `None` for complex, byte, text and array
    /// channels.
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        Some(match self {
            ChannelArray::UInt8(v) => v.iter().map(|&x| x as f64).collect(),
            ChannelArray::UInt16(v) => v.iter().map(|&x| x as f64).collect(),
            ChannelArray::UInt32(v) => v.iter().map(|&x| x as f64).collect(),
            ChannelArray::UInt64(v) => v.iter().map(|&x| x as f64).collect(),
            ChannelArray::Int8(v) => v.iter().map(|&x| x as f64).collect(),
            ChannelArray::Int16(v) => v.iter().map(|&x| x as f64).collect(),
            ChannelArray::Int32(v) => v.iter().map(|&x| x as f64).collect(),
            ChannelArray::Int64(v) => v.iter().map(|&x| x as f64).collect(),
            ChannelArray::Float16(v) => v.iter().map(|x| x.to_f64()).collect(),
            ChannelArray::Float32(v) => v.iter().map(|&x| x as f64).collect(),
            ChannelArray::Float64(v) => v.clone(),
            _ => return None,
        })
    }

    /// Append the records of `other` (for example the next chunk of the same
    /// channel). Text and byte arrays are re-padded to the larger width.
    pub fn append(&mut self, other: ChannelArray) -> Result<()> {
        match (self, other) {
            (ChannelArray::UInt8(a), ChannelArray::UInt8(b)) => a.extend(b),
            (ChannelArray::UInt16(a), ChannelArray::UInt16(b)) => a.extend(b),
            (ChannelArray::UInt32(a), ChannelArray::UInt32(b)) => a.extend(b),
            (ChannelArray::UInt64(a), ChannelArray::UInt64(b)) => a.extend(b),
            (ChannelArray::Int8(a), ChannelArray::Int8(b)) => a.extend(b),
            (ChannelArray::Int16(a), ChannelArray::Int16(b)) => a.extend(b),
            (ChannelArray::Int32(a), ChannelArray::Int32(b)) => a.extend(b),
            (ChannelArray::Int64(a), ChannelArray::Int64(b)) => a.extend(b),
            (ChannelArray::Float16(a), ChannelArray::Float16(b)) => a.extend(b),
            (ChannelArray::Float32(a), ChannelArray::Float32(b)) => a.extend(b),
            (ChannelArray::Float64(a), ChannelArray::Float64(b)) => a.extend(b),
            (ChannelArray::Complex16(a), ChannelArray::Complex16(b)) => a.extend(b),
            (ChannelArray::Complex32(a), ChannelArray::Complex32(b)) => a.extend(b),
            (ChannelArray::Complex64(a), ChannelArray::Complex64(b)) => a.extend(b),
            (ChannelArray::Bytes(a), ChannelArray::Bytes(b)) => a.append(b),
            (ChannelArray::Text(a), ChannelArray::Text(b)) => a.append(b),
            (
                ChannelArray::Array { count, values },
                ChannelArray::Array {
                    count: other_count,
                    values: other_values,
                },
            ) if *count == other_count => values.append(*other_values)?,
            (this, other) => {
                return Err(Error::ArrayMismatch {
                    expected: this.element_type().to_string(),
                    found: other.element_type().to_string(),
                });
            }
        }
        Ok(())
    }
}
