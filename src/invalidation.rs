//! Invalidation bits.
//!
//! MDF4 records may end with invalidation bytes holding one bit per channel.
//! A set bit marks the channel's value in that record as invalid. Two channel
//! flags short-circuit the lookup:
//!
//! | `cn_flags` bit 0 (all invalid) | bit 1 (inval bit valid) | Meaning              |
//! |-------------------------------|-------------------------|----------------------|
//! | 1                             | any                     | every value invalid  |
//! | 0                             | 0                       | every value valid    |
//! | 0                             | 1                       | read the record bit  |

use crate::bitfield::{BitField, check_bounds, collect_records};
use crate::error::Result;
use crate::layout::ByteOrder;
use alloc::vec;
use alloc::vec::Vec;

/// cn_flags bit 0: all values of the channel are invalid.
pub const CN_FLAG_ALL_INVALID: u32 = 0x0001;
/// cn_flags bit 1: the invalidation bit position is used.
pub const CN_FLAG_INVAL_BIT_VALID: u32 = 0x0002;

/// Where a channel's validity comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Validity {
    AllValid,
    AllInvalid,
    /// Bit `bit` of byte `byte_offset` in each record; set means invalid.
    Bit { byte_offset: usize, bit: u8 },
}

impl Validity {
    /// Resolve validity from raw channel block fields.
    ///
    /// `invalidation_offset` is where the invalidation bytes start within a
    /// record, i.e. the record id size plus the group's data bytes.
    pub fn from_mdf4_flags(cn_flags: u32, inval_bit_pos: u32, invalidation_offset: usize) -> Self {
        if cn_flags & CN_FLAG_ALL_INVALID != 0 {
            return Validity::AllInvalid;
        }
        if cn_flags & CN_FLAG_INVAL_BIT_VALID == 0 {
            return Validity::AllValid;
        }
        Validity::Bit {
            byte_offset: invalidation_offset + (inval_bit_pos >> 3) as usize,
            bit: (inval_bit_pos & 0x07) as u8,
        }
    }
}

/// Per-record validity, `true` where the value is valid.
///
/// # Errors
/// [`Error::InvalidLayout`](crate::Error::InvalidLayout) when the
/// invalidation byte lies outside the record or the buffer.
pub fn invalidation_mask(
    buffer: &[u8],
    record_stride: usize,
    record_count: usize,
    validity: &Validity,
) -> Result<Vec<bool>> {
    match *validity {
        Validity::AllValid => Ok(vec![true; record_count]),
        Validity::AllInvalid => Ok(vec![false; record_count]),
        Validity::Bit { byte_offset, bit } => {
            let field = BitField::new(byte_offset, bit, 1, ByteOrder::Little)?;
            check_bounds(buffer, record_stride, record_count, byte_offset, field.span())?;
            Ok(collect_records(buffer, record_stride, record_count, |r| {
                field.read_unsigned(r) == 0
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_short_circuit() {
        assert_eq!(Validity::from_mdf4_flags(0x0001, 5, 8), Validity::AllInvalid);
        assert_eq!(Validity::from_mdf4_flags(0x0003, 5, 8), Validity::AllInvalid);
        assert_eq!(Validity::from_mdf4_flags(0x0000, 5, 8), Validity::AllValid);
        assert_eq!(
            Validity::from_mdf4_flags(0x0002, 11, 8),
            Validity::Bit {
                byte_offset: 9,
                bit: 3
            }
        );
    }

    #[test]
    fn mask_reads_one_bit_per_record() {
        // 2 data bytes then 1 invalidation byte per record
        let buffer = [0, 0, 0b0000_0100, 0, 0, 0, 9, 9, 0b1111_1011];
        let validity = Validity::from_mdf4_flags(CN_FLAG_INVAL_BIT_VALID, 2, 2);
        let mask = invalidation_mask(&buffer, 3, 3, &validity).unwrap();
        assert_eq!(mask, vec![false, true, true]);
    }

    #[test]
    fn constant_masks_ignore_buffer() {
        assert_eq!(
            invalidation_mask(&[], 4, 2, &Validity::AllInvalid).unwrap(),
            vec![false, false]
        );
        assert_eq!(
            invalidation_mask(&[], 4, 1, &Validity::AllValid).unwrap(),
            vec![true]
        );
    }

    #[test]
    fn invalidation_byte_outside_record() {
        let validity = Validity::Bit {
            byte_offset: 4,
            bit: 0,
        };
        assert!(invalidation_mask(&[0u8; 8], 4, 2, &validity).is_err());
    }
}
