use mdf_records::bitfield::assemble;
use mdf_records::{
    BitField, ByteOrder, ChannelArray, RecordLayout, Result, SignalType, decode_channel, extract,
};
use proptest::prelude::*;

const STRIDE: usize = 12;
const BYTE_OFFSET: usize = 1;

/// Overwrite the field bits of `record`, leaving the surrounding bits alone.
fn write_field(record: &mut [u8], field: &BitField, value: u64) {
    let span = field.span();
    let bytes = &mut record[field.byte_offset..field.byte_offset + span];
    let field_mask = if field.bit_count == 64 {
        u64::MAX as u128
    } else {
        (1u128 << field.bit_count) - 1
    };
    let shifted_mask = field_mask << field.bit_offset;
    let raw = (assemble(bytes, field.byte_order) & !shifted_mask)
        | (((value as u128) & field_mask) << field.bit_offset);
    for (i, byte) in bytes.iter_mut().enumerate() {
        let shift = match field.byte_order {
            ByteOrder::Little => 8 * i,
            ByteOrder::Big => 8 * (span - 1 - i),
        };
        *byte = (raw >> shift) as u8;
    }
}

fn unsigned_values(array: &ChannelArray) -> Vec<u64> {
    match array {
        ChannelArray::UInt8(v) => v.iter().map(|&x| x as u64).collect(),
        ChannelArray::UInt16(v) => v.iter().map(|&x| x as u64).collect(),
        ChannelArray::UInt32(v) => v.iter().map(|&x| x as u64).collect(),
        ChannelArray::UInt64(v) => v.clone(),
        other => panic!("expected unsigned array, got {:?}", other.element_type()),
    }
}

fn signed_values(array: &ChannelArray) -> Vec<i64> {
    match array {
        ChannelArray::Int8(v) => v.iter().map(|&x| x as i64).collect(),
        ChannelArray::Int16(v) => v.iter().map(|&x| x as i64).collect(),
        ChannelArray::Int32(v) => v.iter().map(|&x| x as i64).collect(),
        ChannelArray::Int64(v) => v.clone(),
        other => panic!("expected signed array, got {:?}", other.element_type()),
    }
}

proptest! {
    #[test]
    fn written_fields_read_back(
        bit_count in 1u32..=64,
        bit_offset in 0u8..=7,
        big_endian in any::<bool>(),
        first in any::<u64>(),
        second in any::<u64>(),
        noise in prop::collection::vec(any::<u8>(), STRIDE * 2),
    ) {
        let order = if big_endian { ByteOrder::Big } else { ByteOrder::Little };
        let field = BitField::new(BYTE_OFFSET, bit_offset, bit_count, order).unwrap();
        let mask = if bit_count == 64 { u64::MAX } else { (1u64 << bit_count) - 1 };

        let mut buffer = noise;
        write_field(&mut buffer[..STRIDE], &field, first);
        write_field(&mut buffer[STRIDE..], &field, second);

        let unsigned = extract(&buffer, STRIDE, 2, &field, false).unwrap();
        prop_assert_eq!(unsigned_values(&unsigned), vec![first & mask, second & mask]);

        let signed = extract(&buffer, STRIDE, 2, &field, true).unwrap();
        let expect_signed = |v: u64| {
            let v = v & mask;
            if bit_count < 64 && (v >> (bit_count - 1)) & 1 == 1 {
                (v | !mask) as i64
            } else {
                v as i64
            }
        };
        prop_assert_eq!(signed_values(&signed), vec![expect_signed(first), expect_signed(second)]);

        let layout = RecordLayout::new(SignalType::UnsignedInt, bit_count, STRIDE)
            .at(BYTE_OFFSET, bit_offset)
            .with_byte_order(order);
        prop_assert_eq!(decode_channel(&buffer, &layout, 2).unwrap(), unsigned);
    }
}

#[test]
fn twelve_bit_all_ones() -> Result<()> {
    let buffer = [0xFF, 0x0F];
    let field = BitField::new(0, 0, 12, ByteOrder::Little)?;
    assert_eq!(extract(&buffer, 2, 1, &field, true)?, ChannelArray::Int16(vec![-1]));
    assert_eq!(extract(&buffer, 2, 1, &field, false)?, ChannelArray::UInt16(vec![4095]));
    Ok(())
}

#[test]
fn full_width_fields_keep_every_bit() -> Result<()> {
    let buffer = [0xFF; 8];
    let field = BitField::new(0, 0, 32, ByteOrder::Little)?;
    assert_eq!(
        extract(&buffer, 4, 2, &field, false)?,
        ChannelArray::UInt32(vec![u32::MAX, u32::MAX])
    );
    let field = BitField::new(0, 0, 64, ByteOrder::Big)?;
    assert_eq!(extract(&buffer, 8, 1, &field, true)?, ChannelArray::Int64(vec![-1]));
    Ok(())
}

#[test]
fn reads_never_touch_bytes_past_the_field() -> Result<()> {
    // The last record is cut right after its field.
    let buffer = [0x01, 0x02, 0xEE, 0xEE, 0x03, 0x04];
    let field = BitField::new(0, 0, 16, ByteOrder::Little)?;
    assert_eq!(
        extract(&buffer, 4, 2, &field, false)?,
        ChannelArray::UInt16(vec![0x0201, 0x0403])
    );
    Ok(())
}
