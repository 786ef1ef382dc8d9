//! Channel-parallel decoding.
//!
//! Requires the `parallel` feature.

use crate::Result;
use crate::array::ChannelArray;
use crate::decoder::decode_channel;
use crate::layout::LayoutSet;
use alloc::vec::Vec;
use rayon::prelude::*;

/// Decode every channel of a layout set from the same buffer on the rayon
/// thread pool, one task per channel.
///
/// Results come back in layout order, exactly as
/// [`decode_channels`](crate::decode_channels) returns them.
pub fn decode_channels_parallel<'a>(
    buffer: &[u8],
    layouts: &'a LayoutSet,
    record_count: usize,
) -> Vec<(&'a str, Result<ChannelArray>)> {
    layouts
        .channels
        .par_iter()
        .map(|c| {
            (
                c.name.as_str(),
                decode_channel(buffer, &c.layout, record_count),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode_channels;
    use crate::layout::{RecordLayout, SignalType};

    #[test]
    fn matches_sequential_decode() {
        let mut layouts = LayoutSet::new();
        for i in 0..8 {
            layouts.push(
                alloc::format!("ch{i}"),
                RecordLayout::new(SignalType::UnsignedInt, 8, 8).at(i, 0),
            );
        }
        layouts.push("broken", RecordLayout::new(SignalType::Float32, 32, 8).at(6, 0));
        let buffer: Vec<u8> = (0..=255u8).cycle().take(8 * 100).collect();

        let sequential = decode_channels(&buffer, &layouts, 100);
        let parallel = decode_channels_parallel(&buffer, &layouts, 100);
        assert_eq!(sequential.len(), parallel.len());
        for ((name_a, a), (name_b, b)) in sequential.iter().zip(&parallel) {
            assert_eq!(name_a, name_b);
            match (a, b) {
                (Ok(a), Ok(b)) => assert_eq!(a, b),
                (Err(_), Err(_)) => {}
                _ => panic!("results differ for {name_a}"),
            }
        }
        assert!(parallel.last().unwrap().1.is_err());
    }
}
