//! Splitting unsorted record streams.
//!
//! An unsorted data block interleaves records of several channel groups. Each
//! record starts with a record id naming its group:
//!
//! ```text
//! [id][record bytes .........]      fixed-length group
//! [id][u32 LE length][payload]      VLSD group
//! [id][record bytes ...][id]        fixed-length group, MDF3 trailing id
//! ```
//!
//! [`UnsortedSplitter`] walks the stream once. Fixed records are appended to
//! a contiguous per-group buffer which is decoded channel by channel after the
//! pass; VLSD payloads are collected and padded like a VLSD block.

use crate::array::ChannelArray;
use crate::decoder::ChannelDecoder;
use crate::error::{Error, Result, invalid_layout};
use crate::layout::{LayoutSet, SignalType};
use crate::vlsd::{LENGTH_PREFIX_SIZE, PayloadKind, VlsdCollector};
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

/// Width of the record id in front of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecordIdSize {
    U8,
    U16,
    U32,
    U64,
}

impl RecordIdSize {
    /// Record id size from its width in bytes (`dg_rec_id_size`).
    pub fn from_bytes(size: u8) -> Result<Self> {
        match size {
            1 => Ok(RecordIdSize::U8),
            2 => Ok(RecordIdSize::U16),
            4 => Ok(RecordIdSize::U32),
            8 => Ok(RecordIdSize::U64),
            other => Err(Error::UnsupportedRecordIdSize(other)),
        }
    }

    #[inline]
    pub fn byte_len(self) -> usize {
        match self {
            RecordIdSize::U8 => 1,
            RecordIdSize::U16 => 2,
            RecordIdSize::U32 => 4,
            RecordIdSize::U64 => 8,
        }
    }

    /// Read a little-endian record id from the start of `bytes`.
    ///
    /// # Panics
    /// Panics if `bytes` is shorter than [`RecordIdSize::byte_len`].
    pub fn read(self, bytes: &[u8]) -> u64 {
        bytes[..self.byte_len()]
            .iter()
            .rev()
            .fold(0u64, |acc, &b| (acc << 8) | b as u64)
    }
}

/// Record shape of one channel group in an unsorted stream.
#[derive(Debug, Clone)]
enum GroupKind {
    /// Records of `record_length` bytes after the id (data plus
    /// invalidation bytes). Channel layouts are relative to the first byte
    /// after the id and use `record_length` as their stride.
    Fixed {
        record_length: usize,
        channels: LayoutSet,
    },
    /// Length-prefixed payloads of one variable-length channel.
    Vlsd { name: String, signal_type: SignalType },
}

#[derive(Debug, Clone)]
struct RecordGroup {
    record_id: u64,
    kind: GroupKind,
}

/// One channel decoded from an unsorted stream.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedChannel {
    pub name: String,
    /// Record id of the group the channel belongs to
    pub record_id: u64,
    pub values: ChannelArray,
}

/// Result of a split pass.
///
/// When the stream is cut short or holds an unknown record id, `error` is set
/// and `channels` still holds every record read before that point.
#[derive(Debug)]
pub struct SplitOutput {
    pub channels: Vec<DecodedChannel>,
    pub error: Option<Error>,
}

impl SplitOutput {
    /// Decoded channel by name.
    pub fn get(&self, name: &str) -> Option<&DecodedChannel> {
        self.channels.iter().find(|c| c.name == name)
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Drop partial results when the pass did not finish.
    pub fn into_result(self) -> Result<Vec<DecodedChannel>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.channels),
        }
    }
}

enum State {
    /// Expecting a record id at the current position.
    ReadTag,
    /// A record id was read; look up its group.
    Dispatch { record_id: u64, record_start: usize },
    ReadFixed {
        slot: usize,
        record_start: usize,
        record_length: usize,
    },
    ReadVlsd { slot: usize, record_start: usize },
}

/// Records collected for one group during a pass.
enum Pending<'s, 'a> {
    Fixed {
        record_id: u64,
        record_length: usize,
        channels: &'s LayoutSet,
        bytes: Vec<u8>,
        records: usize,
    },
    Vlsd {
        record_id: u64,
        name: &'s str,
        collector: VlsdCollector<'a>,
    },
}

/// Splits an unsorted record stream into per-channel arrays.
///
/// # Example
///
/// ```
/// use mdf_records::{LayoutSet, RecordLayout, SignalType, UnsortedSplitter};
///
/// let mut speed = LayoutSet::new();
/// speed.push("speed", RecordLayout::new(SignalType::UnsignedInt, 16, 2));
///
/// let mut splitter = UnsortedSplitter::new(1)?;
/// splitter.add_fixed_group(1, 2, speed)?;
/// splitter.add_vlsd_group(2, "comment", SignalType::Utf8String)?;
///
/// let stream = [1, 0x10, 0x00, 2, 2, 0, 0, 0, b'o', b'k', 1, 0x20, 0x00];
/// let channels = splitter.split(&stream).into_result()?;
/// assert_eq!(channels[0].values.len(), 2);
/// assert_eq!(channels[1].values.len(), 1);
/// # Ok::<(), mdf_records::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct UnsortedSplitter {
    record_id_size: RecordIdSize,
    trailing_record_id: bool,
    groups: Vec<RecordGroup>,
    slots: BTreeMap<u64, usize>,
}

impl UnsortedSplitter {
    /// Create a splitter for record ids of `record_id_size` bytes.
    pub fn new(record_id_size: u8) -> Result<Self> {
        Ok(Self {
            record_id_size: RecordIdSize::from_bytes(record_id_size)?,
            trailing_record_id: false,
            groups: Vec::new(),
            slots: BTreeMap::new(),
        })
    }

    /// MDF3 files may repeat the record id after each fixed record.
    pub fn with_trailing_record_id(mut self, trailing: bool) -> Self {
        self.trailing_record_id = trailing;
        self
    }

    pub fn record_id_size(&self) -> RecordIdSize {
        self.record_id_size
    }

    /// Register a fixed-length group.
    ///
    /// Every channel layout is validated and must use `record_length` as its
    /// stride.
    pub fn add_fixed_group(
        &mut self,
        record_id: u64,
        record_length: usize,
        channels: LayoutSet,
    ) -> Result<()> {
        if record_length == 0 {
            return Err(invalid_layout!(
                "record id {}: record length must be greater than zero",
                record_id
            ));
        }
        channels.validate()?;
        if let Some(channel) = channels
            .channels
            .iter()
            .find(|c| c.layout.record_stride != record_length)
        {
            return Err(invalid_layout!(
                "channel {}: stride {} does not match record length {} of record id {}",
                channel.name,
                channel.layout.record_stride,
                record_length,
                record_id
            ));
        }
        self.add_group(RecordGroup {
            record_id,
            kind: GroupKind::Fixed {
                record_length,
                channels,
            },
        })
    }

    /// Register a VLSD group carrying one channel.
    pub fn add_vlsd_group(
        &mut self,
        record_id: u64,
        name: impl Into<String>,
        signal_type: SignalType,
    ) -> Result<()> {
        self.add_group(RecordGroup {
            record_id,
            kind: GroupKind::Vlsd {
                name: name.into(),
                signal_type,
            },
        })
    }

    fn add_group(&mut self, group: RecordGroup) -> Result<()> {
        if self.slots.contains_key(&group.record_id) {
            return Err(invalid_layout!(
                "record id {} is already registered",
                group.record_id
            ));
        }
        self.slots.insert(group.record_id, self.groups.len());
        self.groups.push(group);
        Ok(())
    }

    /// Walk `stream` once and decode every registered channel.
    ///
    /// Channels come back in group registration order, and within a fixed
    /// group in layout order. Records keep their stream order.
    pub fn split<'a>(&self, stream: &'a [u8]) -> SplitOutput {
        let mut pending: Vec<Pending<'_, 'a>> = self
            .groups
            .iter()
            .map(|group| match &group.kind {
                GroupKind::Fixed {
                    record_length,
                    channels,
                } => Pending::Fixed {
                    record_id: group.record_id,
                    record_length: *record_length,
                    channels,
                    bytes: Vec::new(),
                    records: 0,
                },
                GroupKind::Vlsd { name, signal_type } => Pending::Vlsd {
                    record_id: group.record_id,
                    name,
                    collector: VlsdCollector::new(PayloadKind::for_signal_type(*signal_type)),
                },
            })
            .collect();

        let id_len = self.record_id_size.byte_len();
        let trailing = if self.trailing_record_id { id_len } else { 0 };
        let mut pos = 0usize;
        let mut state = State::ReadTag;
        let mut record_total = 0usize;

        let error = loop {
            state = match state {
                State::ReadTag => {
                    if pos == stream.len() {
                        break None;
                    }
                    if stream.len() - pos < id_len {
                        break Some(truncated(pos, id_len, stream.len()));
                    }
                    let record_id = self.record_id_size.read(&stream[pos..]);
                    let record_start = pos;
                    pos += id_len;
                    State::Dispatch {
                        record_id,
                        record_start,
                    }
                }
                State::Dispatch {
                    record_id,
                    record_start,
                } => match self.slots.get(&record_id) {
                    Some(&slot) => match &pending[slot] {
                        Pending::Fixed { record_length, .. } => State::ReadFixed {
                            slot,
                            record_start,
                            record_length: *record_length,
                        },
                        Pending::Vlsd { .. } => State::ReadVlsd { slot, record_start },
                    },
                    None => {
                        break Some(Error::UnknownRecordId {
                            record_id,
                            offset: record_start,
                        });
                    }
                },
                State::ReadFixed {
                    slot,
                    record_start,
                    record_length,
                } => {
                    if stream.len() - pos < record_length + trailing {
                        break Some(truncated(
                            record_start,
                            id_len + record_length + trailing,
                            stream.len(),
                        ));
                    }
                    if let Pending::Fixed { bytes, records, .. } = &mut pending[slot] {
                        bytes.extend_from_slice(&stream[pos..pos + record_length]);
                        *records += 1;
                    }
                    pos += record_length + trailing;
                    record_total += 1;
                    State::ReadTag
                }
                State::ReadVlsd { slot, record_start } => {
                    if stream.len() - pos < LENGTH_PREFIX_SIZE {
                        break Some(truncated(
                            record_start,
                            id_len + LENGTH_PREFIX_SIZE,
                            stream.len(),
                        ));
                    }
                    let len = u32::from_le_bytes([
                        stream[pos],
                        stream[pos + 1],
                        stream[pos + 2],
                        stream[pos + 3],
                    ]) as usize;
                    if len > stream.len() - pos - LENGTH_PREFIX_SIZE {
                        let needed = (id_len + LENGTH_PREFIX_SIZE).saturating_add(len);
                        break Some(truncated(record_start, needed, stream.len()));
                    }
                    let body = LENGTH_PREFIX_SIZE + len;
                    if let Pending::Vlsd { collector, .. } = &mut pending[slot] {
                        collector.push(&stream[pos + LENGTH_PREFIX_SIZE..pos + body]);
                    }
                    pos += body;
                    record_total += 1;
                    State::ReadTag
                }
            };
        };

        log::debug!(
            "split {} of {} bytes into {} records across {} groups",
            pos,
            stream.len(),
            record_total,
            self.groups.len()
        );

        let mut output = SplitOutput {
            channels: Vec::new(),
            error,
        };
        for group in pending {
            match group {
                Pending::Fixed {
                    record_id,
                    channels,
                    bytes,
                    records,
                    ..
                } => {
                    for channel in &channels.channels {
                        let decoded = ChannelDecoder::new(&channel.layout)
                            .and_then(|decoder| decoder.decode(&bytes, records));
                        match decoded {
                            Ok(values) => output.channels.push(DecodedChannel {
                                name: channel.name.clone(),
                                record_id,
                                values,
                            }),
                            Err(e) => {
                                if output.error.is_none() {
                                    output.error = Some(e);
                                }
                            }
                        }
                    }
                }
                Pending::Vlsd {
                    record_id,
                    name,
                    collector,
                } => output.channels.push(DecodedChannel {
                    name: name.into(),
                    record_id,
                    values: collector.finish().into_channel_array(),
                }),
            }
        }
        output
    }
}

fn truncated(record_start: usize, needed: usize, stream_len: usize) -> Error {
    Error::TruncatedStream {
        offset: record_start,
        needed,
        available: stream_len - record_start,
    }
}
