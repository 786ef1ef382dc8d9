#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

//! # mdf-records
//!
//! Record-level decoding for ASAM MDF 3.x and 4.x measurement data.
//!
//! An MDF data section is a run of fixed-length records, one per sample, with
//! each channel occupying a bit range inside every record. This crate turns
//! those raw bytes into typed, per-channel arrays. It does not read MDF
//! blocks itself: the caller locates the data, describes each channel with a
//! [`RecordLayout`], and hands over byte slices.
//!
//! ## Features
//!
//! - **Bit fields**: integers of 1 to 64 bits at any bit offset, either byte
//!   order, with sign extension
//! - **Typed decoding**: integers, IEEE half/single/double floats, complex
//!   numbers, fixed-length text and byte fields, fixed-size arrays
//! - **VLSD**: variable-length strings and blobs from signal data blocks,
//!   padded to a uniform width
//! - **Unsorted streams**: one pass over interleaved record-id prefixed
//!   records of several channel groups
//! - **Invalidation bits**: per-record validity masks
//! - **Compressed data** (`compression` feature): DZ payload inflate and
//!   de-transposition
//! - **Parallel decoding** (`parallel` feature): one rayon task per channel
//!
//! ## Quick Start
//!
//! ### Decoding a channel
//!
//! ```
//! use mdf_records::{ByteOrder, ChannelArray, RecordLayout, Result, SignalType, decode_channel};
//!
//! fn main() -> Result<()> {
//!     // Records of 6 bytes: a big-endian f32 at byte 0, a 12-bit counter at byte 4
//!     let mut data = Vec::new();
//!     for (value, counter) in [(1.5f32, 7u16), (-2.0, 4095)] {
//!         data.extend_from_slice(&value.to_be_bytes());
//!         data.extend_from_slice(&counter.to_le_bytes());
//!     }
//!
//!     let speed = RecordLayout::new(SignalType::Float32, 32, 6).with_byte_order(ByteOrder::Big);
//!     let counter = RecordLayout::new(SignalType::UnsignedInt, 12, 6).at(4, 0);
//!
//!     assert_eq!(decode_channel(&data, &speed, 2)?, ChannelArray::Float32(vec![1.5, -2.0]));
//!     assert_eq!(decode_channel(&data, &counter, 2)?, ChannelArray::UInt16(vec![7, 4095]));
//!     Ok(())
//! }
//! ```
//!
//! ### Persisting layouts
//!
//! ```no_run
//! use mdf_records::{LayoutSet, RecordLayout, Result, SignalType};
//!
//! fn main() -> Result<()> {
//!     let mut layouts = LayoutSet::new();
//!     layouts.push("rpm", RecordLayout::new(SignalType::UnsignedInt, 16, 8).at(2, 0));
//!     layouts.save_to_file("group1.layout.json")?;
//!
//!     let layouts = LayoutSet::load_from_file("group1.layout.json")?;
//!     assert_eq!(layouts.len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`layout`] | Channel descriptors, type codes and JSON layout sets |
//! | [`bitfield`] | Bit-field extraction |
//! | [`decoder`] | Typed channel decoding |
//! | [`array`] | Decoded channel arrays |
//! | [`text`] | String encodings |
//! | [`vlsd`] | Variable-length signal data |
//! | [`unsorted`] | Unsorted record stream splitting |
//! | [`invalidation`] | Invalidation bits |
//! | [`record_buffer`] | Record buffers and chunked decoding |
//! | `compression` | DZ payloads (`compression` feature) |
//! | `parallel` | Channel-parallel decoding (`parallel` feature) |
//! | [`error`] | Error types and [`Result`] alias |
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`], an alias for
//! `core::result::Result<T, Error>`. Decoding a channel either produces the
//! whole array or an [`Error`]; only the unsorted splitter hands back partial
//! results, inside [`SplitOutput`].
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade. The crate
//! never installs a logger.

extern crate alloc;

pub mod array;
pub mod bitfield;
pub mod decoder;
pub mod error;
pub mod invalidation;
pub mod layout;
pub mod record_buffer;
pub mod text;
pub mod unsorted;
pub mod vlsd;

#[cfg(feature = "compression")]
pub mod compression;
#[cfg(feature = "parallel")]
pub mod parallel;

// Re-export commonly used types at the crate root
pub use array::{ChannelArray, ElementType, FixedBytes, StringArray};
pub use bitfield::{BitField, IntWidth, extract};
pub use decoder::{ChannelDecoder, SignalKind, decode_channel, decode_channels};
pub use error::{Error, Result};
pub use invalidation::{Validity, invalidation_mask};
pub use layout::{ByteOrder, LayoutSet, NamedLayout, RecordLayout, SignalType};
pub use record_buffer::RecordBuffer;
pub use text::TextEncoding;
pub use unsorted::{DecodedChannel, RecordIdSize, SplitOutput, UnsortedSplitter};
pub use vlsd::{VlsdArray, VlsdEntries, read_vlsd_block};

#[cfg(feature = "compression")]
pub use compression::{ZipType, inflate};
#[cfg(feature = "parallel")]
pub use parallel::decode_channels_parallel;
