//! Fixed-stride record buffers.
//!
//! A [`RecordBuffer`] wraps the concatenated records of one channel group and
//! knows how many whole records it holds. Large data sections can be decoded
//! in bounded chunks and the partial arrays joined with
//! [`ChannelArray::append`].

use crate::array::ChannelArray;
use crate::decoder::ChannelDecoder;
use crate::error::{Result, invalid_layout};
use crate::layout::RecordLayout;

/// Records of one channel group, `record_stride` bytes each.
#[derive(Debug, Clone, Copy)]
pub struct RecordBuffer<'a> {
    bytes: &'a [u8],
    record_stride: usize,
}

impl<'a> RecordBuffer<'a> {
    /// Wrap `bytes` as records of `record_stride` bytes.
    pub fn new(bytes: &'a [u8], record_stride: usize) -> Result<Self> {
        if record_stride == 0 {
            return Err(invalid_layout!("record stride must be greater than zero"));
        }
        Ok(Self {
            bytes,
            record_stride,
        })
    }

    #[inline]
    pub fn record_stride(&self) -> usize {
        self.record_stride
    }

    /// Number of whole records.
    #[inline]
    pub fn record_count(&self) -> usize {
        self.bytes.len() / self.record_stride
    }

    /// Trailing bytes that do not form a whole record.
    ///
    /// Data blocks may be padded at the end; callers decide whether a
    /// non-empty remainder is an error.
    pub fn remainder(&self) -> &'a [u8] {
        &self.bytes[self.record_count() * self.record_stride..]
    }

    /// The record at `index`, or `None` past the last whole record.
    pub fn record(&self, index: usize) -> Option<&'a [u8]> {
        if index >= self.record_count() {
            return None;
        }
        let start = index * self.record_stride;
        Some(&self.bytes[start..start + self.record_stride])
    }

    /// Iterate over raw records.
    pub fn records(&self) -> impl Iterator<Item = &'a [u8]> + use<'a> {
        self.bytes.chunks_exact(self.record_stride)
    }

    /// Split into sub-buffers of at most `max_bytes`, each holding whole
    /// records. At least one record goes into every chunk, even when a single
    /// record is larger than `max_bytes`.
    pub fn chunks(&self, max_bytes: usize) -> impl Iterator<Item = RecordBuffer<'a>> + use<'a> {
        let stride = self.record_stride;
        let per_chunk = (max_bytes / stride).max(1) * stride;
        let whole = &self.bytes[..self.record_count() * stride];
        whole.chunks(per_chunk).map(move |bytes| RecordBuffer {
            bytes,
            record_stride: stride,
        })
    }

    /// Decode one channel from every record.
    ///
    /// The layout's stride must match the buffer's.
    pub fn decode(&self, layout: &RecordLayout) -> Result<ChannelArray> {
        let decoder = self.decoder_for(layout)?;
        decoder.decode(self.bytes, self.record_count())
    }

    /// Decode one channel chunk by chunk, joining the partial arrays.
    ///
    /// Gives the same result as [`RecordBuffer::decode`]; text and byte
    /// channels are re-padded as later chunks widen them.
    pub fn decode_chunked(&self, layout: &RecordLayout, chunk_bytes: usize) -> Result<ChannelArray> {
        let decoder = self.decoder_for(layout)?;
        let mut chunks = self.chunks(chunk_bytes);
        let Some(first) = chunks.next() else {
            return decoder.decode(&[], 0);
        };
        let mut out = decoder.decode(first.bytes, first.record_count())?;
        for chunk in chunks {
            out.append(decoder.decode(chunk.bytes, chunk.record_count())?)?;
        }
        log::debug!(
            "decoded {} records in chunks of {} bytes",
            out.len(),
            chunk_bytes
        );
        Ok(out)
    }

    fn decoder_for(&self, layout: &RecordLayout) -> Result<ChannelDecoder> {
        if layout.record_stride != self.record_stride {
            return Err(invalid_layout!(
                "layout stride {} does not match buffer stride {}",
                layout.record_stride,
                self.record_stride
            ));
        }
        ChannelDecoder::new(layout)
    }
}
