//! Compressed data payloads (`##DZ`).
//!
//! Data sections may be stored zlib compressed, optionally after a byte
//! transposition that groups byte `k` of every record together. [`inflate`]
//! restores the plain record bytes that the decoders expect.
//!
//! Requires the `compression` feature.

use crate::{Error, Result};
use alloc::format;
use alloc::vec::Vec;

/// Compression algorithm of a DZ payload (`dz_zip_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ZipType {
    /// Deflate only (zlib).
    Deflate = 0,
    /// Transposition followed by deflate.
    TranspositionDeflate = 1,
}

impl ZipType {
    /// Convert from the raw block value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Deflate),
            1 => Some(Self::TranspositionDeflate),
            _ => None,
        }
    }
}

/// Inflate a DZ payload back to its original bytes.
///
/// For [`ZipType::TranspositionDeflate`], `zip_parameter` is the number of
/// columns (usually the record length). Only the first
/// `original_length / zip_parameter` full rows were transposed; the
/// remaining tail bytes are stored as they are.
///
/// # Errors
/// [`Error::DecompressionError`] if the zlib stream is corrupt, inflates to a
/// size other than `original_length`, or a transposed payload has a zero
/// `zip_parameter`.
pub fn inflate(
    payload: &[u8],
    zip_type: ZipType,
    zip_parameter: u32,
    original_length: usize,
) -> Result<Vec<u8>> {
    use miniz_oxide::inflate::{TINFLStatus, decompress_to_vec_zlib_with_limit};

    let data = decompress_to_vec_zlib_with_limit(payload, original_length).map_err(|e| {
        if e.status == TINFLStatus::HasMoreOutput {
            Error::DecompressionError(format!(
                "inflated data exceeds expected size of {} bytes",
                original_length
            ))
        } else {
            Error::DecompressionError(format!("zlib inflate failed: {:?}", e.status))
        }
    })?;
    if data.len() != original_length {
        return Err(Error::DecompressionError(format!(
            "inflated size mismatch: expected {}, got {}",
            original_length,
            data.len()
        )));
    }

    match zip_type {
        ZipType::Deflate => Ok(data),
        ZipType::TranspositionDeflate => untranspose(&data, zip_parameter as usize),
    }
}

/// Restore row order from column-by-column storage.
fn untranspose(data: &[u8], columns: usize) -> Result<Vec<u8>> {
    if columns == 0 {
        return Err(Error::DecompressionError(
            "transposed payload with zero zip parameter".into(),
        ));
    }
    let rows = data.len() / columns;
    let body = rows * columns;

    let mut out = Vec::with_capacity(data.len());
    for row in 0..rows {
        out.extend((0..columns).map(|col| data[col * rows + row]));
    }
    out.extend_from_slice(&data[body..]);
    Ok(out)
}
