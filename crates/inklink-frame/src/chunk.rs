//! Length header and chunking for multi-packet transmissions.
//!
//! A transmission buffer is prefixed with its own length as a little-endian
//! `u16`, then cut into packet-sized chunks. The bridge reassembles the
//! chunks and reads the header to know when the buffer is complete.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Size of the buffer length header.
pub const LENGTH_HEADER_SIZE: usize = 2;

/// Largest buffer the length header can describe.
pub const MAX_BUFFER_SIZE: usize = u16::MAX as usize;

/// Prefix `buffer` with its length as a little-endian `u16`.
///
/// The header describes the length of `buffer` itself, not counting the
/// header bytes.
pub fn with_length_header(buffer: &[u8]) -> Result<Bytes> {
    if buffer.len() > MAX_BUFFER_SIZE {
        return Err(FrameError::BufferTooLarge {
            size: buffer.len(),
            max: MAX_BUFFER_SIZE,
        });
    }
    let mut out = BytesMut::with_capacity(LENGTH_HEADER_SIZE + buffer.len());
    out.put_u16_le(buffer.len() as u16);
    out.put_slice(buffer);
    Ok(out.freeze())
}

/// Read the length header from the front of a reassembled buffer.
///
/// Returns `None` if fewer than two bytes are available.
pub fn read_length_header(buffer: &[u8]) -> Option<u16> {
    let header = buffer.get(..LENGTH_HEADER_SIZE)?;
    Some(u16::from_le_bytes([header[0], header[1]]))
}

/// Split `buffer` into ordered chunks of at most `size` bytes.
///
/// Chunks share storage with `buffer`. An empty buffer yields no chunks.
///
/// # Panics
///
/// Panics if `size` is zero.
pub fn chunks(buffer: &Bytes, size: usize) -> impl ExactSizeIterator<Item = Bytes> + '_ {
    assert!(size > 0, "chunk size must be non-zero");
    let count = buffer.len().div_ceil(size);
    (0..count).map(move |i| {
        let start = i * size;
        let end = (start + size).min(buffer.len());
        buffer.slice(start..end)
    })
}
