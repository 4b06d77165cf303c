//! Compressed image payloads.
//!
//! Wire contract with the display: the payload is a zlib stream at maximum
//! compression with its 2-byte zlib header removed. The display runs a raw
//! inflate decoder, which starts at the first deflate block and stops at the
//! final one, so the Adler-32 trailer rides along unread.

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use tracing::debug;

use crate::bitmap::{Bitmap, BITMAP_BYTES};
use crate::error::{PayloadError, Result};

/// Bytes of zlib header stripped from the compressed stream.
pub const ZLIB_HEADER_SIZE: usize = 2;

/// Compress a bitmap into the display's image payload.
///
/// Identical pixels always produce identical bytes.
pub fn encode_image(bitmap: &Bitmap) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(BITMAP_BYTES / 4), Compression::best());
    encoder.write_all(bitmap.as_bytes())?;
    let mut stream = encoder.finish()?;

    if stream.len() < ZLIB_HEADER_SIZE {
        return Err(PayloadError::Truncated {
            expected: ZLIB_HEADER_SIZE,
            actual: stream.len(),
        });
    }
    stream.drain(..ZLIB_HEADER_SIZE);

    debug!(
        raw = BITMAP_BYTES,
        compressed = stream.len(),
        "encoded image payload"
    );
    Ok(stream)
}

/// Inflate an image payload the way the display does.
pub fn inflate_image(payload: &[u8]) -> Result<Bitmap> {
    let mut decoder = DeflateDecoder::new(payload);
    let mut raw = Vec::with_capacity(BITMAP_BYTES);
    decoder.read_to_end(&mut raw)?;
    Bitmap::from_packed(raw)
}

#[cfg(test)]
mod tests {
    use embedded_graphics::pixelcolor::BinaryColor;

    use super::*;

    fn checkerboard() -> Bitmap {
        let mut bitmap = Bitmap::new();
        for y in 0..300 {
            for x in 0..400 {
                if (x / 10 + y / 10) % 2 == 0 {
                    bitmap.set_pixel(x, y, BinaryColor::On);
                }
            }
        }
        bitmap
    }

    #[test]
    fn payload_has_no_zlib_header() {
        let payload = encode_image(&Bitmap::new()).unwrap();

        // A zlib header is CMF=0x78 followed by FLG making the pair a multiple of 31.
        let looks_like_zlib =
            payload[0] == 0x78 && (u16::from(payload[0]) << 8 | u16::from(payload[1])) % 31 == 0;
        assert!(!looks_like_zlib);
        assert!(payload.len() < BITMAP_BYTES);
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = encode_image(&checkerboard()).unwrap();
        let b = encode_image(&checkerboard()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, encode_image(&Bitmap::new()).unwrap());
    }

    #[test]
    fn raw_inflate_recovers_pixels() {
        let original = checkerboard();
        let payload = encode_image(&original).unwrap();
        let restored = inflate_image(&payload).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn inflate_rejects_wrong_size() {
        let mut encoder = flate2::write::DeflateEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(&[0xFF; 100]).unwrap();
        let payload = encoder.finish().unwrap();

        assert!(matches!(
            inflate_image(&payload),
            Err(PayloadError::InvalidDimensions { len: 100, .. })
        ));
    }
}
