//! Minimal binary netpbm reader for display images.
//!
//! Accepts `P4` (1-bit, set bits are black) and `P5` (8 or 16-bit gray).
//! Both decode to 8-bit luma, which [`Bitmap::from_luma`] dithers and
//! scales to the canvas.

use std::fs;
use std::path::Path;

use inklink_payload::Bitmap;

use crate::exit::{io_error, payload_error, CliError, CliResult, DATA_INVALID};

/// Decoded gray image, one byte per pixel.
#[derive(Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

pub fn load_bitmap(path: &Path) -> CliResult<Bitmap> {
    let data =
        fs::read(path).map_err(|err| io_error(&format!("read {}", path.display()), err))?;
    let image = decode(&data)
        .map_err(|err| CliError::new(DATA_INVALID, format!("{}: {err}", path.display())))?;
    Bitmap::from_luma(image.width, image.height, &image.pixels)
        .map_err(|err| payload_error("image conversion failed", err))
}

pub fn decode(data: &[u8]) -> Result<GrayImage, String> {
    let mut header = Header { data, pos: 0 };
    let magic = header.token()?;
    let width = header.number()?;
    let height = header.number()?;
    if width == 0 || height == 0 {
        return Err(format!("empty image {width}x{height}"));
    }

    match magic {
        "P4" => {
            header.single_whitespace()?;
            decode_bilevel(width, height, &data[header.pos..])
        }
        "P5" => {
            let max = header.number()?;
            if max == 0 || max > u32::from(u16::MAX) {
                return Err(format!("invalid maxval {max}"));
            }
            header.single_whitespace()?;
            decode_gray(width, height, max, &data[header.pos..])
        }
        other => Err(format!("unsupported image format {other:?}, expected P4 or P5")),
    }
}

fn decode_bilevel(width: u32, height: u32, body: &[u8]) -> Result<GrayImage, String> {
    let row_bytes = (width as usize).div_ceil(8);
    let needed = row_bytes * height as usize;
    let body = body
        .get(..needed)
        .ok_or_else(|| format!("pixel data truncated ({} of {needed} bytes)", body.len()))?;

    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for row in body.chunks_exact(row_bytes) {
        for x in 0..width as usize {
            let black = row[x / 8] & (0x80 >> (x % 8)) != 0;
            pixels.push(if black { 0 } else { u8::MAX });
        }
    }
    Ok(GrayImage {
        width,
        height,
        pixels,
    })
}

fn decode_gray(width: u32, height: u32, max: u32, body: &[u8]) -> Result<GrayImage, String> {
    let count = width as usize * height as usize;
    let sample_bytes = if max > u32::from(u8::MAX) { 2 } else { 1 };
    let needed = count * sample_bytes;
    let body = body
        .get(..needed)
        .ok_or_else(|| format!("pixel data truncated ({} of {needed} bytes)", body.len()))?;

    let pixels = body
        .chunks_exact(sample_bytes)
        .map(|sample| {
            let value = match sample {
                [hi, lo] => u32::from(u16::from_be_bytes([*hi, *lo])),
                [v] => u32::from(*v),
                _ => 0,
            };
            (value.min(max) * 255 / max) as u8
        })
        .collect();
    Ok(GrayImage {
        width,
        height,
        pixels,
    })
}

struct Header<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Header<'a> {
    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&byte) = self.data.get(self.pos) {
            if byte == b'#' {
                while self.data.get(self.pos).is_some_and(|&b| b != b'\n') {
                    self.pos += 1;
                }
            } else if byte.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn token(&mut self) -> Result<&'a str, String> {
        self.skip_whitespace_and_comments();
        let start = self.pos;
        while self
            .data
            .get(self.pos)
            .is_some_and(|b| !b.is_ascii_whitespace() && *b != b'#')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err("header truncated".to_string());
        }
        std::str::from_utf8(&self.data[start..self.pos])
            .map_err(|_| "header is not ASCII".to_string())
    }

    fn number(&mut self) -> Result<u32, String> {
        let token = self.token()?;
        token
            .parse()
            .map_err(|_| format!("invalid header number {token:?}"))
    }

    fn single_whitespace(&mut self) -> Result<(), String> {
        match self.data.get(self.pos) {
            Some(b) if b.is_ascii_whitespace() => {
                self.pos += 1;
                Ok(())
            }
            _ => Err("missing whitespace before pixel data".to_string()),
        }
    }
}
