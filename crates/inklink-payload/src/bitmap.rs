//! The display's 1-bit framebuffer.
//!
//! Rows are packed most-significant bit first, [`ROW_BYTES`] per row, with a
//! set bit meaning a white pixel. This is the layout the display firmware
//! inflates into its panel buffer.
//!
//! For `embedded-graphics`:
//! - `BinaryColor::On` is black ink
//! - `BinaryColor::Off` is white paper

use std::convert::Infallible;

use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::Pixel;

use crate::error::{PayloadError, Result};

/// Canvas width in pixels.
pub const CANVAS_WIDTH: u32 = 400;

/// Canvas height in pixels.
pub const CANVAS_HEIGHT: u32 = 300;

/// Bytes per packed row.
pub const ROW_BYTES: usize = (CANVAS_WIDTH as usize).div_ceil(8);

/// Size of the packed framebuffer.
pub const BITMAP_BYTES: usize = ROW_BYTES * CANVAS_HEIGHT as usize;

/// Grey levels above this become white when thresholding.
const WHITE_THRESHOLD: i16 = 127;

/// A 400×300 1-bit image, white on creation.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    data: Box<[u8]>,
}

impl Bitmap {
    /// A blank (all white) canvas.
    pub fn new() -> Self {
        Self {
            data: vec![0xFF; BITMAP_BYTES].into_boxed_slice(),
        }
    }

    /// Wrap an already packed framebuffer.
    pub fn from_packed(data: Vec<u8>) -> Result<Self> {
        if data.len() != BITMAP_BYTES {
            return Err(PayloadError::InvalidDimensions {
                width: CANVAS_WIDTH,
                height: CANVAS_HEIGHT,
                len: data.len(),
            });
        }
        Ok(Self {
            data: data.into_boxed_slice(),
        })
    }

    /// Convert an 8-bit greyscale image of any size to the canvas.
    ///
    /// The image is first reduced to 1 bit with Floyd–Steinberg error
    /// diffusion, then scaled to 400×300 by nearest-neighbour sampling.
    pub fn from_luma(width: u32, height: u32, pixels: &[u8]) -> Result<Self> {
        let expected = width as usize * height as usize;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(PayloadError::InvalidDimensions {
                width,
                height,
                len: pixels.len(),
            });
        }

        let mono = dither(width as usize, height as usize, pixels);

        let mut bitmap = Self::new();
        for y in 0..CANVAS_HEIGHT {
            let src_y = nearest(y, CANVAS_HEIGHT, height);
            for x in 0..CANVAS_WIDTH {
                let src_x = nearest(x, CANVAS_WIDTH, width);
                let white = mono[src_y * width as usize + src_x];
                bitmap.set_pixel(x, y, if white { BinaryColor::Off } else { BinaryColor::On });
            }
        }
        Ok(bitmap)
    }

    /// Set a single pixel. Out-of-bounds coordinates are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: BinaryColor) {
        if x >= CANVAS_WIDTH || y >= CANVAS_HEIGHT {
            return;
        }
        let (index, mask) = locate(x, y);
        match color {
            BinaryColor::Off => self.data[index] |= mask,
            BinaryColor::On => self.data[index] &= !mask,
        }
    }

    /// Read a single pixel, `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<BinaryColor> {
        if x >= CANVAS_WIDTH || y >= CANVAS_HEIGHT {
            return None;
        }
        let (index, mask) = locate(x, y);
        if self.data[index] & mask != 0 {
            Some(BinaryColor::Off)
        } else {
            Some(BinaryColor::On)
        }
    }

    /// The packed framebuffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of black pixels.
    pub fn ink_count(&self) -> usize {
        self.data.iter().map(|b| b.count_zeros() as usize).sum()
    }
}

impl Default for Bitmap {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &CANVAS_WIDTH)
            .field("height", &CANVAS_HEIGHT)
            .field("ink", &self.ink_count())
            .finish()
    }
}

impl OriginDimensions for Bitmap {
    fn size(&self) -> Size {
        Size::new(CANVAS_WIDTH, CANVAS_HEIGHT)
    }
}

impl DrawTarget for Bitmap {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> std::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> std::result::Result<(), Self::Error> {
        let fill = match color {
            BinaryColor::Off => 0xFF,
            BinaryColor::On => 0x00,
        };
        self.data.fill(fill);
        Ok(())
    }
}

fn locate(x: u32, y: u32) -> (usize, u8) {
    let index = y as usize * ROW_BYTES + x as usize / 8;
    let mask = 0x80u8 >> (x % 8);
    (index, mask)
}

/// Map a destination coordinate to its source by pixel-centre sampling.
fn nearest(dst: u32, dst_len: u32, src_len: u32) -> usize {
    let src = (2 * dst as u64 + 1) * src_len as u64 / (2 * dst_len as u64);
    (src as usize).min(src_len as usize - 1)
}

/// Floyd–Steinberg dithering; `true` marks a white pixel.
fn dither(width: usize, height: usize, pixels: &[u8]) -> Vec<bool> {
    let mut out = Vec::with_capacity(width * height);
    // Error carried into the current and next row, offset by one so x-1 never underflows.
    let mut current = vec![0i16; width + 2];
    let mut next = vec![0i16; width + 2];

    for y in 0..height {
        for x in 0..width {
            let value = (pixels[y * width + x] as i16 + current[x + 1]).clamp(0, 255);
            let white = value > WHITE_THRESHOLD;
            let error = value - if white { 255 } else { 0 };
            out.push(white);

            current[x + 2] += error * 7 / 16;
            next[x] += error * 3 / 16;
            next[x + 1] += error * 5 / 16;
            next[x + 2] += error / 16;
        }
        std::mem::swap(&mut current, &mut next);
        next.fill(0);
    }
    out
}

#[cfg(test)]
mod tests {
    use embedded_graphics::geometry::Point;
    use embedded_graphics::primitives::{Primitive, PrimitiveStyle, Rectangle};
    use embedded_graphics::Drawable;

    use super::*;

    #[test]
    fn new_canvas_is_white() {
        let bitmap = Bitmap::new();
        assert_eq!(bitmap.as_bytes().len(), 15_000);
        assert!(bitmap.as_bytes().iter().all(|b| *b == 0xFF));
        assert_eq!(bitmap.ink_count(), 0);
    }

    #[test]
    fn pixels_pack_msb_first_with_ink_cleared() {
        let mut bitmap = Bitmap::new();
        bitmap.set_pixel(0, 0, BinaryColor::On);
        bitmap.set_pixel(9, 1, BinaryColor::On);

        assert_eq!(bitmap.as_bytes()[0], 0b0111_1111);
        assert_eq!(bitmap.as_bytes()[ROW_BYTES + 1], 0b1011_1111);
        assert_eq!(bitmap.pixel(9, 1), Some(BinaryColor::On));
        assert_eq!(bitmap.pixel(10, 1), Some(BinaryColor::Off));
        assert_eq!(bitmap.pixel(400, 0), None);

        bitmap.set_pixel(9, 1, BinaryColor::Off);
        assert_eq!(bitmap.pixel(9, 1), Some(BinaryColor::Off));
    }

    #[test]
    fn draws_embedded_graphics_primitives() {
        let mut bitmap = Bitmap::new();
        Rectangle::new(Point::new(-5, -5), Size::new(10, 10))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut bitmap)
            .unwrap();

        // Only the on-canvas 5x5 corner is inked.
        assert_eq!(bitmap.ink_count(), 25);
        assert_eq!(bitmap.pixel(4, 4), Some(BinaryColor::On));
        assert_eq!(bitmap.pixel(5, 5), Some(BinaryColor::Off));

        bitmap.clear(BinaryColor::On).unwrap();
        assert_eq!(bitmap.ink_count(), 120_000);
    }

    #[test]
    fn from_packed_checks_length() {
        assert!(Bitmap::from_packed(vec![0; BITMAP_BYTES]).is_ok());
        assert!(matches!(
            Bitmap::from_packed(vec![0; 10]),
            Err(PayloadError::InvalidDimensions { len: 10, .. })
        ));
    }

    #[test]
    fn from_luma_rejects_bad_dimensions() {
        assert!(Bitmap::from_luma(0, 10, &[]).is_err());
        assert!(matches!(
            Bitmap::from_luma(4, 4, &[0; 15]),
            Err(PayloadError::InvalidDimensions {
                width: 4,
                height: 4,
                len: 15
            })
        ));
    }

    #[test]
    fn from_luma_scales_solid_halves() {
        // Left half black, right half white, at half resolution.
        let (w, h) = (200u32, 150u32);
        let pixels: Vec<u8> = (0..w * h)
            .map(|i| if i % w < w / 2 { 0 } else { 255 })
            .collect();

        let bitmap = Bitmap::from_luma(w, h, &pixels).unwrap();

        assert_eq!(bitmap.pixel(0, 0), Some(BinaryColor::On));
        assert_eq!(bitmap.pixel(199, 299), Some(BinaryColor::On));
        assert_eq!(bitmap.pixel(200, 0), Some(BinaryColor::Off));
        assert_eq!(bitmap.pixel(399, 299), Some(BinaryColor::Off));
        assert_eq!(bitmap.ink_count(), 200 * 300);
    }

    #[test]
    fn from_luma_dithers_mid_grey() {
        let pixels = vec![128u8; (CANVAS_WIDTH * CANVAS_HEIGHT) as usize];
        let bitmap = Bitmap::from_luma(CANVAS_WIDTH, CANVAS_HEIGHT, &pixels).unwrap();

        let total = (CANVAS_WIDTH * CANVAS_HEIGHT) as usize;
        let ink = bitmap.ink_count();
        assert!(
            ink > total * 2 / 5 && ink < total * 3 / 5,
            "mid grey should dither to roughly half ink, got {ink}/{total}"
        );
    }

    #[test]
    fn nearest_sampling_stays_in_bounds() {
        assert_eq!(nearest(0, 400, 1), 0);
        assert_eq!(nearest(399, 400, 1), 0);
        assert_eq!(nearest(399, 400, 800), 799);
        assert_eq!(nearest(0, 400, 800), 1);
    }
}
