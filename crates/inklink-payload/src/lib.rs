//! Payload encoders for inklink displays.
//!
//! - [`Bitmap`] is the fixed 400×300 1-bit canvas the display shows. It is an
//!   `embedded-graphics` draw target, so renderers draw straight into it.
//! - [`encode_image`] compresses a bitmap into the byte stream the display's
//!   raw-inflate decoder expects.
//! - [`HibernationCommand`] tells the display how long to sleep.

pub mod bitmap;
pub mod error;
pub mod hibernate;
pub mod image;

pub use bitmap::{Bitmap, BITMAP_BYTES, CANVAS_HEIGHT, CANVAS_WIDTH, ROW_BYTES};
pub use error::{PayloadError, Result};
pub use hibernate::{HibernationCommand, HIBERNATION_COMMAND_SIZE, HIBERNATION_MAGIC};
pub use image::{encode_image, inflate_image, ZLIB_HEADER_SIZE};
