/// Errors that can occur while building display payloads.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// The compressor failed.
    #[error("compression failed: {0}")]
    Compression(#[from] std::io::Error),

    /// Pixel data does not match the stated dimensions.
    #[error("invalid image dimensions {width}x{height} for {len} bytes")]
    InvalidDimensions {
        width: u32,
        height: u32,
        len: usize,
    },

    /// A hibernation command did not start with the magic marker.
    #[error("invalid hibernation magic {0:#010x}")]
    InvalidMagic(u32),

    /// Input ended before a complete payload was read.
    #[error("payload truncated ({actual} bytes, expected {expected})")]
    Truncated { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, PayloadError>;
