/// Errors that can occur during packet encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload does not fit in a single packet.
    #[error("packet too large ({size} bytes, max {max})")]
    PacketTooLarge { size: usize, max: usize },

    /// The buffer cannot be described by the 2-byte length header.
    #[error("buffer too large ({size} bytes, max {max})")]
    BufferTooLarge { size: usize, max: usize },

    /// A packet header carried a zero length byte.
    #[error("invalid packet length byte 0")]
    InvalidLength,

    /// An I/O error occurred while reading or writing packets.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
