//! Length-prefixed packet framing for the inklink radio link.
//!
//! Every packet sent to the bridge is framed as:
//! - a 1-byte length covering the device id and the payload
//! - a 1-byte device id
//! - up to [`MAX_PACKET_SIZE`] payload bytes
//!
//! Larger buffers get a 2-byte little-endian length header and are split
//! into packet-sized chunks (see [`chunk`]). Text coming back from the
//! bridge is split into control and log lines by [`ControlLineCodec`].

pub mod chunk;
pub mod codec;
pub mod error;
pub mod line;

pub use chunk::{
    chunks, read_length_header, with_length_header, LENGTH_HEADER_SIZE, MAX_BUFFER_SIZE,
};
pub use codec::{
    decode_packet, encode_packet, frame, Packet, PacketCodec, HEADER_SIZE, MAX_PACKET_SIZE,
};
pub use error::{FrameError, Result};
pub use line::{ControlLineCodec, DeviceLine, ACK, CONTROL_PREFIX, DEFAULT_MAX_LINE_LENGTH};
