use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::error::{FrameError, Result};

/// Packet header: length (1) + device id (1) = 2 bytes.
pub const HEADER_SIZE: usize = 2;

/// Maximum payload bytes in one packet.
///
/// The length byte covers the device id as well, so a full packet carries
/// `MAX_PACKET_SIZE + 1 = 255` in its length byte.
pub const MAX_PACKET_SIZE: usize = u8::MAX as usize - 1;

/// A single framed unit addressed to one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Logical address of the receiving display.
    pub device_id: u8,
    /// Packet payload, at most [`MAX_PACKET_SIZE`] bytes.
    pub payload: Bytes,
}

impl Packet {
    /// The total wire size of this packet (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Encode this packet into a fresh buffer.
    pub fn to_wire(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.wire_size());
        encode_packet(self, &mut buf)?;
        Ok(buf.freeze())
    }
}

/// Build a packet, rejecting payloads that do not fit in one frame.
pub fn frame(payload: impl Into<Bytes>, device_id: u8) -> Result<Packet> {
    let payload = payload.into();
    check_size(payload.len())?;
    Ok(Packet { device_id, payload })
}

/// Encode a packet into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬─────────────┬──────────────────────┐
/// │ Length (1B)  │ Device (1B) │ Payload              │
/// │ payload + 1  │             │ (Length - 1 bytes)   │
/// └──────────────┴─────────────┴──────────────────────┘
/// ```
pub fn encode_packet(packet: &Packet, dst: &mut BytesMut) -> Result<()> {
    check_size(packet.payload.len())?;
    dst.reserve(packet.wire_size());
    dst.put_u8(packet.payload.len() as u8 + 1);
    dst.put_u8(packet.device_id);
    dst.put_slice(&packet.payload);
    Ok(())
}

/// Decode a packet from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete packet yet.
/// On success, consumes the packet bytes from the buffer.
pub fn decode_packet(src: &mut BytesMut) -> Result<Option<Packet>> {
    let Some(&length) = src.first() else {
        return Ok(None);
    };
    if length == 0 {
        debug!(buffered = src.len(), "packet header has zero length");
        return Err(FrameError::InvalidLength);
    }

    let total = 1 + length as usize;
    if src.len() < total {
        return Ok(None);
    }

    src.advance(1);
    let device_id = src.get_u8();
    let payload = src.split_to(length as usize - 1).freeze();

    Ok(Some(Packet { device_id, payload }))
}

fn check_size(size: usize) -> Result<()> {
    if size > MAX_PACKET_SIZE {
        return Err(FrameError::PacketTooLarge {
            size,
            max: MAX_PACKET_SIZE,
        });
    }
    Ok(())
}

/// tokio-util codec for the packet wire format.
///
/// The host only ever encodes; decoding is what the bridge does, and is used
/// here to inspect captured traffic.
#[derive(Debug, Clone, Copy, Default)]
pub struct PacketCodec;

impl Encoder<Packet> for PacketCodec {
    type Error = FrameError;

    fn encode(&mut self, packet: Packet, dst: &mut BytesMut) -> Result<()> {
        encode_packet(&packet, dst)
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        decode_packet(src)
    }
}
