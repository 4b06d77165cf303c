//! In-memory display used by the link tests.

use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use futures_util::StreamExt;
use inklink_frame::{Packet, PacketCodec};
use inklink_transport::Connection;
use tokio::io::{AsyncWriteExt, DuplexStream, WriteHalf};
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;

use crate::config::LinkConfig;
use crate::link::Link;

#[derive(Debug, Clone, Copy)]
pub(crate) enum AckMode {
    Always,
    Never,
    /// Stay silent for the first N packets, then acknowledge.
    SkipFirst(usize),
}

pub(crate) struct MockDevice {
    packets: Arc<Mutex<Vec<(Packet, SystemTime)>>>,
    task: JoinHandle<()>,
}

impl MockDevice {
    pub(crate) fn packets(&self) -> Vec<Packet> {
        self.arrivals().into_iter().map(|(packet, _)| packet).collect()
    }

    /// Packets with the wall-clock time each one was read off the pipe.
    pub(crate) fn arrivals(&self) -> Vec<(Packet, SystemTime)> {
        self.packets.lock().unwrap().clone()
    }

    /// Drop the device end of the pipe.
    pub(crate) fn disconnect(&self) {
        self.task.abort();
    }
}

pub(crate) fn link_with_device(
    config: LinkConfig,
    mode: AckMode,
) -> (Link<WriteHalf<DuplexStream>>, MockDevice) {
    let (host, device) = tokio::io::duplex(4096);
    let link = Link::start(Connection::from_stream(host, "mock"), config);

    let packets = Arc::new(Mutex::new(Vec::new()));
    let recorded = packets.clone();
    let task = tokio::spawn(async move {
        let (read_half, mut write_half) = tokio::io::split(device);
        let mut incoming = FramedRead::new(read_half, PacketCodec);
        let mut seen = 0usize;

        while let Some(Ok(packet)) = incoming.next().await {
            recorded.lock().unwrap().push((packet, SystemTime::now()));
            seen += 1;

            let ack = match mode {
                AckMode::Always => true,
                AckMode::Never => false,
                AckMode::SkipFirst(n) => seen > n,
            };
            if ack && write_half.write_all(b"CONTROL:ACK\n").await.is_err() {
                break;
            }
        }
    });

    (link, MockDevice { packets, task })
}

pub(crate) fn reassemble(packets: &[Packet]) -> Vec<u8> {
    packets
        .iter()
        .flat_map(|p| p.payload.iter().copied())
        .collect()
}
