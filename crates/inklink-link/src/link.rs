use std::sync::Mutex as StdMutex;
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use futures_util::SinkExt;
use inklink_frame::{
    chunks, frame, with_length_header, DeviceLine, Packet, PacketCodec, ACK, MAX_PACKET_SIZE,
};
use inklink_payload::{encode_image, Bitmap, HibernationCommand};
use inklink_transport::Connection;
use tokio::io::{AsyncRead, AsyncWrite, WriteHalf};
use tokio::sync::{broadcast, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio_util::codec::FramedWrite;
use tracing::{debug, info, warn};

use crate::config::LinkConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{LinkError, Result};
use crate::signal::{ControlSignals, SignalWaiter};

type PacketSink<W> = FramedWrite<W, PacketCodec>;

/// Summary of one completed transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmissionReport {
    /// Receiving display.
    pub device_id: u8,
    /// Bytes sent, including the 2-byte length header.
    pub bytes: usize,
    /// Packets sent (each one acknowledged).
    pub packets: usize,
}

/// Outcome of [`Link::update_and_hibernate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateReport {
    /// The image transmission.
    pub image: TransmissionReport,
    /// The hibernation command that followed it.
    pub hibernation: HibernationCommand,
}

/// The host end of one radio bridge.
///
/// All transmissions queue on one admission lock, which guards the write
/// half: packets of one transmission are always contiguous on the wire.
/// The control dispatcher runs as a background task and is aborted when the
/// link is dropped.
///
/// Share between tasks with `Arc<Link<_>>`.
pub struct Link<W> {
    writer: Mutex<PacketSink<W>>,
    signals: ControlSignals,
    lines: broadcast::Receiver<DeviceLine>,
    dispatcher: StdMutex<Option<JoinHandle<Result<()>>>>,
    config: LinkConfig,
}

impl<S> Link<WriteHalf<S>>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Split a connection and start the link on it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(connection: Connection<S>, config: LinkConfig) -> Self {
        info!(endpoint = %connection.label(), "starting link");
        let (reader, writer) = connection.split();
        Self::from_parts(reader, writer, config)
    }
}

impl<W> Link<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Start a link from separate read and write halves.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_parts<R>(reader: R, writer: W, config: LinkConfig) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (dispatcher, signals, lines) = Dispatcher::new(reader, &config);
        let handle = tokio::spawn(dispatcher.run());

        Self {
            writer: Mutex::new(FramedWrite::new(writer, PacketCodec)),
            signals,
            lines,
            dispatcher: StdMutex::new(Some(handle)),
            config,
        }
    }

    /// Link configuration.
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Handle on the control signals, for callers that watch notifications.
    pub fn signals(&self) -> &ControlSignals {
        &self.signals
    }

    /// Receive every line the device prints from now on.
    pub fn subscribe_lines(&self) -> broadcast::Receiver<DeviceLine> {
        self.lines.resubscribe()
    }

    /// Send one packet and wait for its ACK.
    pub async fn send_packet(&self, packet: Packet) -> Result<()> {
        let mut writer = self.admit().await?;
        self.transmit(&mut writer, &packet).await
    }

    /// Send an arbitrarily large buffer to `device_id`.
    ///
    /// The buffer gets a 2-byte little-endian length header and is split into
    /// packet-sized chunks, each acknowledged before the next is sent. The
    /// link is held for the whole transmission.
    pub async fn send_data(&self, buffer: &[u8], device_id: u8) -> Result<TransmissionReport> {
        let framed = with_length_header(buffer)?;
        let total = framed.len();
        let packets = chunks(&framed, MAX_PACKET_SIZE).len();

        let mut writer = self.admit().await?;
        if packets == 1 {
            info!(device_id, bytes = total, "sending data in one packet");
        } else {
            info!(device_id, bytes = total, packets, "sending data in chunks");
        }

        let mut sent = 0usize;
        for (index, chunk) in chunks(&framed, MAX_PACKET_SIZE).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.chunk_delay).await;
            }
            sent += chunk.len();
            let packet = frame(chunk, device_id)?;
            self.transmit(&mut writer, &packet).await?;
            debug!(device_id, sent, total, "chunk acknowledged");
        }

        info!(device_id, bytes = total, packets, "transmission finished");
        Ok(TransmissionReport {
            device_id,
            bytes: total,
            packets,
        })
    }

    /// Compress a bitmap and send it to `device_id`.
    pub async fn send_image(&self, bitmap: &Bitmap, device_id: u8) -> Result<TransmissionReport> {
        let payload = encode_image(bitmap)?;
        self.send_data(&payload, device_id).await
    }

    /// Tell `device_id` to sleep until `until`.
    ///
    /// Queues on the same admission lock as data transmissions, so it never
    /// lands between the chunks of another transmission.
    pub async fn send_hibernation_request(
        &self,
        until: SystemTime,
        device_id: u8,
    ) -> Result<HibernationCommand> {
        let mut writer = self.admit().await?;
        // Measured after admission, when the packet is about to go out.
        let command = HibernationCommand::until(until, SystemTime::now());
        let packet = frame(Bytes::copy_from_slice(&command.to_bytes()), device_id)?;
        info!(
            device_id,
            seconds = command.seconds_until_wakeup,
            "sending hibernation request"
        );
        self.transmit(&mut writer, &packet).await?;
        Ok(command)
    }

    /// Push a new image, give the display `settle` to refresh, then send it
    /// to sleep until `until`.
    pub async fn update_and_hibernate(
        &self,
        bitmap: &Bitmap,
        device_id: u8,
        until: SystemTime,
        settle: Duration,
    ) -> Result<UpdateReport> {
        let image = self.send_image(bitmap, device_id).await?;
        tokio::time::sleep(settle).await;
        let hibernation = self.send_hibernation_request(until, device_id).await?;
        Ok(UpdateReport { image, hibernation })
    }

    /// Wait for the next raise of a control signal.
    pub async fn wait_for_control(&self, name: &str, timeout: Option<Duration>) -> Result<()> {
        let waiter = self.signals.arm(name)?;
        match timeout {
            Some(limit) => tokio::time::timeout(limit, waiter.wait())
                .await
                .map_err(|_| LinkError::ControlTimeout {
                    name: name.to_string(),
                    timeout: limit,
                })?,
            None => waiter.wait().await,
        }
    }

    /// Wait for the dispatcher to stop and return why it stopped.
    ///
    /// Only the first caller observes the outcome; later calls return
    /// [`LinkError::DispatcherStopped`].
    pub async fn join_dispatcher(&self) -> Result<()> {
        let handle = self
            .dispatcher
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        match handle {
            Some(handle) => handle.await.unwrap_or(Err(LinkError::DispatcherStopped)),
            None => Err(LinkError::DispatcherStopped),
        }
    }

    async fn admit(&self) -> Result<MutexGuard<'_, PacketSink<W>>> {
        match self.config.admission_timeout {
            Some(limit) => tokio::time::timeout(limit, self.writer.lock())
                .await
                .map_err(|_| LinkError::AdmissionTimeout(limit)),
            None => Ok(self.writer.lock().await),
        }
    }

    async fn transmit(&self, writer: &mut PacketSink<W>, packet: &Packet) -> Result<()> {
        let attempts = self.config.retry.attempts();
        let mut attempt = 1;
        loop {
            // Arm before writing so an ACK for an earlier packet cannot count.
            let ack = self.signals.arm(ACK)?;
            writer.send(packet.clone()).await?;
            debug!(
                device_id = packet.device_id,
                len = packet.payload.len(),
                attempt,
                "packet sent, awaiting ACK"
            );

            if self.await_ack(ack).await? {
                return Ok(());
            }

            let timeout = self.config.ack_timeout.unwrap_or_default();
            if attempt >= attempts {
                return Err(LinkError::AckTimeout {
                    device_id: packet.device_id,
                    timeout,
                    attempts: attempt,
                });
            }

            let backoff = self.config.retry.backoff_for(attempt);
            warn!(
                device_id = packet.device_id,
                attempt,
                ?backoff,
                "no ACK, resending packet"
            );
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }

    /// `Ok(false)` on timeout.
    async fn await_ack(&self, ack: SignalWaiter) -> Result<bool> {
        match self.config.ack_timeout {
            Some(limit) => match tokio::time::timeout(limit, ack.wait()).await {
                Ok(outcome) => outcome.map(|()| true),
                Err(_) => Ok(false),
            },
            None => ack.wait().await.map(|()| true),
        }
    }
}

impl<W> Drop for Link<W> {
    fn drop(&mut self) {
        let handle = self
            .dispatcher
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl<W> std::fmt::Debug for Link<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("signals", &self.signals)
            .field("config", &self.config)
            .finish()
    }
}
