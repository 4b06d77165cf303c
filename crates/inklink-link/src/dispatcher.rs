//! Background reader for the bridge's text channel.
//!
//! Runs for the lifetime of the link: reads lines, raises control signals,
//! and logs everything else as device output. Stream closure or a read
//! error ends the loop and is returned to whoever joins the task.

use futures_util::StreamExt;
use inklink_frame::{ControlLineCodec, DeviceLine};
use tokio::io::AsyncRead;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tokio_util::codec::FramedRead;
use tracing::{debug, error, info, warn};

use crate::config::LinkConfig;
use crate::error::{LinkError, Result};
use crate::signal::{ControlSignals, SignalRegistry};

/// Reads device lines and publishes control signals.
pub struct Dispatcher<R> {
    lines: FramedRead<R, ControlLineCodec>,
    registry: SignalRegistry,
    observers: broadcast::Sender<DeviceLine>,
}

impl<R> Dispatcher<R>
where
    R: AsyncRead + Unpin,
{
    /// Build a dispatcher over the read half of a connection.
    ///
    /// Returns the dispatcher, the signal handle for senders, and a receiver
    /// that sees every decoded line.
    pub fn new(
        reader: R,
        config: &LinkConfig,
    ) -> (Self, ControlSignals, broadcast::Receiver<DeviceLine>) {
        let (registry, signals) =
            SignalRegistry::new(config.extra_signals.iter().cloned(), config.signal_clear_delay);
        let (observers, lines_rx) = broadcast::channel(config.line_buffer.max(1));
        let lines = FramedRead::new(
            reader,
            ControlLineCodec::with_max_length(config.max_line_length),
        );

        (
            Self {
                lines,
                registry,
                observers,
            },
            signals,
            lines_rx,
        )
    }

    /// Run until the stream ends.
    ///
    /// Never returns `Ok`: the loop only stops on closure
    /// ([`LinkError::LinkClosed`]) or a read error.
    pub async fn run(mut self) -> Result<()> {
        debug!("control dispatcher started");
        loop {
            let next_clear = self.registry.next_clear();

            tokio::select! {
                line = self.lines.next() => match line {
                    Some(Ok(line)) => self.handle(line),
                    Some(Err(err)) => {
                        error!(error = %err, "control dispatcher read failed");
                        return Err(err.into());
                    }
                    None => {
                        warn!("bridge closed the link");
                        return Err(LinkError::LinkClosed);
                    }
                },
                _ = tokio::time::sleep_until(next_clear.unwrap_or_else(Instant::now)),
                    if next_clear.is_some() =>
                {
                    self.registry.clear_expired(Instant::now());
                }
            }
        }
    }

    fn handle(&mut self, line: DeviceLine) {
        match &line {
            DeviceLine::Control(name) => match self.registry.raise(name, Instant::now()) {
                Ok(generation) => debug!(signal = %name, generation, "control signal raised"),
                Err(_) => warn!(signal = %name, "got unknown control message"),
            },
            DeviceLine::Log(text) => info!(target: "device", "{text}"),
        }
        // No subscribers is the normal case.
        let _ = self.observers.send(line);
    }
}
