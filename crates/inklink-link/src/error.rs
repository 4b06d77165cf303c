use std::time::Duration;

/// Errors that can occur on an inklink link.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] inklink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] inklink_frame::FrameError),

    /// Payload encoding error.
    #[error("payload error: {0}")]
    Payload(#[from] inklink_payload::PayloadError),

    /// A wait was requested for a control signal that is not registered.
    #[error("unknown control signal: {0}")]
    UnknownControlSignal(String),

    /// The display did not acknowledge a packet in time.
    #[error("no ACK from device {device_id} within {timeout:?} after {attempts} attempt(s)")]
    AckTimeout {
        device_id: u8,
        timeout: Duration,
        attempts: u32,
    },

    /// A control signal did not arrive in time.
    #[error("control signal {name} not received within {timeout:?}")]
    ControlTimeout { name: String, timeout: Duration },

    /// Another transmission held the link for too long.
    #[error("link busy: admission not granted within {0:?}")]
    AdmissionTimeout(Duration),

    /// The dispatcher has stopped, so no control signal can arrive.
    #[error("control dispatcher stopped")]
    DispatcherStopped,

    /// The bridge closed the stream.
    #[error("link closed by remote end")]
    LinkClosed,
}

pub type Result<T> = std::result::Result<T, LinkError>;
