use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tracing::debug;

/// The open duplex byte stream to the radio bridge.
///
/// There is exactly one `Connection` per physical endpoint. It is split once:
/// the read half feeds the control dispatcher, the write half belongs to the
/// sender. Both halves live as long as the link does.
pub struct Connection<S> {
    stream: S,
    label: String,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite,
{
    /// Wrap an already-open duplex stream.
    ///
    /// `label` is used for diagnostics only (the port path for serial links).
    pub fn from_stream(stream: S, label: impl Into<String>) -> Self {
        Self {
            stream,
            label: label.into(),
        }
    }

    /// Human-readable name of the endpoint.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Split into independently owned read and write halves.
    pub fn split(self) -> (ReadHalf<S>, WriteHalf<S>) {
        debug!(label = %self.label, "splitting connection");
        tokio::io::split(self.stream)
    }
}

impl<S> std::fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("label", &self.label)
            .finish()
    }
}
