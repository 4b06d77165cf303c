use std::io;

/// Errors that can occur on the serial transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The serial endpoint could not be opened.
    #[error("link unavailable at {address}: {source}")]
    LinkUnavailable {
        address: String,
        source: tokio_serial::Error,
    },
}

impl TransportError {
    /// The OS error kind behind the failure, when there is one.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            TransportError::LinkUnavailable { source, .. } => match source.kind {
                tokio_serial::ErrorKind::Io(kind) => Some(kind),
                _ => None,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
