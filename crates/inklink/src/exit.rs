use std::fmt;
use std::io;

use inklink_frame::FrameError;
use inklink_link::LinkError;
use inklink_payload::PayloadError;
use inklink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::NotFound => USAGE,
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = match err.io_kind() {
        Some(io::ErrorKind::PermissionDenied) => PERMISSION_DENIED,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::InvalidLength => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn payload_error(context: &str, err: PayloadError) -> CliError {
    match err {
        PayloadError::Compression(_) => CliError::new(INTERNAL, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn link_error(context: &str, err: LinkError) -> CliError {
    match err {
        LinkError::Transport(err) => transport_error(context, err),
        LinkError::Frame(err) => frame_error(context, err),
        LinkError::Payload(err) => payload_error(context, err),
        LinkError::UnknownControlSignal(_) => CliError::usage(format!("{context}: {err}")),
        LinkError::AckTimeout { .. }
        | LinkError::ControlTimeout { .. }
        | LinkError::AdmissionTimeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        LinkError::LinkClosed | LinkError::DispatcherStopped => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn ack_timeout_maps_to_timeout_code() {
        let err = link_error(
            "send failed",
            LinkError::AckTimeout {
                device_id: 4,
                timeout: Duration::from_secs(30),
                attempts: 1,
            },
        );
        assert_eq!(err.code, TIMEOUT);
        assert!(err.message.starts_with("send failed: "));
    }

    #[test]
    fn oversized_buffer_is_invalid_data() {
        let err = link_error(
            "send failed",
            LinkError::Frame(FrameError::BufferTooLarge {
                size: 70_000,
                max: 65_535,
            }),
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn closed_link_is_a_transport_failure() {
        assert_eq!(link_error("monitor", LinkError::LinkClosed).code, TRANSPORT_ERROR);
    }

    #[test]
    fn io_kinds_map_to_codes() {
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(io_error("open", denied).code, PERMISSION_DENIED);

        let missing = io::Error::new(io::ErrorKind::NotFound, "missing");
        assert_eq!(io_error("open", missing).code, USAGE);
    }
}
