pub use tokio_serial::SerialStream;
use tokio_serial::SerialPortBuilderExt;
use tracing::info;

use crate::connection::Connection;
use crate::error::{Result, TransportError};

/// Baud rate the radio bridge firmware ships with.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// A connection backed by a native serial port.
pub type SerialConnection = Connection<SerialStream>;

/// Open the serial endpoint at `address` (e.g. `/dev/ttyUSB0`).
///
/// Must be called from within a tokio runtime: the port is registered with
/// the reactor on open. Fails with [`TransportError::LinkUnavailable`] when
/// the port does not exist, is busy, or rejects the baud rate.
pub fn open(address: &str, baud: u32) -> Result<SerialConnection> {
    let stream = tokio_serial::new(address, baud)
        .open_native_async()
        .map_err(|source| TransportError::LinkUnavailable {
            address: address.to_string(),
            source,
        })?;

    info!(address, baud, "opened serial link");
    Ok(Connection::from_stream(stream, address))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_missing_port_is_link_unavailable() {
        let address = format!("/dev/inklink-missing-{}", std::process::id());
        let err = open(&address, DEFAULT_BAUD_RATE).expect_err("port should not exist");

        match err {
            TransportError::LinkUnavailable { address: got, .. } => assert_eq!(got, address),
            other => panic!("unexpected error: {other}"),
        }
    }
}
