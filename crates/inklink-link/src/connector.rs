use inklink_transport::{open, SerialStream};
use tokio::io::WriteHalf;

use crate::config::LinkConfig;
use crate::error::Result;
use crate::link::Link;

/// A link running over a native serial port.
pub type SerialLink = Link<WriteHalf<SerialStream>>;

/// Open the serial endpoint and start a link with default configuration.
pub fn connect(address: &str, baud: u32) -> Result<SerialLink> {
    connect_with_config(address, baud, LinkConfig::default())
}

/// Open the serial endpoint and start a link with explicit configuration.
///
/// Must be called from within a tokio runtime.
pub fn connect_with_config(address: &str, baud: u32, config: LinkConfig) -> Result<SerialLink> {
    let connection = open(address, baud)?;
    Ok(Link::start(connection, config))
}

#[cfg(test)]
mod tests {
    use inklink_transport::{TransportError, DEFAULT_BAUD_RATE};

    use super::*;
    use crate::error::LinkError;

    #[tokio::test]
    async fn connect_to_missing_port_fails_without_spawning() {
        let address = format!("/dev/inklink-absent-{}", std::process::id());
        let err = connect(&address, DEFAULT_BAUD_RATE).expect_err("port should not exist");
        assert!(matches!(
            err,
            LinkError::Transport(TransportError::LinkUnavailable { .. })
        ));
    }
}
