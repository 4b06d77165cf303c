//! Serial endpoint transport for the inklink display link.
//!
//! Owns the duplex byte stream to the radio bridge. This is the lowest layer
//! of inklink and the only one that touches raw bytes on the endpoint:
//! - [`open`] connects to a serial port at a given baud rate
//! - [`Connection`] wraps any async duplex stream, so tests can swap the
//!   port for an in-memory pipe
//!
//! There is no reconnect logic. A failed read or write is returned to the
//! caller and the connection is considered dead.

pub mod connection;
pub mod error;
pub mod serial;

pub use connection::Connection;
pub use error::{Result, TransportError};
pub use serial::{open, SerialConnection, SerialStream, DEFAULT_BAUD_RATE};
