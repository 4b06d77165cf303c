//! ACK-gated flow control for inklink displays.
//!
//! This is the layer callers use. A [`Link`] owns the write half of the
//! serial connection behind an admission lock and runs a [`Dispatcher`] on
//! the read half. Every packet waits for the display's `CONTROL:ACK` before
//! the next one goes out.

pub mod config;
pub mod connector;
pub mod dispatcher;
pub mod error;
pub mod link;
pub mod signal;

#[cfg(test)]
mod mock;

pub use config::{LinkConfig, RetryPolicy};
pub use connector::{connect, connect_with_config, SerialLink};
pub use dispatcher::Dispatcher;
pub use error::{LinkError, Result};
pub use link::{Link, TransmissionReport, UpdateReport};
pub use signal::{ControlSignals, SignalRegistry, SignalState, SignalWaiter};
