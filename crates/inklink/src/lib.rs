//! Drive battery-powered e-paper displays over a LoRa serial bridge.
//!
//! The host talks to a radio bridge on a serial port. Every packet it sends
//! is relayed to one display, and the display answers each packet with a
//! `CONTROL:ACK` line before the next one may go out.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial endpoint and the duplex connection wrapper
//! - [`frame`]: packet framing, buffer chunking and the device line codec
//! - [`payload`]: the 1-bit display bitmap, image compression and the
//!   hibernation command
//! - [`link`]: ACK-gated sending, admission control and the control
//!   dispatcher
//!
//! ```no_run
//! use std::time::{Duration, SystemTime};
//!
//! use inklink::link::connect;
//! use inklink::payload::Bitmap;
//!
//! # async fn run() -> Result<(), inklink::link::LinkError> {
//! let link = connect("/dev/ttyUSB0", inklink::transport::DEFAULT_BAUD_RATE)?;
//! let wake = SystemTime::now() + Duration::from_secs(3600);
//! link.update_and_hibernate(&Bitmap::new(), 2, wake, Duration::from_secs(10))
//!     .await?;
//! # Ok(())
//! # }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use inklink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use inklink_frame::*;
}

/// Re-export payload types.
pub mod payload {
    pub use inklink_payload::*;
}

/// Re-export link types.
pub mod link {
    pub use inklink_link::*;
}
