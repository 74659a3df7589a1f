//! Control client for video routers speaking the Quartz ASCII protocol.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP connection to the router control port
//! - [`frame`]: Frame extraction plus response and command codecs
//! - [`client`]: Connection lifecycle and background receiver (behind `client` feature)

/// Re-export transport types.
pub mod transport {
    pub use quartz_transport::*;
}

/// Re-export frame and codec types.
pub mod frame {
    pub use quartz_frame::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use quartz_client::*;
}

#[cfg(feature = "client")]
pub use quartz_client::{ClientConfig, ClientError, QuartzClient};
pub use quartz_frame::{Command, DeviceMode, Level, LevelSet, Response, ResponseKind, Timecode};
