//! TCP transport for Quartz router control connections.
//!
//! This is the lowest layer of the workspace. It dials the router, hands out
//! the connected [`RouterStream`] and nothing else: framing, decoding and
//! connection state live in the crates built on top of it.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::RouterStream;
pub use tcp::{connect, connect_with_timeout};
