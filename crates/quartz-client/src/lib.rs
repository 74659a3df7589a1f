//! Connection management for Quartz protocol routers.
//!
//! [`QuartzClient`] owns one TCP connection. Commands are validated and
//! written on the caller's thread; a background receiver decodes everything
//! the router sends into a bounded queue the caller drains.
//!
//! There is no request/response correlation, no retry and no reconnection.

pub mod client;
pub mod config;
pub mod error;
pub mod link;
pub mod receiver;

pub use client::QuartzClient;
pub use config::{ClientConfig, DEFAULT_QUEUE_CAPACITY, DEFAULT_READ_POLL_INTERVAL};
pub use error::{ClientError, Result};
pub use link::{ConnectionState, Link};
pub use receiver::{ReceiverCounters, ReceiverStats, RECEIVER_THREAD_NAME};
