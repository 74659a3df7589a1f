use std::time::Duration;

use quartz_frame::{DeviceMode, FrameConfig, DEFAULT_MAX_FRAME_LEN};
use serde::Serialize;

/// Responses buffered before the receiver stops reading.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Upper bound on how long a stopped receiver keeps blocking in a read.
pub const DEFAULT_READ_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Construction-time client configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ClientConfig {
    /// Router host name or IP address.
    pub address: String,
    /// Router control port.
    pub port: u16,
    /// Device capability profile.
    pub mode: DeviceMode,
    /// Capacity of the bounded response queue.
    pub queue_capacity: usize,
    /// Dial timeout. `None` blocks until the OS gives up.
    pub connect_timeout: Option<Duration>,
    /// Socket write timeout.
    pub write_timeout: Option<Duration>,
    /// Receiver read timeout; bounds how long a stop request can go unnoticed.
    pub read_poll_interval: Duration,
    /// Longest pending frame kept while waiting for its terminator.
    pub max_frame_len: usize,
}

impl ClientConfig {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            mode: DeviceMode::Standard,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            connect_timeout: None,
            write_timeout: None,
            read_poll_interval: DEFAULT_READ_POLL_INTERVAL,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    pub fn with_mode(mut self, mode: DeviceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_restricted(self, restricted: bool) -> Self {
        self.with_mode(DeviceMode::from_restricted(restricted))
    }

    /// Zero is raised to one; a rendezvous queue would stall the receiver on every frame.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn with_read_poll_interval(mut self, interval: Duration) -> Self {
        self.read_poll_interval = interval;
        self
    }

    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    /// Frame settings for the receiver side of the connection.
    pub(crate) fn reader_frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_frame_len: self.max_frame_len,
            // A zero timeout is rejected by the socket layer.
            read_timeout: Some(self.read_poll_interval.max(Duration::from_millis(1))),
            write_timeout: None,
        }
    }

    /// Frame settings for the command side of the connection.
    pub(crate) fn writer_frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_frame_len: self.max_frame_len,
            read_timeout: None,
            write_timeout: self.write_timeout,
        }
    }
}
