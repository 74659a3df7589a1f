use std::time::Duration;

/// Errors that can occur in client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error while connecting or shutting down.
    #[error("transport error: {0}")]
    Transport(#[from] quartz_transport::TransportError),

    /// Frame-level error while writing a command.
    #[error("frame error: {0}")]
    Frame(#[from] quartz_frame::FrameError),

    /// The command failed validation; nothing was sent.
    #[error("invalid command: {0}")]
    Command(#[from] quartz_frame::CommandError),

    /// A command was issued without an open connection.
    #[error("not connected")]
    NotConnected,

    /// `connect` was called on an open connection.
    #[error("already connected")]
    AlreadyConnected,

    /// The connection ended and no more responses will arrive.
    #[error("connection closed by router")]
    Disconnected,

    /// No response arrived in time.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// The receiver thread could not be started.
    #[error("failed to spawn receiver: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
