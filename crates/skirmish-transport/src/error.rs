//! Error types for the transport layer.

/// Errors that can occur while moving framed messages over a connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The socket failed in a way that is not "try again later".
    #[error("socket error: {0}")]
    Io(#[source] std::io::Error),

    /// The peer closed the connection.
    #[error("peer disconnected")]
    Disconnected,

    /// A bounded wait elapsed before a whole message arrived.
    #[error("timed out waiting for message")]
    Timeout,
}
