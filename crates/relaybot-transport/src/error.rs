/// Errors that can occur in the transport layer.
///
/// The router treats every one of these as non-fatal: it logs the error
/// and keeps processing events.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Dialing the remote service failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] relaybot_protocol::ProtocolError),

    /// The transport driver is gone; nothing is listening for calls.
    #[error("transport shut down")]
    Shutdown,
}
