//! Unified error type for relaybot.

use relaybot_protocol::ProtocolError;
use relaybot_session::SessionError;
use relaybot_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The router itself never returns one: transport, storage, and parse
/// faults are logged where they happen. This type is for setup
/// ([`RelayBotBuilder::build`](crate::RelayBotBuilder::build),
/// [`RelayBot::start`](crate::RelayBot::start)) and for callers that
/// drive the sub-crates directly.
#[derive(Debug, thiserror::Error)]
pub enum RelaybotError {
    /// A transport-level error (connect, send, shutdown).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (storage, invalid transition).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The builder was never given an account to log on as.
    #[error("no credentials configured")]
    MissingCredentials,
}
