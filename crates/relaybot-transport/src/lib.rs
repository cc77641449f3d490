//! Transport abstraction layer for relaybot.
//!
//! The bot core never touches sockets. It talks to the remote service
//! through the [`Transport`] trait and receives pushed
//! [`InboundEvent`](relaybot_protocol::InboundEvent)s from whatever
//! binding is plugged in.
//!
//! # Bindings
//!
//! - [`ChannelTransport`]: turns every call into an [`Outbound`] value
//!   on an unbounded queue. Used by tests and as the front half of the
//!   WebSocket binding.
//! - `WebSocketTransport` (feature `websocket`, default): a client that
//!   drains that queue into a WebSocket and pushes decoded events back.

#![allow(async_fn_in_trait)]

mod channel;
mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use channel::{ChannelTransport, Outbound};
pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::WebSocketTransport;

use relaybot_protocol::{AppMessageHeader, LogonRequest, PeerId, PersonaState};

/// Outgoing side of a connection to the remote session service.
///
/// Every method only *issues* the call; results come back later as
/// inbound events (`ConnectionEstablished`, `AuthResult`, ...). An `Err`
/// means the call could not even be handed to the transport.
pub trait Transport: Send + Sync + 'static {
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Dials the service, replacing any existing connection.
    async fn connect(&self) -> Result<(), Self::Error>;

    /// Closes the connection in an orderly way.
    async fn disconnect(&self) -> Result<(), Self::Error>;

    /// Sends a logon request over the open connection.
    async fn authenticate(
        &self,
        request: &LogonRequest,
    ) -> Result<(), Self::Error>;

    /// Sets the bot's own visible presence.
    async fn set_persona_state(
        &self,
        state: PersonaState,
    ) -> Result<(), Self::Error>;

    /// Sends a plain chat message to a peer.
    async fn send_chat(&self, to: &PeerId, text: &str)
    -> Result<(), Self::Error>;

    /// Sends a message on the application channel.
    async fn send_app_message(
        &self,
        header: AppMessageHeader,
        body: Vec<u8>,
    ) -> Result<(), Self::Error>;
}
