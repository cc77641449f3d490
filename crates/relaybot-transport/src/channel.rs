//! Queue-backed [`Transport`]: each call becomes an [`Outbound`] value.

use relaybot_protocol::{
    AppMessageHeader, ChatEntryType, ClientMessage, LogonRequest, PeerId,
    PersonaState,
};
use tokio::sync::mpsc;

use crate::{Transport, TransportError};

/// A transport call, as queued by [`ChannelTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Dial (or re-dial) the service.
    Connect,
    /// Close the connection.
    Disconnect,
    /// Send a frame over the open connection.
    Send(ClientMessage),
}

/// A [`Transport`] that queues calls instead of performing them.
///
/// Whoever holds the receiver decides what a call means: the WebSocket
/// driver performs them, tests just assert on them. The queue is
/// unbounded so issuing a call never blocks the event loop.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ChannelTransport {
    /// Creates a transport and the receiving end of its call queue.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn push(&self, call: Outbound) -> Result<(), TransportError> {
        self.tx.send(call).map_err(|_| TransportError::Shutdown)
    }
}

impl Transport for ChannelTransport {
    type Error = TransportError;

    async fn connect(&self) -> Result<(), Self::Error> {
        self.push(Outbound::Connect)
    }

    async fn disconnect(&self) -> Result<(), Self::Error> {
        self.push(Outbound::Disconnect)
    }

    async fn authenticate(
        &self,
        request: &LogonRequest,
    ) -> Result<(), Self::Error> {
        self.push(Outbound::Send(ClientMessage::Logon(request.clone())))
    }

    async fn set_persona_state(
        &self,
        state: PersonaState,
    ) -> Result<(), Self::Error> {
        self.push(Outbound::Send(ClientMessage::SetPersonaState { state }))
    }

    async fn send_chat(
        &self,
        to: &PeerId,
        text: &str,
    ) -> Result<(), Self::Error> {
        self.push(Outbound::Send(ClientMessage::ChatMessage {
            to: to.clone(),
            text: text.to_string(),
            entry_type: ChatEntryType::ChatMsg,
        }))
    }

    async fn send_app_message(
        &self,
        header: AppMessageHeader,
        body: Vec<u8>,
    ) -> Result<(), Self::Error> {
        self.push(Outbound::Send(ClientMessage::ApplicationMessage {
            header,
            body,
        }))
    }
}
