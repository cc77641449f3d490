//! WebSocket client binding using `tokio-tungstenite`.
//!
//! Calls made through the returned [`ChannelTransport`] are drained by a
//! background driver task that owns the socket. Frames are encoded with
//! the supplied [`Codec`]: [`ClientMessage`] out, [`InboundEvent`] in.
//!
//! Lifecycle events the service can't send itself are synthesized here:
//!
//! - `connect()` → `ConnectionEstablished` once the handshake completes
//! - `disconnect()` or a remote close → `ConnectionLost`
//! - socket, encode, and decode errors → `TransportFault`, as is a frame
//!   that carries one of the events above

use futures_util::{SinkExt, StreamExt};
use relaybot_protocol::{ClientMessage, Codec, InboundEvent, ProtocolError};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{ChannelTransport, Outbound, TransportError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A WebSocket client [`Transport`](crate::Transport).
///
/// This is only a constructor: the transport handle itself is a
/// [`ChannelTransport`] whose queue is served by the driver task.
pub struct WebSocketTransport;

impl WebSocketTransport {
    /// Spawns a driver for `url` and returns the transport handle plus the
    /// stream of inbound events.
    ///
    /// Nothing is dialed until [`Transport::connect`](crate::Transport::connect)
    /// is called. The driver exits when the handle (and all its clones) is
    /// dropped or the event receiver is dropped.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<C: Codec>(
        url: impl Into<String>,
        codec: C,
    ) -> (ChannelTransport, mpsc::UnboundedReceiver<InboundEvent>) {
        let (transport, calls) = ChannelTransport::new();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let driver = Driver {
            url: url.into(),
            codec,
            socket: None,
            events: events_tx,
        };
        tokio::spawn(driver.run(calls));
        (transport, events_rx)
    }
}

/// Owns the socket. One call or one frame is handled at a time, so events
/// reach the receiver in the order they happened.
struct Driver<C> {
    url: String,
    codec: C,
    socket: Option<WsStream>,
    events: mpsc::UnboundedSender<InboundEvent>,
}

impl<C: Codec> Driver<C> {
    async fn run(mut self, mut calls: mpsc::UnboundedReceiver<Outbound>) {
        loop {
            let keep_going = tokio::select! {
                call = calls.recv() => match call {
                    Some(call) => self.handle_call(call).await,
                    None => false,
                },
                frame = next_frame(&mut self.socket) => {
                    self.handle_frame(frame)
                }
            };
            if !keep_going {
                break;
            }
        }

        if let Some(mut ws) = self.socket.take() {
            let _ = ws.close(None).await;
        }
        tracing::debug!(url = %self.url, "WebSocket driver stopped");
    }

    /// Returns `false` once nobody is listening for events anymore.
    async fn handle_call(&mut self, call: Outbound) -> bool {
        match call {
            Outbound::Connect => {
                // A re-dial replaces the old socket without reporting a
                // ConnectionLost for it.
                if let Some(mut old) = self.socket.take() {
                    let _ = old.close(None).await;
                }
                match tokio_tungstenite::connect_async(self.url.as_str()).await
                {
                    Ok((ws, _response)) => {
                        tracing::debug!(url = %self.url, "WebSocket connected");
                        self.socket = Some(ws);
                        self.emit(InboundEvent::ConnectionEstablished)
                    }
                    Err(e) => self.fault(TransportError::ConnectFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionRefused,
                            e,
                        ),
                    )),
                }
            }
            Outbound::Disconnect => {
                if let Some(mut ws) = self.socket.take() {
                    if let Err(e) = ws.close(None).await {
                        tracing::debug!(error = %e, "close handshake failed");
                    }
                }
                self.emit(InboundEvent::ConnectionLost)
            }
            Outbound::Send(message) => match self.send(&message).await {
                Ok(()) => true,
                Err(e) => self.fault(e),
            },
        }
    }

    async fn send(
        &mut self,
        message: &ClientMessage,
    ) -> Result<(), TransportError> {
        let ws = self.socket.as_mut().ok_or_else(|| {
            TransportError::ConnectionClosed("not connected".into())
        })?;
        let bytes = self.codec.encode(message)?;
        ws.send(Message::Binary(bytes.into())).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn handle_frame(
        &mut self,
        frame: Option<Result<Message, tungstenite::Error>>,
    ) -> bool {
        let data = match frame {
            Some(Ok(Message::Binary(data))) => data.to_vec(),
            Some(Ok(Message::Text(text))) => text.as_bytes().to_vec(),
            Some(Ok(Message::Close(_))) | None => {
                self.socket = None;
                return self.emit(InboundEvent::ConnectionLost);
            }
            Some(Ok(_)) => return true, // ping/pong/raw frame
            Some(Err(e)) => {
                self.socket = None;
                return self.fault(TransportError::ReceiveFailed(
                    std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    ),
                ));
            }
        };

        match self.codec.decode::<InboundEvent>(&data) {
            Ok(event) if is_synthesized(&event) => {
                self.fault(TransportError::from(ProtocolError::InvalidMessage(
                    format!("{} is not sent by the service", event.kind()),
                )))
            }
            Ok(event) => self.emit(event),
            Err(e) => self.fault(e.into()),
        }
    }

    fn fault(&self, error: TransportError) -> bool {
        self.emit(InboundEvent::TransportFault {
            message: error.to_string(),
        })
    }

    fn emit(&self, event: InboundEvent) -> bool {
        self.events.send(event).is_ok()
    }
}

/// Events only this driver may produce. A frame carrying one is rejected.
fn is_synthesized(event: &InboundEvent) -> bool {
    matches!(
        event,
        InboundEvent::ConnectionEstablished
            | InboundEvent::ConnectionLost
            | InboundEvent::TransportFault { .. }
    )
}

/// Waits for the next frame, or forever when no socket is open.
async fn next_frame(
    socket: &mut Option<WsStream>,
) -> Option<Result<Message, tungstenite::Error>> {
    match socket {
        Some(ws) => ws.next().await,
        None => std::future::pending().await,
    }
}
