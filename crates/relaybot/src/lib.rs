//! # relaybot
//!
//! A long-lived client bot for a session-oriented chat service.
//!
//! The bot logs on (handling second-factor challenges and a persisted
//! device-trust token), tracks its peers' presence, surfaces chat, and
//! turns operator command lines into outgoing messages.
//!
//! This crate ties the layers together:
//!
//! ```text
//! relaybot (this crate)   ← RelayBot router, commands, severities
//!     ↕
//! relaybot-session        ← logon state machine, sentry storage
//! relaybot-presence       ← peer presence tracking
//!     ↕
//! relaybot-transport      ← Transport trait, WebSocket binding
//!     ↕
//! relaybot-protocol       ← wire types, codecs
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relaybot::prelude::*;
//!
//! # async fn run(console: &mut impl Console) -> Result<(), RelaybotError> {
//! let (transport, mut events) =
//!     WebSocketTransport::spawn("ws://127.0.0.1:27020", JsonCodec);
//! let mut bot = RelayBot::builder()
//!     .credentials("bot", "hunter2")
//!     .build(transport, FileSentryStore::new("sentry"))?;
//!
//! bot.start().await?;
//! while let Some(event) = events.recv().await {
//!     if bot.dispatch(event, console).await.is_break() {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![allow(async_fn_in_trait)]

mod builder;
mod commands;
mod console;
mod error;
mod router;
mod severity;

pub use builder::RelayBotBuilder;
pub use commands::{CommandError, CommandKind, LineOutcome, OutboundCommand};
pub use console::Console;
pub use error::RelaybotError;
pub use router::{CHALLENGE_PROMPT, InterfaceState, RelayBot};
pub use severity::{CHAT_TARGET, CRITICAL_TARGET, Severity};

pub use relaybot_presence as presence;
pub use relaybot_protocol as protocol;
pub use relaybot_session as session;
pub use relaybot_transport as transport;

/// Everything needed to build and drive a bot.
pub mod prelude {
    pub use crate::{
        CommandKind, Console, InterfaceState, LineOutcome, OutboundCommand,
        RelayBot, RelayBotBuilder, RelaybotError, Severity,
    };
    pub use relaybot_presence::{
        PresenceSnapshot, PresenceTracker, WatchedActivity,
    };
    pub use relaybot_protocol::{
        ActivityId, ChatEntryType, Codec, InboundEvent, JsonCodec,
        LogonResult, PeerId, PeerPresence, PersonaState,
    };
    pub use relaybot_session::{
        ConnectionStatus, FileSentryStore, LogonFailure, MemorySentryStore,
        SentryStore,
    };
    pub use relaybot_transport::{
        ChannelTransport, Outbound, Transport, TransportError,
        WebSocketTransport,
    };
}
