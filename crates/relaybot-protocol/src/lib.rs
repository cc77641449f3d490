//! Wire protocol for relaybot.
//!
//! This crate defines what travels between the bot and the remote
//! session service:
//!
//! - **Types** ([`InboundEvent`], [`ClientMessage`], [`LogonRequest`],
//!   [`PeerPresence`], etc.): pushed events and outgoing requests.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those values are
//!   converted to/from bytes, both for whole frames and for the opaque
//!   application-message bodies.
//! - **Errors** ([`ProtocolError`]): what can go wrong while encoding or
//!   decoding.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about sockets or session state. It
//! sits underneath both:
//!
//! ```text
//! Transport (frames) → Protocol (InboundEvent) → Session / Router
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ActivityId, AppMessageHeader, AppMessageId, ChatEntryType, ClientMessage,
    InboundEvent, LogonRequest, LogonResult, PeerId, PeerPresence,
    PersonaState, SpectateFriendGame, SpectateFriendGameResponse,
};
