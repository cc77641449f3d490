//! Session management for relaybot.
//!
//! This crate owns everything about *being logged on*:
//!
//! 1. **Session state**: who the bot logs on as and where the connection
//!    stands ([`Session`], [`ConnectionStatus`])
//! 2. **The logon state machine**: connect → authenticate → challenge →
//!    confirm ([`SessionMachine`])
//! 3. **The credential store**: persisting the device-trust token
//!    ("sentry") across restarts ([`SentryStore`])
//!
//! The machine is sans-IO: it never touches the transport. Each handler
//! returns what the caller has to do next (a [`LogonRequest`] to send, an
//! [`AuthOutcome`] to act on), which keeps every transition testable
//! without a network.
//!
//! # How it fits in the stack
//!
//! ```text
//! Router (above)  ← feeds events in, performs the returned actions
//!     ↕
//! Session Layer (this crate)  ← connection status, credentials, sentry
//!     ↕
//! Protocol Layer (below)  ← provides LogonRequest, LogonResult
//! ```
//!
//! [`LogonRequest`]: relaybot_protocol::LogonRequest

mod error;
mod machine;
mod sentry;
mod session;

pub use error::SessionError;
pub use machine::{AuthOutcome, SessionMachine};
pub use sentry::{FileSentryStore, MemorySentryStore, SentryStore, TrustToken};
pub use session::{ConnectionStatus, Credentials, LogonFailure, Session};
