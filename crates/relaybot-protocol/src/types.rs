//! Core protocol types for relaybot's wire format.
//!
//! Everything here is a value that crosses the transport boundary:
//! events pushed by the remote service ([`InboundEvent`]) and requests
//! sent by the bot ([`ClientMessage`]).

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifier of a peer (a friend of the bot's account).
///
/// The remote service hands these out as opaque strings; the operator
/// types them verbatim on the command line, so no parsing happens here.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl PeerId {
    /// Creates a `PeerId` from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of an application (game) a peer is currently running.
///
/// Serialized as a plain number, e.g. `570`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub u64);

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

/// A peer's visible online state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "PascalCase")]
pub enum PersonaState {
    #[default]
    Offline,
    Online,
    Busy,
    Away,
    Snooze,
    LookingToTrade,
    LookingToPlay,
    Invisible,
}

/// One presence push for a single peer.
///
/// The same shape is stored by the presence tracker, so a push is simply
/// the new record for that peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerPresence {
    pub peer_id: PeerId,
    pub state: PersonaState,
    /// The application the peer is running, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivityId>,
    /// Display name, when the service included one in this push.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl PeerPresence {
    /// A presence record with no activity and no display name.
    pub fn new(peer_id: impl Into<PeerId>, state: PersonaState) -> Self {
        Self {
            peer_id: peer_id.into(),
            state,
            activity: None,
            name: None,
        }
    }

    /// Sets the activity the peer is running.
    pub fn with_activity(mut self, activity: ActivityId) -> Self {
        self.activity = Some(activity);
        self
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// The sub-type of a chat entry.
///
/// Travels as the service's numeric code. Codes this crate doesn't name
/// are kept in [`ChatEntryType::Other`] rather than rejected, so a new
/// notification type never breaks decoding of the whole frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum ChatEntryType {
    /// A plain chat message. The only type surfaced to the operator.
    ChatMsg,
    /// The peer is typing.
    Typing,
    InviteGame,
    LeftConversation,
    Entered,
    WasKicked,
    WasBanned,
    Disconnected,
    HistoricalChat,
    LinkBlocked,
    Other(i32),
}

impl ChatEntryType {
    /// Returns the numeric wire code.
    pub const fn code(self) -> i32 {
        match self {
            Self::ChatMsg => 1,
            Self::Typing => 2,
            Self::InviteGame => 3,
            Self::LeftConversation => 6,
            Self::Entered => 7,
            Self::WasKicked => 8,
            Self::WasBanned => 9,
            Self::Disconnected => 10,
            Self::HistoricalChat => 11,
            Self::LinkBlocked => 14,
            Self::Other(code) => code,
        }
    }

    /// Maps a numeric wire code to its entry type.
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::ChatMsg,
            2 => Self::Typing,
            3 => Self::InviteGame,
            6 => Self::LeftConversation,
            7 => Self::Entered,
            8 => Self::WasKicked,
            9 => Self::WasBanned,
            10 => Self::Disconnected,
            11 => Self::HistoricalChat,
            14 => Self::LinkBlocked,
            other => Self::Other(other),
        }
    }
}

impl From<i32> for ChatEntryType {
    fn from(code: i32) -> Self {
        Self::from_code(code)
    }
}

impl From<ChatEntryType> for i32 {
    fn from(entry: ChatEntryType) -> Self {
        entry.code()
    }
}

// ---------------------------------------------------------------------------
// Logon
// ---------------------------------------------------------------------------

/// The service's answer to a logon request.
///
/// Travels as the bare result code. Only the codes the session state
/// machine reacts to get their own variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum LogonResult {
    /// Logged on.
    Ok,
    /// Generic failure.
    Fail,
    /// The service could not reach its backend.
    NoConnection,
    /// Wrong password.
    InvalidPassword,
    /// The device is not trusted; a second-factor code is required.
    AccountLogonDenied,
    /// Any code without a dedicated variant.
    Unrecognized(i32),
}

impl LogonResult {
    /// Returns the numeric result code.
    pub const fn code(self) -> i32 {
        match self {
            Self::Ok => 1,
            Self::Fail => 2,
            Self::NoConnection => 3,
            Self::InvalidPassword => 5,
            Self::AccountLogonDenied => 63,
            Self::Unrecognized(code) => code,
        }
    }

    /// Maps a numeric result code to a `LogonResult`.
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Ok,
            2 => Self::Fail,
            3 => Self::NoConnection,
            5 => Self::InvalidPassword,
            63 => Self::AccountLogonDenied,
            other => Self::Unrecognized(other),
        }
    }
}

impl From<i32> for LogonResult {
    fn from(code: i32) -> Self {
        Self::from_code(code)
    }
}

impl From<LogonResult> for i32 {
    fn from(result: LogonResult) -> Self {
        result.code()
    }
}

impl fmt::Display for LogonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "OK",
            Self::Fail => "Fail",
            Self::NoConnection => "NoConnection",
            Self::InvalidPassword => "InvalidPassword",
            Self::AccountLogonDenied => "AccountLogonDenied",
            Self::Unrecognized(_) => "Unrecognized",
        };
        write!(f, "{name} ({})", self.code())
    }
}

/// Credentials sent to the service to open a session.
///
/// `auth_code` and `sentry` are omitted from the wire entirely when
/// absent, rather than sent as `null`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogonRequest {
    pub account_name: String,
    pub password: String,
    /// One-time second-factor code, if the operator supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_code: Option<String>,
    /// The persisted device-trust token, if one was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentry: Option<Vec<u8>>,
}

// Manual impl so secrets never end up in logs.
impl fmt::Debug for LogonRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogonRequest")
            .field("account_name", &self.account_name)
            .field("password", &"<redacted>")
            .field("auth_code", &self.auth_code.as_ref().map(|_| "<redacted>"))
            .field("sentry_len", &self.sentry.as_ref().map(Vec::len))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Application messages
// ---------------------------------------------------------------------------

/// Message id on the application (game coordinator) channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppMessageId(pub u32);

impl AppMessageId {
    /// Ask the coordinator which server a friend's game runs on.
    pub const SPECTATE_FRIEND_GAME: Self = Self(7073);
    /// Answer to [`Self::SPECTATE_FRIEND_GAME`].
    pub const SPECTATE_FRIEND_GAME_RESPONSE: Self = Self(7074);
}

impl fmt::Display for AppMessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Header of an application message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMessageHeader {
    pub msg: AppMessageId,
    /// Whether the body is protobuf-framed by the service.
    #[serde(default)]
    pub proto: bool,
}

impl AppMessageHeader {
    /// A non-protobuf header for the given message id.
    pub const fn new(msg: AppMessageId) -> Self {
        Self { msg, proto: false }
    }
}

/// Body of [`AppMessageId::SPECTATE_FRIEND_GAME`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectateFriendGame {
    pub steam_id: PeerId,
}

/// Body of [`AppMessageId::SPECTATE_FRIEND_GAME_RESPONSE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectateFriendGameResponse {
    pub server_steamid: u64,
}

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// Events pushed by the transport, one at a time, in delivery order.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
///   `{ "type": "AuthResult", "result": 63 }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InboundEvent {
    /// The transport finished dialing.
    ConnectionEstablished,

    /// The session ended (service logoff or socket closed).
    ConnectionLost,

    /// A transport-level error. Never fatal.
    TransportFault { message: String },

    /// The service wants a second-factor code before logon can proceed.
    AuthChallengeRequired,

    /// Answer to the last logon request.
    AuthResult { result: LogonResult },

    /// A new device-trust token to persist.
    TrustTokenIssued { bytes: Vec<u8> },

    /// A peer's presence changed.
    PresenceChanged(PeerPresence),

    /// A chat entry from a peer.
    ChatMessageReceived {
        from: PeerId,
        text: String,
        entry_type: ChatEntryType,
    },

    /// A message on the application channel. The body is encoded by the
    /// codec and only the handler for `header.msg` knows its shape.
    ApplicationMessage {
        header: AppMessageHeader,
        body: Vec<u8>,
    },
}

impl InboundEvent {
    /// Short tag name, for logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionEstablished => "ConnectionEstablished",
            Self::ConnectionLost => "ConnectionLost",
            Self::TransportFault { .. } => "TransportFault",
            Self::AuthChallengeRequired => "AuthChallengeRequired",
            Self::AuthResult { .. } => "AuthResult",
            Self::TrustTokenIssued { .. } => "TrustTokenIssued",
            Self::PresenceChanged(_) => "PresenceChanged",
            Self::ChatMessageReceived { .. } => "ChatMessageReceived",
            Self::ApplicationMessage { .. } => "ApplicationMessage",
        }
    }
}

/// Requests the bot sends to the service once a socket is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Open a session.
    Logon(LogonRequest),

    /// Set the bot's own visible presence.
    SetPersonaState { state: PersonaState },

    /// Send a chat entry to a peer.
    ChatMessage {
        to: PeerId,
        text: String,
        entry_type: ChatEntryType,
    },

    /// Send a message on the application channel.
    ApplicationMessage {
        header: AppMessageHeader,
        body: Vec<u8>,
    },
}

// =========================================================================
// Tests
// =========================================================================
