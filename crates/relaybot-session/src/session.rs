//! Session types: the data the logon state machine owns.
//!
//! A session is the bot's record of its one account:
//! - WHO it logs on as (account name and secret)
//! - WHERE the connection stands ([`ConnectionStatus`])
//! - WHAT extra proof it holds (a challenge code, a trust token)
//!
//! Fields are crate-private: only [`SessionMachine`](crate::SessionMachine)
//! mutates a session, everything else reads it.

use std::fmt;

use crate::TrustToken;

// ---------------------------------------------------------------------------
// LogonFailure
// ---------------------------------------------------------------------------

/// Why a logon attempt ended in [`ConnectionStatus::Failed`].
///
/// Every failure is terminal for the attempt: nothing retries on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogonFailure {
    /// The service rejected the logon without a specific reason.
    Generic,
    /// The service could not reach its backend.
    NoConnection,
    /// The secret was wrong.
    InvalidSecret,
    /// A challenge code was required but the operator supplied none.
    ChallengeAbandoned,
}

impl fmt::Display for LogonFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Generic => "logon failed",
            Self::NoConnection => "logon failed: no connection",
            Self::InvalidSecret => "logon failed: wrong password",
            Self::ChallengeAbandoned => {
                "logon abandoned: no challenge code supplied"
            }
        };
        f.write_str(text)
    }
}

// ---------------------------------------------------------------------------
// ConnectionStatus
// ---------------------------------------------------------------------------

/// Where the connection stands.
///
/// ```text
///   Disconnected ──(connected)──→ Connecting ──(OK)──→ Authenticated
///        ↑                         │      ↑                  │
///        │                (denied) │      │ (code supplied)  │
///        │                         ▼      │                  │
///        │                    AwaitingChallenge              │
///        │                                                   │
///        └──────────────────(connection lost)────────────────┘
///
///   Connecting ──(fail / no connection / bad secret)──→ Failed
/// ```
///
/// `Failed` is parked: the bot stays resident but does not retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    AwaitingChallenge,
    Authenticated,
    Failed(LogonFailure),
}

impl ConnectionStatus {
    /// Returns `true` once the service has accepted the logon.
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// What the bot logs on with.
///
/// Account name and secret come from configuration and never change. The
/// challenge code and trust token are filled in by the state machine.
#[derive(Clone)]
pub struct Credentials {
    pub(crate) account_name: String,
    pub(crate) secret: String,
    /// Set when the operator answers a challenge; consumed by the next
    /// logon request.
    pub(crate) challenge_code: Option<String>,
    pub(crate) trust_token: Option<TrustToken>,
}

impl Credentials {
    /// Credentials with no challenge code and no trust token yet.
    pub fn new(
        account_name: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            secret: secret.into(),
            challenge_code: None,
            trust_token: None,
        }
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    /// The pending challenge code, if one was supplied and not yet sent.
    pub fn challenge_code(&self) -> Option<&str> {
        self.challenge_code.as_deref()
    }

    /// The trust token in use for this run, if any.
    pub fn trust_token(&self) -> Option<&TrustToken> {
        self.trust_token.as_ref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_name", &self.account_name)
            .field("secret", &"<redacted>")
            .field(
                "challenge_code",
                &self.challenge_code.as_ref().map(|_| "<redacted>"),
            )
            .field("trust_token", &self.trust_token)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The authenticated connection context for one account.
///
/// Created at startup from configuration. Never persisted as a whole;
/// only the trust token outlives the process.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) status: ConnectionStatus,
    pub(crate) credentials: Credentials,
}

impl Session {
    /// A disconnected session for the given credentials.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            credentials,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn account_name(&self) -> &str {
        &self.credentials.account_name
    }
}
