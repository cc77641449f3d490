//! `RelayBotBuilder`: configuration for a [`RelayBot`].

use relaybot_presence::{PresenceTracker, WatchedActivity};
use relaybot_protocol::{Codec, JsonCodec};
use relaybot_session::{Credentials, SentryStore, SessionMachine};
use relaybot_transport::Transport;

use crate::{InterfaceState, RelayBot, RelaybotError};

/// Builder for configuring a [`RelayBot`].
///
/// # Example
///
/// ```rust
/// use relaybot::prelude::*;
///
/// let (transport, _calls) = ChannelTransport::new();
/// let bot = RelayBot::builder()
///     .credentials("bot", "hunter2")
///     .watch(WatchedActivity::new(ActivityId(730), "Counter-Strike"))
///     .build(transport, MemorySentryStore::new())
///     .unwrap();
///
/// assert_eq!(bot.status(), ConnectionStatus::Disconnected);
/// ```
#[derive(Debug, Clone)]
pub struct RelayBotBuilder<C = JsonCodec> {
    credentials: Option<Credentials>,
    watched: WatchedActivity,
    codec: C,
}

impl RelayBotBuilder {
    /// A builder with no credentials, the default watched activity, and
    /// `JsonCodec`.
    pub fn new() -> Self {
        Self {
            credentials: None,
            watched: WatchedActivity::default(),
            codec: JsonCodec,
        }
    }
}

impl Default for RelayBotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Codec> RelayBotBuilder<C> {
    /// Sets the account to log on as. Required.
    pub fn credentials(
        mut self,
        account_name: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials::new(account_name, secret));
        self
    }

    /// Sets which activity counts as notable.
    pub fn watch(mut self, watched: WatchedActivity) -> Self {
        self.watched = watched;
        self
    }

    /// Swaps the codec used for application-message bodies.
    pub fn codec<C2: Codec>(self, codec: C2) -> RelayBotBuilder<C2> {
        RelayBotBuilder {
            credentials: self.credentials,
            watched: self.watched,
            codec,
        }
    }

    /// Builds a disconnected bot on `transport`, keeping its trust token
    /// in `store`. Call [`RelayBot::start`] to dial.
    ///
    /// # Errors
    /// Returns [`RelaybotError::MissingCredentials`] if
    /// [`credentials`](Self::credentials) was never called.
    pub fn build<T, S>(
        self,
        transport: T,
        store: S,
    ) -> Result<RelayBot<T, S, C>, RelaybotError>
    where
        T: Transport,
        S: SentryStore,
    {
        let credentials =
            self.credentials.ok_or(RelaybotError::MissingCredentials)?;

        Ok(RelayBot {
            transport,
            machine: SessionMachine::new(credentials, store),
            presence: PresenceTracker::new(self.watched),
            codec: self.codec,
            interface: InterfaceState::Inactive,
        })
    }
}
