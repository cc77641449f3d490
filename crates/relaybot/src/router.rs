//! `RelayBot`: the event router and the command interface.
//!
//! The bot is driven from outside, one input at a time:
//!
//! - [`RelayBot::dispatch`] for each [`InboundEvent`] the transport
//!   delivers, in delivery order
//! - [`RelayBot::handle_line`] for each operator command line
//! - [`RelayBot::close_interface`] when the operator closes the console
//!
//! Each call runs to completion before the next one starts, so nothing in
//! here needs a lock. Faults never escape: transport, storage, and decode
//! errors are logged once and the bot carries on.

use std::fmt;
use std::ops::ControlFlow;

use relaybot_presence::{PresenceSnapshot, PresenceTracker};
use relaybot_protocol::{
    AppMessageHeader, AppMessageId, ChatEntryType, Codec, InboundEvent,
    LogonResult, PeerId, PersonaState, SpectateFriendGame,
    SpectateFriendGameResponse,
};
use relaybot_session::{
    AuthOutcome, ConnectionStatus, SentryStore, Session, SessionMachine,
};
use relaybot_transport::Transport;

use crate::commands::{
    CommandError, CommandKind, LineOutcome, OutboundCommand,
};
use crate::severity::{CHAT_TARGET, CRITICAL_TARGET};
use crate::{Console, RelayBotBuilder, RelaybotError};

/// Shown when the service asks for a second-factor code.
pub const CHALLENGE_PROMPT: &str = "Authcode: ";

/// Whether operator commands are being accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterfaceState {
    /// Not logged on yet.
    #[default]
    Inactive,
    /// Logged on; command lines are read and handled.
    Active,
    /// The operator closed the console. Stays closed.
    Closed,
}

/// The bot: session state machine, presence tracker, and router in one.
///
/// Generic over the [`Transport`] it issues calls on, the [`SentryStore`]
/// that keeps its trust token, and the [`Codec`] for application-message
/// bodies.
pub struct RelayBot<T, S, C> {
    pub(crate) transport: T,
    pub(crate) machine: SessionMachine<S>,
    pub(crate) presence: PresenceTracker,
    pub(crate) codec: C,
    pub(crate) interface: InterfaceState,
}

impl RelayBot<(), (), ()> {
    /// Creates a new builder.
    pub fn builder() -> RelayBotBuilder {
        RelayBotBuilder::new()
    }
}

impl<T, S, C> RelayBot<T, S, C>
where
    T: Transport,
    S: SentryStore,
    C: Codec,
{
    // -- Accessors ---------------------------------------------------------

    pub fn session(&self) -> &Session {
        self.machine.session()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.machine.status()
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    pub fn store(&self) -> &S {
        self.machine.store()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn interface(&self) -> InterfaceState {
        self.interface
    }

    /// Returns `true` while command lines should be read.
    pub fn interface_active(&self) -> bool {
        self.interface == InterfaceState::Active
    }

    // -- Startup -----------------------------------------------------------

    /// Dials the service. Everything after this is driven by
    /// [`dispatch`](Self::dispatch).
    ///
    /// # Errors
    /// Returns the transport's error if the call can't be issued.
    pub async fn start(&self) -> Result<(), RelaybotError>
    where
        RelaybotError: From<T::Error>,
    {
        tracing::info!(account = self.session().account_name(), "Connecting");
        self.transport.connect().await?;
        Ok(())
    }

    // -- Inbound events ----------------------------------------------------

    /// Handles one inbound event.
    ///
    /// Returns `Break` once the bot should exit: the authenticated
    /// connection is gone, or a logoff was asked for and its
    /// `ConnectionLost` has arrived. `Continue` otherwise. While a challenge code is being asked
    /// for, this call waits on `console` and no other event is handled.
    pub async fn dispatch<K: Console>(
        &mut self,
        event: InboundEvent,
        console: &mut K,
    ) -> ControlFlow<()> {
        match event {
            InboundEvent::ConnectionEstablished => self.on_connected().await,
            InboundEvent::ConnectionLost => return self.on_connection_lost(),
            InboundEvent::TransportFault { message } => {
                tracing::warn!(
                    status = ?self.status(),
                    "Transport fault: {message}"
                );
            }
            InboundEvent::AuthChallengeRequired => {
                match self.machine.on_challenge_required() {
                    AuthOutcome::ChallengeRequired => {
                        self.prompt_challenge(console).await;
                    }
                    outcome => unexpected(&outcome),
                }
            }
            InboundEvent::AuthResult { result } => {
                self.on_auth_result(result, console).await;
            }
            InboundEvent::TrustTokenIssued { bytes } => {
                self.on_trust_token_issued(bytes);
            }
            InboundEvent::PresenceChanged(update) => {
                self.presence.apply_update(update);
            }
            InboundEvent::ChatMessageReceived {
                from,
                text,
                entry_type,
            } => on_chat(&from, &text, entry_type),
            InboundEvent::ApplicationMessage { header, body } => {
                self.on_app_message(header, &body);
            }
        }
        ControlFlow::Continue(())
    }

    async fn on_connected(&mut self) {
        let request = self.machine.on_connected();
        report("authenticate", self.transport.authenticate(&request).await);
    }

    /// Ends the bot when an authenticated session drops or after a logoff
    /// was asked for. A loss in the middle of a logon attempt is only
    /// logged: the next `ConnectionEstablished` carries on from there.
    fn on_connection_lost(&mut self) -> ControlFlow<()> {
        let status = self.status();
        let ended = self.machine.on_connection_lost();
        let requested = self.interface == InterfaceState::Closed;
        if !ended && !requested {
            tracing::warn!(?status, "Connection lost before logon completed");
            return ControlFlow::Continue(());
        }
        self.interface = InterfaceState::Closed;
        tracing::info!("Logged off");
        ControlFlow::Break(())
    }

    async fn on_auth_result<K: Console>(
        &mut self,
        result: LogonResult,
        console: &mut K,
    ) {
        tracing::info!("Logon response: {result}");

        match self.machine.on_auth_result(result) {
            AuthOutcome::Authenticated => self.on_authenticated().await,
            AuthOutcome::Failed(reason) => {
                tracing::error!(target: CRITICAL_TARGET, "{reason}");
            }
            AuthOutcome::ChallengeRequired => {
                self.prompt_challenge(console).await;
            }
            outcome => unexpected(&outcome),
        }
    }

    async fn on_authenticated(&mut self) {
        tracing::info!(account = self.session().account_name(), "Logged on");
        report(
            "set persona state",
            self.transport.set_persona_state(PersonaState::Online).await,
        );
        self.interface = InterfaceState::Active;
        self.log_snapshot(self.presence.snapshot());
    }

    fn log_snapshot(&self, snap: PresenceSnapshot) {
        tracing::info!(
            "{snap}, {} playing {}",
            snap.watched,
            self.presence.watched().label
        );
    }

    /// Asks the operator for a challenge code and re-dials with it. A
    /// closed console abandons the logon instead.
    async fn prompt_challenge<K: Console>(&mut self, console: &mut K) {
        tracing::warn!("Second-factor code required");

        match console.ask(CHALLENGE_PROMPT).await {
            Some(code) => {
                if let Err(e) = self.machine.supply_challenge(&code) {
                    tracing::warn!(error = %e, "Challenge code not accepted");
                    return;
                }
                report("connect", self.transport.connect().await);
            }
            None => {
                match self.machine.abandon_challenge() {
                    Ok(reason) => {
                        tracing::error!(target: CRITICAL_TARGET, "{reason}");
                    }
                    Err(e) => tracing::warn!(error = %e, "Nothing to abandon"),
                }
                self.interface = InterfaceState::Closed;
                report("disconnect", self.transport.disconnect().await);
            }
        }
    }

    fn on_trust_token_issued(&mut self, bytes: Vec<u8>) {
        match self.machine.on_trust_token_issued(bytes) {
            Ok(()) => tracing::info!("Sentry saved"),
            Err(e) => tracing::error!(error = %e, "Failed to save sentry"),
        }
    }

    /// Only spectate responses are understood; other ids are ignored.
    fn on_app_message(&self, header: AppMessageHeader, body: &[u8]) {
        if header.msg != AppMessageId::SPECTATE_FRIEND_GAME_RESPONSE {
            return;
        }
        match self.codec.decode::<SpectateFriendGameResponse>(body) {
            Ok(response) => tracing::info!(
                server_steamid = response.server_steamid,
                "Spectate server: {}",
                response.server_steamid
            ),
            Err(e) => {
                tracing::warn!(error = %e, "Undecodable spectate response");
            }
        }
    }

    // -- Operator commands -------------------------------------------------

    /// Handles one operator command line.
    ///
    /// Bad lines are reported and change nothing. A good line is sent at
    /// once; if the transport refuses it, that is logged and the outcome
    /// is still `Sent`.
    pub async fn handle_line(&mut self, line: &str) -> LineOutcome {
        let command = match OutboundCommand::parse(line) {
            Ok(command) => command,
            Err(CommandError::Unknown(keyword)) => {
                tracing::warn!("Unknown command: {keyword:?}");
                return LineOutcome::Unknown(keyword);
            }
            Err(e) => {
                tracing::warn!("{e}");
                return LineOutcome::Invalid(e.to_string());
            }
        };

        match command.kind {
            CommandKind::SendChatMessage => {
                let text = command.text();
                tracing::debug!(to = %command.target, "Sending chat");
                report(
                    "send chat",
                    self.transport.send_chat(&command.target, &text).await,
                );
            }
            CommandKind::RequestSpectate => {
                let body = match self.spectate_body(&command.target) {
                    Ok(body) => body,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to encode request");
                        return LineOutcome::Invalid(e.to_string());
                    }
                };
                tracing::debug!(peer = %command.target, "Requesting spectate");
                report(
                    "send app message",
                    self.transport
                        .send_app_message(
                            AppMessageHeader::new(
                                AppMessageId::SPECTATE_FRIEND_GAME,
                            ),
                            body,
                        )
                        .await,
                );
            }
        }
        LineOutcome::Sent(command)
    }

    fn spectate_body(
        &self,
        peer: &PeerId,
    ) -> Result<Vec<u8>, relaybot_protocol::ProtocolError> {
        self.codec.encode(&SpectateFriendGame {
            steam_id: peer.clone(),
        })
    }

    /// The operator closed the console: log off.
    ///
    /// Issues exactly one disconnect, however often it is called. The
    /// `ConnectionLost` that follows ends the bot, whatever the status.
    pub async fn close_interface(&mut self) {
        if self.interface == InterfaceState::Closed {
            return;
        }
        self.interface = InterfaceState::Closed;
        tracing::info!("Logging off...");
        report("disconnect", self.transport.disconnect().await);
    }
}

/// Surfaces plain chat; typing notifications and the like are dropped.
fn on_chat(from: &PeerId, text: &str, entry_type: ChatEntryType) {
    if entry_type == ChatEntryType::ChatMsg {
        tracing::info!(target: CHAT_TARGET, from = %from, "{text}");
    }
}

/// Logs a logon outcome the router has nothing to do for.
fn unexpected(outcome: &AuthOutcome) {
    match outcome {
        AuthOutcome::Unhandled(result) => {
            tracing::warn!(code = result.code(), "Unhandled logon result");
        }
        AuthOutcome::OutOfTurn(status) => {
            tracing::warn!(?status, "Logon event outside a logon attempt");
        }
        _ => {}
    }
}

/// Logs a failed transport call. Transport errors are never fatal.
fn report<E: fmt::Display>(call: &str, result: Result<(), E>) {
    if let Err(e) = result {
        tracing::warn!(call, error = %e, "Transport call failed");
    }
}

impl<T, S, C> fmt::Debug for RelayBot<T, S, C>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayBot")
            .field("machine", &self.machine)
            .field("presence", &self.presence)
            .field("interface", &self.interface)
            .finish_non_exhaustive()
    }
}
