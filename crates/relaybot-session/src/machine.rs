//! The logon state machine.
//!
//! [`SessionMachine`] owns the [`Session`] and the [`SentryStore`] and is
//! the only thing that changes either. Each `on_*` method handles one
//! kind of transport event and returns what the caller must do next; the
//! machine itself performs no network I/O.
//!
//! # Lifecycle
//!
//! ```text
//! on_connected() ──→ LogonRequest ──→ on_auth_result()
//!                                          │
//!        ┌──────────────┬──────────────────┼───────────────────┐
//!        ▼              ▼                  ▼                   ▼
//!  Authenticated     Failed       AwaitingChallenge      (unchanged)
//!        │
//!  on_connection_lost()
//!        │
//!        ▼
//!  Disconnected
//!                                          │
//!                               supply_challenge(code)
//!                                          │
//!                                          ▼
//!                                 Connecting (re-dial)
//! ```
//!
//! Logon results and challenges are only answered while `Connecting`;
//! anywhere else they come back as [`AuthOutcome::OutOfTurn`].
//!
//! # Challenge codes
//!
//! A supplied code lives in the credentials only between
//! [`SessionMachine::supply_challenge`] and the next
//! [`SessionMachine::on_connected`], which moves it into the logon
//! request. Every other transition clears it, so a pending code exists
//! only while the status is `Connecting`.

use relaybot_protocol::{LogonRequest, LogonResult};

use crate::{
    ConnectionStatus, Credentials, LogonFailure, SentryStore, Session,
    SessionError, TrustToken,
};

/// What the caller must do after a logon result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Logged on: go online and open the command interface.
    Authenticated,
    /// Logon failed for good. Nothing to do but report it.
    Failed(LogonFailure),
    /// Ask the operator for a challenge code, then
    /// [`supply_challenge`](SessionMachine::supply_challenge) and re-dial.
    ChallengeRequired,
    /// A result code the machine has no transition for. The status is
    /// unchanged.
    Unhandled(LogonResult),
    /// The event arrived outside a logon attempt, while the status was the
    /// one given. The status is unchanged.
    OutOfTurn(ConnectionStatus),
}

/// Drives a [`Session`] through connect → authenticate → confirm.
#[derive(Debug)]
pub struct SessionMachine<S> {
    session: Session,
    store: S,
}

impl<S: SentryStore> SessionMachine<S> {
    /// A disconnected machine for `credentials`, persisting tokens in
    /// `store`.
    pub fn new(credentials: Credentials, store: S) -> Self {
        Self {
            session: Session::new(credentials),
            store,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn status(&self) -> ConnectionStatus {
        self.session.status
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handles `ConnectionEstablished`: builds the logon request and moves
    /// to `Connecting`.
    ///
    /// The stored trust token is reloaded every time. If the store has
    /// none but the service issued one earlier in this run (and saving it
    /// failed), the in-memory token is used instead.
    pub fn on_connected(&mut self) -> LogonRequest {
        let credentials = &mut self.session.credentials;
        let account = credentials.account_name.as_str();

        match self.store.load(account) {
            Some(token) => {
                tracing::info!(account, "sentry file found");
                credentials.trust_token = Some(token);
            }
            None if credentials.trust_token.is_some() => {
                tracing::info!(
                    account,
                    "no stored sentry, reusing the one issued this run"
                );
            }
            None => {
                tracing::info!(account, "no sentry file, logging on without one");
            }
        }

        let auth_code = credentials.challenge_code.take();
        let request = LogonRequest {
            account_name: credentials.account_name.clone(),
            password: credentials.secret.clone(),
            auth_code,
            sentry: credentials
                .trust_token
                .as_ref()
                .map(|token| token.bytes().to_vec()),
        };

        self.transition(ConnectionStatus::Connecting);
        request
    }

    /// Handles `AuthResult`. Only a logon attempt in flight (`Connecting`)
    /// is answered; in any other state the result is ignored.
    pub fn on_auth_result(&mut self, result: LogonResult) -> AuthOutcome {
        if let Some(outcome) = self.out_of_turn() {
            return outcome;
        }
        match result {
            LogonResult::Ok => {
                self.transition(ConnectionStatus::Authenticated);
                AuthOutcome::Authenticated
            }
            LogonResult::Fail => self.fail(LogonFailure::Generic),
            LogonResult::NoConnection => self.fail(LogonFailure::NoConnection),
            LogonResult::InvalidPassword => {
                self.fail(LogonFailure::InvalidSecret)
            }
            LogonResult::AccountLogonDenied => self.on_challenge_required(),
            LogonResult::Unrecognized(_) => AuthOutcome::Unhandled(result),
        }
    }

    /// Handles `AuthChallengeRequired` (and the equivalent logon result).
    /// Ignored unless the status is `Connecting`.
    pub fn on_challenge_required(&mut self) -> AuthOutcome {
        if let Some(outcome) = self.out_of_turn() {
            return outcome;
        }
        self.transition(ConnectionStatus::AwaitingChallenge);
        AuthOutcome::ChallengeRequired
    }

    /// Records the operator's answer to a challenge and moves back to
    /// `Connecting`. The caller re-dials; the code goes out with the next
    /// logon request. A blank answer re-dials without a code.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidTransition`] unless the status is
    /// `AwaitingChallenge`.
    pub fn supply_challenge(&mut self, code: &str) -> Result<(), SessionError> {
        self.expect_awaiting_challenge("supply a challenge code")?;

        self.transition(ConnectionStatus::Connecting);
        let code = code.trim();
        self.session.credentials.challenge_code =
            (!code.is_empty()).then(|| code.to_string());
        Ok(())
    }

    /// Gives up on a pending challenge (the operator closed the console).
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidTransition`] unless the status is
    /// `AwaitingChallenge`.
    pub fn abandon_challenge(&mut self) -> Result<LogonFailure, SessionError> {
        self.expect_awaiting_challenge("abandon a challenge")?;
        self.fail(LogonFailure::ChallengeAbandoned);
        Ok(LogonFailure::ChallengeAbandoned)
    }

    /// Handles `TrustTokenIssued`: persists the token, replacing any
    /// previous one. The status is unchanged.
    ///
    /// The token is kept in memory even when saving fails, so the rest of
    /// this run still logs on with it.
    ///
    /// # Errors
    /// Returns the store's error if the token could not be persisted.
    pub fn on_trust_token_issued(
        &mut self,
        bytes: Vec<u8>,
    ) -> Result<(), SessionError> {
        let credentials = &mut self.session.credentials;
        let token = TrustToken::new(credentials.account_name.as_str(), bytes);
        let saved = self.store.save(token.account(), token.bytes());
        credentials.trust_token = Some(token);
        saved
    }

    /// Handles `ConnectionLost`. Returns `true` if it ended an
    /// authenticated session, which moves the status to `Disconnected`.
    ///
    /// During a logon attempt the loss belongs to a socket that is already
    /// being replaced (the service drops the connection after asking for a
    /// challenge code), so the status and any pending code are kept for the
    /// next `on_connected`. Failed and disconnected sessions stay as they
    /// are.
    pub fn on_connection_lost(&mut self) -> bool {
        if !self.session.status.is_authenticated() {
            return false;
        }
        self.transition(ConnectionStatus::Disconnected);
        true
    }

    fn fail(&mut self, reason: LogonFailure) -> AuthOutcome {
        self.transition(ConnectionStatus::Failed(reason));
        AuthOutcome::Failed(reason)
    }

    fn out_of_turn(&self) -> Option<AuthOutcome> {
        match self.session.status {
            ConnectionStatus::Connecting => None,
            status => Some(AuthOutcome::OutOfTurn(status)),
        }
    }

    fn expect_awaiting_challenge(
        &self,
        action: &'static str,
    ) -> Result<(), SessionError> {
        match self.session.status {
            ConnectionStatus::AwaitingChallenge => Ok(()),
            status => Err(SessionError::InvalidTransition { action, status }),
        }
    }

    /// Sets the status and drops any pending challenge code.
    fn transition(&mut self, status: ConnectionStatus) {
        let from = self.session.status;
        self.session.status = status;
        self.session.credentials.challenge_code = None;
        if from != status {
            tracing::debug!(?from, to = ?status, "session status changed");
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
