//! Integration tests for the event router: a bot wired to a
//! `ChannelTransport`, a scripted console, and a log capture.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use relaybot::prelude::*;
use relaybot::protocol::{
    AppMessageHeader, AppMessageId, ClientMessage, SpectateFriendGameResponse,
};
use relaybot::{CHALLENGE_PROMPT, CHAT_TARGET};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::fmt::MakeWriter;

// =========================================================================
// Helpers
// =========================================================================

type Bot = RelayBot<ChannelTransport, MemorySentryStore, JsonCodec>;

/// A console that replays canned answers and lines.
#[derive(Default)]
struct ScriptedConsole {
    answers: VecDeque<Option<String>>,
    lines: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedConsole {
    fn answering(answer: Option<&str>) -> Self {
        Self {
            answers: VecDeque::from([answer.map(str::to_string)]),
            ..Self::default()
        }
    }
}

impl Console for ScriptedConsole {
    async fn next_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }

    async fn ask(&mut self, question: &str) -> Option<String> {
        self.asked.push(question.to_string());
        self.answers.pop_front().flatten()
    }
}

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Installs the capture as this thread's default subscriber until the
    /// guard drops.
    fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::TRACE)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn bot_with(store: MemorySentryStore) -> (Bot, UnboundedReceiver<Outbound>) {
    let (transport, calls) = ChannelTransport::new();
    let bot = RelayBot::builder()
        .credentials("bot", "hunter2")
        .build(transport, store)
        .expect("credentials are set");
    (bot, calls)
}

fn bot() -> (Bot, UnboundedReceiver<Outbound>) {
    bot_with(MemorySentryStore::new())
}

fn drain(calls: &mut UnboundedReceiver<Outbound>) -> Vec<Outbound> {
    let mut out = Vec::new();
    while let Ok(call) = calls.try_recv() {
        out.push(call);
    }
    out
}

/// Drives a fresh bot to `Authenticated` and clears the call queue.
async fn logged_on() -> (Bot, UnboundedReceiver<Outbound>) {
    let (mut bot, mut calls) = bot();
    let mut console = ScriptedConsole::default();
    bot.dispatch(InboundEvent::ConnectionEstablished, &mut console)
        .await;
    bot.dispatch(
        InboundEvent::AuthResult {
            result: LogonResult::Ok,
        },
        &mut console,
    )
    .await;
    assert_eq!(bot.status(), ConnectionStatus::Authenticated);
    drain(&mut calls);
    (bot, calls)
}

fn logon_of(call: &Outbound) -> &relaybot::protocol::LogonRequest {
    match call {
        Outbound::Send(ClientMessage::Logon(request)) => request,
        other => panic!("expected a logon request, got {other:?}"),
    }
}

// =========================================================================
// Logon
// =========================================================================

#[tokio::test]
async fn test_start_dials_the_service() {
    let (bot, mut calls) = bot();

    bot.start().await.unwrap();

    assert_eq!(drain(&mut calls), vec![Outbound::Connect]);
}

#[tokio::test]
async fn test_connected_without_sentry_authenticates_without_token() {
    let (mut bot, mut calls) = bot();

    let flow = bot
        .dispatch(InboundEvent::ConnectionEstablished, &mut ScriptedConsole::default())
        .await;

    assert!(flow.is_continue());
    let sent = drain(&mut calls);
    assert_eq!(sent.len(), 1);
    let request = logon_of(&sent[0]);
    assert_eq!(request.account_name, "bot");
    assert!(request.sentry.is_none());
    assert_eq!(bot.status(), ConnectionStatus::Connecting);
}

#[tokio::test]
async fn test_connected_with_sentry_sends_it() {
    let store = MemorySentryStore::new().with_token("bot", vec![1, 2, 3]);
    let (mut bot, mut calls) = bot_with(store);

    bot.dispatch(InboundEvent::ConnectionEstablished, &mut ScriptedConsole::default())
        .await;

    let sent = drain(&mut calls);
    assert_eq!(logon_of(&sent[0]).sentry, Some(vec![1, 2, 3]));
}

#[tokio::test]
async fn test_auth_ok_goes_online_and_activates_interface() {
    let (mut bot, mut calls) = bot();
    let mut console = ScriptedConsole::default();
    bot.dispatch(InboundEvent::ConnectionEstablished, &mut console)
        .await;
    drain(&mut calls);

    bot.dispatch(
        InboundEvent::AuthResult {
            result: LogonResult::Ok,
        },
        &mut console,
    )
    .await;

    assert_eq!(bot.status(), ConnectionStatus::Authenticated);
    assert!(bot.interface_active());
    assert_eq!(
        drain(&mut calls),
        vec![Outbound::Send(ClientMessage::SetPersonaState {
            state: PersonaState::Online
        })]
    );
}

#[tokio::test]
async fn test_auth_ok_logs_presence_summary() {
    let (mut bot, _calls) = bot();
    let mut console = ScriptedConsole::default();
    bot.dispatch(
        InboundEvent::PresenceChanged(
            PeerPresence::new("A", PersonaState::Online)
                .with_activity(ActivityId(570)),
        ),
        &mut console,
    )
    .await;
    bot.dispatch(
        InboundEvent::PresenceChanged(PeerPresence::new(
            "B",
            PersonaState::Offline,
        )),
        &mut console,
    )
    .await;
    bot.dispatch(InboundEvent::ConnectionEstablished, &mut console)
        .await;

    let logs = LogCapture::default();
    let _guard = logs.install();
    bot.dispatch(
        InboundEvent::AuthResult {
            result: LogonResult::Ok,
        },
        &mut console,
    )
    .await;

    assert!(
        logs.lines()
            .iter()
            .any(|l| l.contains("1/2 people online, 1 playing Dota 2")),
        "{:?}",
        logs.lines()
    );
}

#[tokio::test]
async fn test_auth_failures_park_without_retry() {
    let cases = [
        (LogonResult::Fail, LogonFailure::Generic),
        (LogonResult::NoConnection, LogonFailure::NoConnection),
        (LogonResult::InvalidPassword, LogonFailure::InvalidSecret),
    ];
    for (result, reason) in cases {
        let (mut bot, mut calls) = bot();
        let mut console = ScriptedConsole::default();
        bot.dispatch(InboundEvent::ConnectionEstablished, &mut console)
            .await;
        drain(&mut calls);

        let flow = bot
            .dispatch(InboundEvent::AuthResult { result }, &mut console)
            .await;

        assert!(flow.is_continue());
        assert_eq!(bot.status(), ConnectionStatus::Failed(reason));
        assert!(drain(&mut calls).is_empty(), "{result:?} must not retry");
        assert!(!bot.interface_active());
    }
}

#[tokio::test]
async fn test_unrecognized_result_warns_and_keeps_state() {
    let (mut bot, mut calls) = bot();
    let mut console = ScriptedConsole::default();
    bot.dispatch(InboundEvent::ConnectionEstablished, &mut console)
        .await;
    drain(&mut calls);

    let logs = LogCapture::default();
    let _guard = logs.install();
    bot.dispatch(
        InboundEvent::AuthResult {
            result: LogonResult::Unrecognized(84),
        },
        &mut console,
    )
    .await;

    assert_eq!(bot.status(), ConnectionStatus::Connecting);
    assert!(drain(&mut calls).is_empty());
    assert!(
        logs.lines()
            .iter()
            .any(|l| l.contains("WARN") && l.contains("Unhandled logon result"))
    );
}

// =========================================================================
// Challenge
// =========================================================================

#[tokio::test]
async fn test_challenge_prompts_redials_and_sends_code() {
    let (mut bot, mut calls) = bot();
    let mut console = ScriptedConsole::answering(Some("F00BA\n"));
    bot.dispatch(InboundEvent::ConnectionEstablished, &mut console)
        .await;
    drain(&mut calls);

    bot.dispatch(
        InboundEvent::AuthResult {
            result: LogonResult::AccountLogonDenied,
        },
        &mut console,
    )
    .await;

    assert_eq!(console.asked, vec![CHALLENGE_PROMPT.to_string()]);
    assert_eq!(bot.status(), ConnectionStatus::Connecting);
    assert_eq!(drain(&mut calls), vec![Outbound::Connect]);

    bot.dispatch(InboundEvent::ConnectionEstablished, &mut console)
        .await;
    let sent = drain(&mut calls);
    assert_eq!(logon_of(&sent[0]).auth_code.as_deref(), Some("F00BA"));

    bot.dispatch(
        InboundEvent::AuthResult {
            result: LogonResult::Ok,
        },
        &mut console,
    )
    .await;
    assert_eq!(bot.status(), ConnectionStatus::Authenticated);
}

#[tokio::test]
async fn test_challenge_event_prompts_like_denied_result() {
    let (mut bot, mut calls) = bot();
    let mut console = ScriptedConsole::answering(Some("ABCDE"));
    bot.dispatch(InboundEvent::ConnectionEstablished, &mut console)
        .await;
    drain(&mut calls);

    bot.dispatch(InboundEvent::AuthChallengeRequired, &mut console)
        .await;

    assert_eq!(console.asked.len(), 1);
    assert_eq!(drain(&mut calls), vec![Outbound::Connect]);
}

#[tokio::test]
async fn test_closed_console_during_challenge_abandons_logon() {
    let (mut bot, mut calls) = bot();
    let mut console = ScriptedConsole::answering(None);
    bot.dispatch(InboundEvent::ConnectionEstablished, &mut console)
        .await;
    drain(&mut calls);

    bot.dispatch(
        InboundEvent::AuthResult {
            result: LogonResult::AccountLogonDenied,
        },
        &mut console,
    )
    .await;

    assert_eq!(
        bot.status(),
        ConnectionStatus::Failed(LogonFailure::ChallengeAbandoned)
    );
    assert_eq!(drain(&mut calls), vec![Outbound::Disconnect]);
    assert_eq!(bot.interface(), InterfaceState::Closed);

    let flow = bot.dispatch(InboundEvent::ConnectionLost, &mut console).await;

    assert!(flow.is_break());
    assert_eq!(
        bot.status(),
        ConnectionStatus::Failed(LogonFailure::ChallengeAbandoned)
    );
}

#[tokio::test]
async fn test_server_close_after_challenge_redials_to_authenticated() {
    let (mut bot, mut calls) = bot();
    let mut console = ScriptedConsole::answering(Some("F00BA"));
    bot.dispatch(InboundEvent::ConnectionEstablished, &mut console)
        .await;
    bot.dispatch(
        InboundEvent::AuthResult {
            result: LogonResult::AccountLogonDenied,
        },
        &mut console,
    )
    .await;
    drain(&mut calls);

    // The socket that asked for the code closes while the re-dial is queued.
    let logs = LogCapture::default();
    let guard = logs.install();
    let flow = bot.dispatch(InboundEvent::ConnectionLost, &mut console).await;
    drop(guard);

    assert!(flow.is_continue());
    assert_eq!(bot.status(), ConnectionStatus::Connecting);
    assert_eq!(logs.lines().len(), 1, "{:?}", logs.lines());
    assert!(logs.lines()[0].contains("Connection lost before logon completed"));
    assert!(drain(&mut calls).is_empty());

    bot.dispatch(InboundEvent::ConnectionEstablished, &mut console)
        .await;
    let sent = drain(&mut calls);
    assert_eq!(logon_of(&sent[0]).auth_code.as_deref(), Some("F00BA"));

    let flow = bot
        .dispatch(
            InboundEvent::AuthResult {
                result: LogonResult::Ok,
            },
            &mut console,
        )
        .await;
    assert!(flow.is_continue());
    assert_eq!(bot.status(), ConnectionStatus::Authenticated);
    assert!(bot.interface_active());
}

#[tokio::test]
async fn test_connection_lost_before_logon_continues() {
    let (mut bot, _calls) = bot();
    let mut console = ScriptedConsole::default();

    let flow = bot.dispatch(InboundEvent::ConnectionLost, &mut console).await;
    assert!(flow.is_continue());
    assert_eq!(bot.status(), ConnectionStatus::Disconnected);

    bot.dispatch(InboundEvent::ConnectionEstablished, &mut console)
        .await;
    let flow = bot.dispatch(InboundEvent::ConnectionLost, &mut console).await;
    assert!(flow.is_continue());
    assert_eq!(bot.status(), ConnectionStatus::Connecting);
    assert_eq!(bot.interface(), InterfaceState::Inactive);
}

#[tokio::test]
async fn test_late_auth_result_after_failure_is_ignored() {
    let (mut bot, mut calls) = bot();
    let mut console = ScriptedConsole::default();
    bot.dispatch(InboundEvent::ConnectionEstablished, &mut console)
        .await;
    bot.dispatch(
        InboundEvent::AuthResult {
            result: LogonResult::InvalidPassword,
        },
        &mut console,
    )
    .await;
    drain(&mut calls);

    let logs = LogCapture::default();
    let _guard = logs.install();
    bot.dispatch(
        InboundEvent::AuthResult {
            result: LogonResult::Ok,
        },
        &mut console,
    )
    .await;

    assert_eq!(
        bot.status(),
        ConnectionStatus::Failed(LogonFailure::InvalidSecret)
    );
    assert!(!bot.interface_active());
    assert!(drain(&mut calls).is_empty());
    assert!(
        logs.lines().iter().any(|l| l.contains("WARN")
            && l.contains("Logon event outside a logon attempt")),
        "{:?}",
        logs.lines()
    );
}

#[tokio::test]
async fn test_challenge_event_when_authenticated_does_not_prompt() {
    let (mut bot, mut calls) = logged_on().await;
    let mut console = ScriptedConsole::answering(Some("ABCDE"));

    bot.dispatch(InboundEvent::AuthChallengeRequired, &mut console)
        .await;

    assert!(console.asked.is_empty());
    assert_eq!(bot.status(), ConnectionStatus::Authenticated);
    assert!(drain(&mut calls).is_empty());
}

// =========================================================================
// Sentry
// =========================================================================

#[tokio::test]
async fn test_trust_token_is_persisted_and_reused() {
    let (mut bot, mut calls) = bot();
    let mut console = ScriptedConsole::default();
    bot.dispatch(InboundEvent::ConnectionEstablished, &mut console)
        .await;

    bot.dispatch(
        InboundEvent::TrustTokenIssued {
            bytes: vec![0xaa, 0xbb],
        },
        &mut console,
    )
    .await;

    assert_eq!(bot.store().load("bot").unwrap().bytes(), &[0xaa, 0xbb]);
    assert_eq!(bot.status(), ConnectionStatus::Connecting);

    drain(&mut calls);
    bot.dispatch(InboundEvent::ConnectionEstablished, &mut console)
        .await;
    let sent = drain(&mut calls);
    assert_eq!(logon_of(&sent[0]).sentry, Some(vec![0xaa, 0xbb]));
}

// =========================================================================
// Faults and termination
// =========================================================================

#[tokio::test]
async fn test_transport_fault_when_authenticated_logs_exactly_once() {
    let (mut bot, mut calls) = logged_on().await;

    let logs = LogCapture::default();
    let _guard = logs.install();
    let flow = bot
        .dispatch(
            InboundEvent::TransportFault {
                message: "connection reset".into(),
            },
            &mut ScriptedConsole::default(),
        )
        .await;

    assert!(flow.is_continue());
    assert_eq!(bot.status(), ConnectionStatus::Authenticated);
    assert!(drain(&mut calls).is_empty());
    let lines = logs.lines();
    assert_eq!(lines.len(), 1, "{lines:?}");
    assert!(lines[0].contains("connection reset"));
}

#[tokio::test]
async fn test_transport_call_failure_is_swallowed() {
    let (mut bot, calls) = bot();
    drop(calls);

    let flow = bot
        .dispatch(InboundEvent::ConnectionEstablished, &mut ScriptedConsole::default())
        .await;

    assert!(flow.is_continue());
    assert_eq!(bot.status(), ConnectionStatus::Connecting);
}

#[tokio::test]
async fn test_connection_lost_breaks_and_disconnects() {
    let (mut bot, _calls) = logged_on().await;

    let flow = bot
        .dispatch(InboundEvent::ConnectionLost, &mut ScriptedConsole::default())
        .await;

    assert!(flow.is_break());
    assert_eq!(bot.status(), ConnectionStatus::Disconnected);
    assert!(!bot.interface_active());
}

// =========================================================================
// Presence, chat, application messages
// =========================================================================

#[tokio::test]
async fn test_watched_presence_logs_notable_activity() {
    let (mut bot, _calls) = logged_on().await;

    let logs = LogCapture::default();
    let _guard = logs.install();
    bot.dispatch(
        InboundEvent::PresenceChanged(
            PeerPresence::new("A", PersonaState::Online)
                .with_activity(ActivityId(570))
                .with_name("Alice"),
        ),
        &mut ScriptedConsole::default(),
    )
    .await;

    let snap = bot.presence().snapshot();
    assert_eq!((snap.online, snap.total, snap.watched), (1, 1, 1));
    assert!(
        logs.lines()
            .iter()
            .any(|l| l.contains("Alice is playing Dota 2"))
    );
}

#[tokio::test]
async fn test_plain_chat_is_logged_on_chat_target() {
    let (mut bot, _calls) = logged_on().await;

    let logs = LogCapture::default();
    let _guard = logs.install();
    bot.dispatch(
        InboundEvent::ChatMessageReceived {
            from: PeerId::new("A"),
            text: "hi bot".into(),
            entry_type: ChatEntryType::ChatMsg,
        },
        &mut ScriptedConsole::default(),
    )
    .await;

    let lines = logs.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(CHAT_TARGET));
    assert!(lines[0].contains("hi bot"));
}

#[tokio::test]
async fn test_typing_notification_is_dropped() {
    let (mut bot, _calls) = logged_on().await;

    let logs = LogCapture::default();
    let _guard = logs.install();
    bot.dispatch(
        InboundEvent::ChatMessageReceived {
            from: PeerId::new("A"),
            text: String::new(),
            entry_type: ChatEntryType::Typing,
        },
        &mut ScriptedConsole::default(),
    )
    .await;

    assert!(logs.lines().is_empty());
}

#[tokio::test]
async fn test_spectate_response_is_decoded_and_logged() {
    let (mut bot, _calls) = logged_on().await;
    let body = JsonCodec
        .encode(&SpectateFriendGameResponse {
            server_steamid: 90_071_992_547_409_921,
        })
        .unwrap();

    let logs = LogCapture::default();
    let _guard = logs.install();
    bot.dispatch(
        InboundEvent::ApplicationMessage {
            header: AppMessageHeader::new(
                AppMessageId::SPECTATE_FRIEND_GAME_RESPONSE,
            ),
            body,
        },
        &mut ScriptedConsole::default(),
    )
    .await;

    assert!(
        logs.lines()
            .iter()
            .any(|l| l.contains("90071992547409921"))
    );
}

#[tokio::test]
async fn test_garbled_spectate_response_warns_once() {
    let (mut bot, _calls) = logged_on().await;

    let logs = LogCapture::default();
    let _guard = logs.install();
    bot.dispatch(
        InboundEvent::ApplicationMessage {
            header: AppMessageHeader::new(
                AppMessageId::SPECTATE_FRIEND_GAME_RESPONSE,
            ),
            body: b"{not json".to_vec(),
        },
        &mut ScriptedConsole::default(),
    )
    .await;

    let lines = logs.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("WARN"));
}

#[tokio::test]
async fn test_unknown_application_message_is_ignored_silently() {
    let (mut bot, mut calls) = logged_on().await;

    let logs = LogCapture::default();
    let _guard = logs.install();
    let flow = bot
        .dispatch(
            InboundEvent::ApplicationMessage {
                header: AppMessageHeader::new(AppMessageId(4004)),
                body: vec![1, 2, 3],
            },
            &mut ScriptedConsole::default(),
        )
        .await;

    assert!(flow.is_continue());
    assert!(logs.lines().is_empty());
    assert!(drain(&mut calls).is_empty());
}
