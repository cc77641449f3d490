//! Operator command parsing.
//!
//! Each console line is split on whitespace. The first token picks the
//! command, the second names the target peer, and for `message` the rest
//! is the body:
//!
//! ```text
//! message <peer> <text...>   send a chat message
//! getsid <peer>              ask which server the peer's game runs on
//! ```
//!
//! Parsing never fails hard. A bad line becomes a [`CommandError`] that
//! the router reports and then forgets.

use relaybot_protocol::PeerId;

/// What an operator command asks the transport to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    SendChatMessage,
    RequestSpectate,
}

impl CommandKind {
    /// The console keyword for this command.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::SendChatMessage => "message",
            Self::RequestSpectate => "getsid",
        }
    }

    pub fn usage(self) -> &'static str {
        match self {
            Self::SendChatMessage => "message <peer> <text...>",
            Self::RequestSpectate => "getsid <peer>",
        }
    }

    fn from_keyword(word: &str) -> Option<Self> {
        [Self::SendChatMessage, Self::RequestSpectate]
            .into_iter()
            .find(|kind| kind.keyword() == word)
    }
}

/// One parsed operator command. Built per line, sent at once, never
/// stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundCommand {
    pub kind: CommandKind,
    pub target: PeerId,
    /// Remaining tokens. Empty for `getsid`.
    pub payload: Vec<String>,
}

impl OutboundCommand {
    /// Parses one console line.
    ///
    /// # Errors
    /// [`CommandError::Unknown`] for an empty line or an unknown keyword,
    /// [`CommandError::MissingArgument`] when the peer or message body is
    /// missing.
    ///
    /// # Example
    ///
    /// ```rust
    /// use relaybot::{CommandKind, OutboundCommand};
    ///
    /// let cmd = OutboundCommand::parse("message A hello world").unwrap();
    /// assert_eq!(cmd.kind, CommandKind::SendChatMessage);
    /// assert_eq!(cmd.target.as_str(), "A");
    /// assert_eq!(cmd.payload, ["hello", "world"]);
    /// ```
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut tokens = line.split_whitespace();
        let keyword = tokens.next().unwrap_or_default();
        let kind = CommandKind::from_keyword(keyword)
            .ok_or_else(|| CommandError::Unknown(keyword.to_string()))?;

        let missing = || CommandError::MissingArgument {
            usage: kind.usage(),
        };
        let target = tokens.next().map(PeerId::new).ok_or_else(missing)?;
        let payload: Vec<String> = tokens.map(str::to_string).collect();

        if kind == CommandKind::SendChatMessage && payload.is_empty() {
            return Err(missing());
        }

        Ok(Self {
            kind,
            target,
            payload,
        })
    }

    /// The chat text as sent on the wire: the body tokens joined with
    /// single spaces.
    pub fn text(&self) -> String {
        self.payload.join(" ")
    }
}

/// Why a console line was not turned into a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command {0:?}")]
    Unknown(String),

    #[error("missing argument, usage: {usage}")]
    MissingArgument { usage: &'static str },
}

/// What happened to one console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Parsed and handed to the transport.
    Sent(OutboundCommand),
    /// Empty line or unknown keyword. Nothing was sent.
    Unknown(String),
    /// A known command with bad or missing arguments. Nothing was sent.
    Invalid(String),
}

impl LineOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_keeps_body_tokens() {
        let cmd = OutboundCommand::parse("message A hello world").unwrap();

        assert_eq!(
            cmd,
            OutboundCommand {
                kind: CommandKind::SendChatMessage,
                target: PeerId::new("A"),
                payload: vec!["hello".into(), "world".into()],
            }
        );
    }

    #[test]
    fn test_parse_collapses_extra_whitespace() {
        let cmd = OutboundCommand::parse("  message   A  hi\tthere ").unwrap();

        assert_eq!(cmd.text(), "hi there");
    }

    #[test]
    fn test_parse_getsid_has_no_payload() {
        let cmd = OutboundCommand::parse("getsid 76561198000000000").unwrap();

        assert_eq!(cmd.kind, CommandKind::RequestSpectate);
        assert_eq!(cmd.target.as_str(), "76561198000000000");
        assert!(cmd.payload.is_empty());
    }

    #[test]
    fn test_parse_unknown_keyword_is_unknown() {
        assert_eq!(
            OutboundCommand::parse("bogus A"),
            Err(CommandError::Unknown("bogus".into()))
        );
    }

    #[test]
    fn test_parse_empty_line_is_unknown() {
        for line in ["", "   ", "\t"] {
            assert!(matches!(
                OutboundCommand::parse(line),
                Err(CommandError::Unknown(_))
            ));
        }
    }

    #[test]
    fn test_parse_keyword_is_case_sensitive() {
        assert!(matches!(
            OutboundCommand::parse("MESSAGE A hi"),
            Err(CommandError::Unknown(_))
        ));
    }

    #[test]
    fn test_parse_missing_arguments_are_invalid() {
        for line in ["message", "message A", "getsid"] {
            assert!(
                matches!(
                    OutboundCommand::parse(line),
                    Err(CommandError::MissingArgument { .. })
                ),
                "{line:?} should be missing an argument"
            );
        }
    }

    #[test]
    fn test_missing_argument_message_shows_usage() {
        let err = OutboundCommand::parse("getsid").unwrap_err();
        assert_eq!(err.to_string(), "missing argument, usage: getsid <peer>");
    }
}
