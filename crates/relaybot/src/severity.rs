//! Log severities as the operator sees them.
//!
//! `tracing` has five levels; the operator console shows six severities.
//! Two of them ride on dedicated targets instead of levels:
//!
//! | Severity   | Emitted as                               | Label     |
//! |------------|------------------------------------------|-----------|
//! | `Debug`    | `trace!` / `debug!`                      | `-DBUG-`  |
//! | `Info`     | `info!`                                  | `+INFO+`  |
//! | `Warning`  | `warn!`                                  | `*WARN*`  |
//! | `Error`    | `error!`                                 | `≡ERRR≡`  |
//! | `Critical` | `error!(target: CRITICAL_TARGET, ..)`    | `☼CRIT☼`  |
//! | `Chat`     | `info!(target: CHAT_TARGET, ..)`         | `!CHAT!`  |
//!
//! [`Severity::level`] and [`Severity::of`] are the two directions of
//! that one table.

use tracing::{Level, Metadata};

/// Target for incoming chat lines.
pub const CHAT_TARGET: &str = "relaybot::chat";

/// Target for failures that end the logon attempt.
pub const CRITICAL_TARGET: &str = "relaybot::critical";

/// How loud a log line is, on the operator's scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
    Chat,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Self::Debug,
        Self::Info,
        Self::Warning,
        Self::Error,
        Self::Critical,
        Self::Chat,
    ];

    /// The `tracing` level this severity is emitted at.
    pub fn level(self) -> Level {
        match self {
            Self::Debug => Level::DEBUG,
            Self::Info | Self::Chat => Level::INFO,
            Self::Warning => Level::WARN,
            Self::Error | Self::Critical => Level::ERROR,
        }
    }

    /// The fixed-width tag printed before the message.
    pub fn label(self) -> &'static str {
        match self {
            Self::Debug => "-DBUG-",
            Self::Info => "+INFO+",
            Self::Warning => "*WARN*",
            Self::Error => "≡ERRR≡",
            Self::Critical => "☼CRIT☼",
            Self::Chat => "!CHAT!",
        }
    }

    /// The severity of an event or span.
    pub fn of(meta: &Metadata<'_>) -> Self {
        Self::from_parts(meta.target(), meta.level())
    }

    /// The severity for a target and level. The chat and critical targets
    /// win over the level; anything quieter than `DEBUG` is `Debug`.
    pub fn from_parts(target: &str, level: &Level) -> Self {
        let by_target = Self::ALL
            .into_iter()
            .find(|severity| severity.target() == Some(target));
        by_target
            .or_else(|| {
                Self::ALL.into_iter().find(|severity| {
                    severity.target().is_none() && severity.level() == *level
                })
            })
            .unwrap_or(Self::Debug)
    }

    /// The target this severity is emitted on.
    pub fn target(self) -> Option<&'static str> {
        match self {
            Self::Chat => Some(CHAT_TARGET),
            Self::Critical => Some(CRITICAL_TARGET),
            _ => None,
        }
    }
}
