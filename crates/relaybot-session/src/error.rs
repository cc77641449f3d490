//! Error types for the session layer.

use crate::ConnectionStatus;

/// Errors that can occur during session management.
///
/// None of these end the session. Storage errors are logged by the
/// caller and the in-memory token stays usable for the rest of the run.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Reading or writing the sentry file failed.
    #[error("sentry storage failed for account {account}: {source}")]
    Storage {
        account: String,
        #[source]
        source: std::io::Error,
    },

    /// The account name can't be used as a storage key (empty, or
    /// contains characters that would escape the storage directory).
    #[error("account name {0:?} is not a valid storage key")]
    InvalidAccountName(String),

    /// The requested transition doesn't exist from the current status.
    #[error("cannot {action} while {status:?}")]
    InvalidTransition {
        action: &'static str,
        status: ConnectionStatus,
    },
}
