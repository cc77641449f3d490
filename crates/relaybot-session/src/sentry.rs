//! Credential store for the device-trust token ("sentry").
//!
//! The service issues a sentry once it has approved this device. Sending
//! it back on later logons skips the second-factor challenge, so it has
//! to survive restarts.
//!
//! The store is a trait so the state machine can run against
//! [`FileSentryStore`] in production and [`MemorySentryStore`] in tests.
//! Reads never fail loudly: an unreadable token is simply absent, and
//! the logon proceeds without one.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::SessionError;

// ---------------------------------------------------------------------------
// TrustToken
// ---------------------------------------------------------------------------

/// An opaque server-issued trust token and the account it belongs to.
///
/// Never mutated; a new token from the service replaces it wholesale.
#[derive(Clone, PartialEq, Eq)]
pub struct TrustToken {
    account: String,
    bytes: Vec<u8>,
}

impl TrustToken {
    pub fn new(account: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            account: account.into(),
            bytes,
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

// The token is a credential: show its size, not its content.
impl fmt::Debug for TrustToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustToken")
            .field("account", &self.account)
            .field("len", &self.bytes.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SentryStore
// ---------------------------------------------------------------------------

/// Durable, per-account storage for trust tokens.
pub trait SentryStore {
    /// Returns the stored token for `account`, or `None` if there is none
    /// or it can't be read. Never an error.
    fn load(&self, account: &str) -> Option<TrustToken>;

    /// Stores `bytes` as the token for `account`, overwriting any previous
    /// token. Saving the same bytes twice leaves storage unchanged.
    ///
    /// # Errors
    /// Returns [`SessionError::Storage`] if the write fails, or
    /// [`SessionError::InvalidAccountName`] if the account can't be used
    /// as a key.
    fn save(&mut self, account: &str, bytes: &[u8]) -> Result<(), SessionError>;
}

// ---------------------------------------------------------------------------
// FileSentryStore
// ---------------------------------------------------------------------------

/// Stores one file per account, `<dir>/<account>.sentry`.
///
/// Every read and write opens the file, does its work, and closes it
/// again before returning, error paths included.
#[derive(Debug, Clone)]
pub struct FileSentryStore {
    dir: PathBuf,
}

impl FileSentryStore {
    /// A store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file that holds `account`'s token.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidAccountName`] for an empty name or
    /// one with characters outside `[A-Za-z0-9_-]`.
    pub fn path_for(&self, account: &str) -> Result<PathBuf, SessionError> {
        let valid = !account.is_empty()
            && account
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(SessionError::InvalidAccountName(account.to_string()));
        }
        Ok(self.dir.join(format!("{account}.sentry")))
    }
}

impl SentryStore for FileSentryStore {
    fn load(&self, account: &str) -> Option<TrustToken> {
        let path = match self.path_for(account) {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!(error = %e, "skipping sentry lookup");
                return None;
            }
        };

        match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => {
                tracing::debug!(path = %path.display(), "sentry file is empty");
                None
            }
            Ok(bytes) => Some(TrustToken::new(account, bytes)),
            Err(e) => {
                tracing::debug!(
                    path = %path.display(),
                    error = %e,
                    "no readable sentry file"
                );
                None
            }
        }
    }

    fn save(&mut self, account: &str, bytes: &[u8]) -> Result<(), SessionError> {
        let path = self.path_for(account)?;
        let storage_error = |source| SessionError::Storage {
            account: account.to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(storage_error)?;

        // Write-then-rename so a crash never leaves a truncated token.
        let staging = path.with_extension("sentry.tmp");
        fs::write(&staging, bytes).map_err(storage_error)?;
        fs::rename(&staging, &path).map_err(storage_error)?;

        tracing::debug!(path = %path.display(), len = bytes.len(), "sentry saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemorySentryStore
// ---------------------------------------------------------------------------

/// A [`SentryStore`] that lives in a `HashMap`. Nothing survives the
/// process; useful for tests and for running without a writable disk.
#[derive(Debug, Clone, Default)]
pub struct MemorySentryStore {
    tokens: HashMap<String, Vec<u8>>,
}

impl MemorySentryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeds a token, as if a previous run had saved it.
    pub fn with_token(
        mut self,
        account: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.tokens.insert(account.into(), bytes);
        self
    }

    /// Number of accounts with a stored token.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl SentryStore for MemorySentryStore {
    fn load(&self, account: &str) -> Option<TrustToken> {
        self.tokens
            .get(account)
            .filter(|bytes| !bytes.is_empty())
            .map(|bytes| TrustToken::new(account, bytes.clone()))
    }

    fn save(&mut self, account: &str, bytes: &[u8]) -> Result<(), SessionError> {
        self.tokens.insert(account.to_string(), bytes.to_vec());
        Ok(())
    }
}
