//! Credential store: the single process-wide session.
//!
//! # Design
//! - One owned [`CredentialStore`] shared by `Rc`; no ambient global access.
//! - Readers get owned snapshots so no borrow outlives a call (and none is
//!   ever held across an await point).
//! - Writers are login ([`CredentialStore::establish`]), logout, and the
//!   pipeline's refresh/expiry steps (crate-private).
//! - Every establish/clear bumps an epoch. Pipeline writes carry the epoch
//!   observed when their request started and are dropped when stale, so a
//!   late refresh failure cannot wipe a session created by a newer login.
//! - Persistence goes through [`TokenStorage`]; storage failures are logged
//!   and never block the in-memory session.

use std::cell::{Cell, RefCell};
use std::fmt;

use comicshelf_api_models::{RefreshResponse, TokenPair};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Access/refresh credential pair held by the client.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh: Option<String>,
}

impl Session {
    /// Build a session; blank tokens are treated as absent.
    #[must_use]
    pub fn new(access: Option<String>, refresh: Option<String>) -> Self {
        Self {
            access: access.filter(|token| !token.trim().is_empty()),
            refresh: refresh.filter(|token| !token.trim().is_empty()),
        }
    }

    /// Session holding both tokens of a login response.
    #[must_use]
    pub fn from_tokens(tokens: TokenPair) -> Self {
        Self::new(Some(tokens.access), Some(tokens.refresh))
    }

    /// Current access token.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access.as_deref()
    }

    /// Current refresh token.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh.as_deref()
    }

    /// Authenticated means an access token is present, whatever the refresh token says.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.access.is_some()
    }

    /// Neither token is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access.is_none() && self.refresh.is_none()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access", &self.access.as_ref().map(|_| "<redacted>"))
            .field("refresh", &self.refresh.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Persistence backend for the session (local storage, a file, memory).
pub trait TokenStorage {
    /// Read the persisted session; missing data is an empty session.
    ///
    /// # Errors
    /// Returns [`StorageError`] when the backend cannot be read or decoded.
    fn load(&self) -> Result<Session, StorageError>;

    /// Persist `session`, replacing whatever was stored.
    ///
    /// # Errors
    /// Returns [`StorageError`] when the backend cannot be written.
    fn save(&self, session: &Session) -> Result<(), StorageError>;

    /// Remove persisted tokens.
    ///
    /// # Errors
    /// Returns [`StorageError`] when the backend cannot be written.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Non-persistent storage.
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    stored: RefCell<Session>,
}

impl MemoryTokenStorage {
    /// Storage pre-populated with `session`.
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self {
            stored: RefCell::new(session),
        }
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> Result<Session, StorageError> {
        Ok(self.stored.borrow().clone())
    }

    fn save(&self, session: &Session) -> Result<(), StorageError> {
        *self.stored.borrow_mut() = session.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.stored.borrow_mut() = Session::default();
        Ok(())
    }
}

/// Process-wide owner of the [`Session`].
pub struct CredentialStore {
    session: RefCell<Session>,
    epoch: Cell<u64>,
    expiry_reported: Cell<bool>,
    storage: Box<dyn TokenStorage>,
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("session", &*self.session.borrow())
            .field("epoch", &self.epoch.get())
            .field("expiry_reported", &self.expiry_reported.get())
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Rehydrate the session from `storage`.
    #[must_use]
    pub fn new(storage: impl TokenStorage + 'static) -> Self {
        let session = storage.load().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "discarding unreadable persisted session");
            Session::default()
        });
        Self {
            session: RefCell::new(session),
            epoch: Cell::new(0),
            expiry_reported: Cell::new(false),
            storage: Box::new(storage),
        }
    }

    /// Store backed by memory only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryTokenStorage::default())
    }

    /// Owned copy of the current session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.session.borrow().clone()
    }

    /// Current access token.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.session.borrow().access.clone()
    }

    pub(crate) fn refresh_token(&self) -> Option<String> {
        self.session.borrow().refresh.clone()
    }

    /// Whether requests are sent with a credential.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.borrow().is_authenticated()
    }

    /// Generation of the session; changes on every establish and clear.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch.get()
    }

    /// Install the tokens of a successful login.
    pub fn establish(&self, tokens: TokenPair) {
        let session = Session::from_tokens(tokens);
        self.persist(&session);
        *self.session.borrow_mut() = session;
        self.bump_epoch();
        self.expiry_reported.set(false);
        tracing::debug!(epoch = self.epoch.get(), "session established");
    }

    /// Explicit sign-out: clear memory and storage.
    pub fn logout(&self) {
        self.clear_tokens();
        self.expiry_reported.set(false);
        tracing::debug!(epoch = self.epoch.get(), "session cleared by logout");
    }

    /// Store a refreshed access token in place. Returns `false` when the
    /// session changed since `epoch` and the result was discarded.
    pub(crate) fn apply_refresh(&self, epoch: u64, refreshed: RefreshResponse) -> bool {
        if self.epoch.get() != epoch {
            return false;
        }
        let next = {
            let current = self.session.borrow();
            let refresh = refreshed.refresh.or_else(|| current.refresh.clone());
            Session::new(Some(refreshed.access), refresh)
        };
        self.persist(&next);
        *self.session.borrow_mut() = next;
        true
    }

    /// Destroy the session after an unrecoverable refresh failure.
    ///
    /// Returns `true` only for the first expiry since the last login/logout;
    /// the caller fires the login redirect exactly when this is `true`.
    pub(crate) fn expire(&self, epoch: u64) -> bool {
        if self.epoch.get() != epoch {
            return false;
        }
        self.clear_tokens();
        !self.expiry_reported.replace(true)
    }

    /// Destroy the session after a final unauthorized response.
    pub(crate) fn reject(&self, epoch: u64) {
        if self.epoch.get() == epoch {
            self.clear_tokens();
        }
    }

    fn clear_tokens(&self) {
        *self.session.borrow_mut() = Session::default();
        self.bump_epoch();
        if let Err(err) = self.storage.clear() {
            tracing::warn!(error = %err, "failed to clear persisted session");
        }
    }

    fn bump_epoch(&self) {
        self.epoch.set(self.epoch.get().wrapping_add(1));
    }

    fn persist(&self, session: &Session) {
        if let Err(err) = self.storage.save(session) {
            tracing::warn!(error = %err, "failed to persist session");
        }
    }
}
