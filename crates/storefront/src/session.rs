//! Signed-in session context.
//!
//! A [`Session`] is created once at startup and handed to the
//! [`ApiClient`](crate::ApiClient). Everything else reads it through accessor
//! methods; only login, registration, and sign-out change it. Each change is
//! written through to a [`SessionStore`] so the session survives restarts.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use blossom_core::{MemberId, UserRole};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::types::User;

/// Errors raised while persisting the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to access session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What gets persisted between runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    #[serde(default)]
    pub user: Option<User>,
    /// Last push token handed over by the native shell.
    #[serde(default)]
    pub push_token: Option<String>,
}

/// Storage backend for the session.
pub trait SessionStore: Send + Sync + fmt::Debug {
    /// Load the stored session. A missing or unreadable record yields an
    /// empty session.
    fn load(&self) -> PersistedSession;

    /// Replace the stored session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    fn save(&self, session: &PersistedSession) -> Result<(), SessionError>;

    /// Remove the stored session entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored record cannot be removed.
    fn clear(&self) -> Result<(), SessionError>;
}

/// Session kept in a JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> PersistedSession {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return PersistedSession::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read session file");
                return PersistedSession::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Discarding unreadable session file");
            PersistedSession::default()
        })
    }

    fn save(&self, session: &PersistedSession) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_string_pretty(session)?;
        write_private(&self.path, json.as_bytes()).map_err(|e| self.io_error(e))
    }

    fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// Write `contents` to a file only the current user can read (mode 0600 on unix).
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // `mode` only applies on creation; tighten a file left by an older run
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)
}

/// Session kept in memory only.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    saved: Mutex<Option<PersistedSession>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing session.
    #[must_use]
    pub fn with(session: PersistedSession) -> Self {
        Self {
            saved: Mutex::new(Some(session)),
        }
    }

    /// Whether anything is currently stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> PersistedSession {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_default()
    }

    fn save(&self, session: &PersistedSession) -> Result<(), SessionError> {
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Shared, persisted session state.
///
/// Cloning is cheap; clones observe the same state.
#[derive(Clone)]
pub struct Session {
    state: Arc<RwLock<PersistedSession>>,
    store: Arc<dyn SessionStore>,
}

impl Session {
    /// Restore the session from `store`.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        let state = store.load();
        if let Some(user) = &state.user {
            debug!(member_id = %user.id, "Restored session");
        }
        Self {
            state: Arc::new(RwLock::new(state)),
            store,
        }
    }

    /// A session that is never persisted.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    /// File-backed session when `BLOSSOM_SESSION_FILE` is set, in-memory otherwise.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        match &config.session_file {
            Some(path) => Self::new(Arc::new(FileSessionStore::new(path))),
            None => Self::in_memory(),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&PersistedSession) -> T) -> T {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Apply a change and write the result through to the store.
    fn update(&self, f: impl FnOnce(&mut PersistedSession)) -> Result<(), SessionError> {
        let snapshot = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut state);
            state.clone()
        };

        if snapshot.user.is_none() && snapshot.push_token.is_none() {
            self.store.clear()
        } else {
            self.store.save(&snapshot)
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read(|s| s.user.is_some())
    }

    /// The signed-in member, if any.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.read(|s| s.user.clone())
    }

    #[must_use]
    pub fn member_id(&self) -> Option<MemberId> {
        self.read(|s| s.user.as_ref().map(|u| u.id))
    }

    #[must_use]
    pub fn role(&self) -> Option<UserRole> {
        self.read(|s| s.user.as_ref().map(|u| u.role))
    }

    /// Whether the signed-in member holds a back-office role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.read(|s| s.user.as_ref().is_some_and(User::is_admin))
    }

    /// Token for the `Authorization` header.
    #[must_use]
    pub fn bearer_token(&self) -> Option<SecretString> {
        self.read(|s| s.user.as_ref().and_then(|u| u.token.clone()))
    }

    #[must_use]
    pub fn push_token(&self) -> Option<String> {
        self.read(|s| s.push_token.clone())
    }

    /// Remember the push token delivered by the native shell.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be persisted.
    pub fn set_push_token(&self, token: impl Into<String>) -> Result<(), SessionError> {
        let token = token.into();
        self.update(|s| s.push_token = Some(token))
    }

    pub(crate) fn sign_in(&self, user: User) -> Result<(), SessionError> {
        info!(member_id = %user.id, role = %user.role, "Signed in");
        self.update(|s| s.user = Some(user))
    }

    /// Forget the signed-in member, in memory and in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored copy cannot be removed.
    pub fn sign_out(&self) -> Result<(), SessionError> {
        if self.is_authenticated() {
            info!("Signed out");
        }
        self.update(|s| s.user = None)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.read(|s| {
            f.debug_struct("Session")
                .field("user", &s.user)
                .field("push_token", &s.push_token.as_ref().map(|_| "[SET]"))
                .field("store", &self.store)
                .finish()
        })
    }
}
