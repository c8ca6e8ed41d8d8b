//! Durable local session storage.
//!
//! A small JSON file holding exactly three things: the last authenticated
//! profile snapshot, the backend session token that produced it, and the
//! owner-dashboard flag. Read once at startup (trust-on-read - validation
//! against the live backend is the login flow's job), written on login,
//! cleared on logout.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use copperkart_core::UserId;

use crate::auth::CustomerProfile;
use crate::backend::Session;

/// Errors writing or clearing the session file.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("session file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session file encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Everything the session file holds.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StoredState {
    /// Last authenticated customer, provisional until revalidated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<CustomerProfile>,
    /// Backend session backing the snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<StoredAuth>,
    /// Whether an owner-dashboard session is active.
    #[serde(default)]
    pub admin_session: bool,
}

/// Persisted backend session parts.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredAuth {
    pub user_id: UserId,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredAuth {
    /// Capture the parts of a live session worth persisting.
    #[must_use]
    pub fn of(session: &Session) -> Self {
        Self {
            user_id: session.user_id(),
            access_token: session.access_token().expose_secret().to_string(),
            expires_at: session.expires_at(),
        }
    }

    /// Rebuild a live session from the stored parts.
    #[must_use]
    pub fn into_session(self) -> Session {
        Session::from_parts(
            self.user_id,
            SecretString::from(self.access_token),
            self.expires_at,
        )
    }
}

impl std::fmt::Debug for StoredAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredAuth")
            .field("user_id", &self.user_id)
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// File-backed key-value store for session state.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// A store persisting to `path`. Nothing touches the filesystem until
    /// the first load or save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored state. A missing file is simply empty state; an
    /// unreadable or corrupt file is logged and treated the same way.
    #[must_use]
    pub fn load(&self) -> StoredState {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return StoredState::default();
            }
            Err(error) => {
                warn!(path = %self.path.display(), %error, "failed to read session file");
                return StoredState::default();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(state) => state,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "corrupt session file, starting fresh");
                StoredState::default()
            }
        }
    }

    /// Write the full state, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn save(&self, state: &StoredState) -> Result<(), SessionStoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(state)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }

    /// Load, modify, save.
    ///
    /// # Errors
    ///
    /// Same as [`Self::save`].
    pub fn update(
        &self,
        mutate: impl FnOnce(&mut StoredState),
    ) -> Result<(), SessionStoreError> {
        let mut state = self.load();
        mutate(&mut state);
        self.save(&state)
    }

    /// Remove the session file. Removing a file that does not exist is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error for any other I/O failure.
    pub fn clear(&self) -> Result<(), SessionStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> SessionStore {
        let mut path = std::env::temp_dir();
        path.push(format!("copperkart-test-{name}-{}", uuid::Uuid::new_v4()));
        path.push("session.json");
        SessionStore::new(path)
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let store = temp_store("missing");
        assert_eq!(store.load(), StoredState::default());
    }

    #[test]
    fn test_save_load_clear_roundtrip() {
        let store = temp_store("roundtrip");

        let state = StoredState {
            profile: None,
            auth: Some(StoredAuth {
                user_id: UserId::generate(),
                access_token: "token".to_string(),
                expires_at: None,
            }),
            admin_session: true,
        };
        store.save(&state).unwrap();
        assert_eq!(store.load(), state);

        store.clear().unwrap();
        assert_eq!(store.load(), StoredState::default());

        // Clearing twice is fine.
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_empty_state() {
        let store = temp_store("corrupt");
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), b"{ not json").unwrap();
        assert_eq!(store.load(), StoredState::default());
    }

    #[test]
    fn test_update_merges() {
        let store = temp_store("update");
        store.update(|state| state.admin_session = true).unwrap();
        assert!(store.load().admin_session);
    }

    #[test]
    fn test_stored_auth_debug_redacts_token() {
        let auth = StoredAuth {
            user_id: UserId::generate(),
            access_token: "jwt-secret".to_string(),
            expires_at: None,
        };
        let debug_output = format!("{auth:?}");
        assert!(!debug_output.contains("jwt-secret"));
    }
}
