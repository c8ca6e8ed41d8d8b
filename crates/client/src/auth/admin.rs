//! Owner dashboard login gate.
//!
//! The owner credential is configured, not hardcoded: an email plus an
//! Argon2 PHC hash from the environment. Leaving the pair unset disables
//! the dashboard entirely. The active dashboard session is a single flag in
//! the durable session store, read back trust-on-read at startup.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::instrument;

use crate::config::AdminConfig;
use crate::session_store::{SessionStore, SessionStoreError};

/// Errors from the owner login gate.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    /// No owner credential is configured.
    #[error("owner login is not configured")]
    Disabled,

    /// Email or password is wrong. One error for both, on purpose.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Persisting the dashboard flag failed.
    #[error("session storage error: {0}")]
    Storage(#[from] SessionStoreError),
}

/// Gate in front of the owner dashboard.
pub struct AdminGate {
    credentials: Option<AdminConfig>,
    sessions: SessionStore,
}

impl AdminGate {
    /// Build the gate from optional configured credentials.
    #[must_use]
    pub const fn new(credentials: Option<AdminConfig>, sessions: SessionStore) -> Self {
        Self {
            credentials,
            sessions,
        }
    }

    /// Whether owner login is possible at all.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    /// Verify the owner credential and mark the dashboard session active.
    ///
    /// # Errors
    ///
    /// Returns `Disabled` when no credential is configured,
    /// `InvalidCredentials` on any mismatch, and `Storage` when the flag
    /// cannot be persisted.
    #[instrument(skip(self, email, password))]
    pub fn login(&self, email: &str, password: &str) -> Result<(), AdminAuthError> {
        let credentials = self.credentials.as_ref().ok_or(AdminAuthError::Disabled)?;

        if !email.trim().eq_ignore_ascii_case(&credentials.email) {
            return Err(AdminAuthError::InvalidCredentials);
        }
        verify_password(password, credentials.password_hash.expose_secret())?;

        self.sessions.update(|state| state.admin_session = true)?;
        Ok(())
    }

    /// Whether a dashboard session is active (trust-on-read).
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.sessions.load().admin_session
    }

    /// End the dashboard session.
    ///
    /// # Errors
    ///
    /// Returns `Storage` when the flag cannot be cleared.
    pub fn logout(&self) -> Result<(), AdminAuthError> {
        self.sessions.update(|state| state.admin_session = false)?;
        Ok(())
    }
}

impl std::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGate")
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

/// Verify a password against an Argon2 PHC hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AdminAuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AdminAuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AdminAuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};
    use secrecy::SecretString;

    fn temp_sessions(name: &str) -> SessionStore {
        let mut path = std::env::temp_dir();
        path.push(format!("copperkart-admin-{name}-{}", uuid::Uuid::new_v4()));
        path.push("session.json");
        SessionStore::new(path)
    }

    fn hashed(password: &str) -> String {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string()
    }

    fn gate(name: &str, password: &str) -> AdminGate {
        AdminGate::new(
            Some(AdminConfig {
                email: "owner@copperkart.in".to_string(),
                password_hash: SecretString::from(hashed(password)),
            }),
            temp_sessions(name),
        )
    }

    #[test]
    fn test_login_and_logout() {
        let gate = gate("roundtrip", "correct horse battery");
        assert!(!gate.is_logged_in());

        gate.login("owner@copperkart.in", "correct horse battery")
            .unwrap();
        assert!(gate.is_logged_in());

        gate.logout().unwrap();
        assert!(!gate.is_logged_in());
    }

    #[test]
    fn test_email_is_case_insensitive() {
        let gate = gate("case", "pw-123456");
        assert!(gate.login("Owner@CopperKart.in", "pw-123456").is_ok());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let gate = gate("wrong-pw", "pw-123456");
        assert!(matches!(
            gate.login("owner@copperkart.in", "nope"),
            Err(AdminAuthError::InvalidCredentials)
        ));
        assert!(!gate.is_logged_in());
    }

    #[test]
    fn test_wrong_email_rejected_with_same_error() {
        let gate = gate("wrong-email", "pw-123456");
        assert!(matches!(
            gate.login("someone@else.in", "pw-123456"),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_unconfigured_gate_is_disabled() {
        let gate = AdminGate::new(None, temp_sessions("disabled"));
        assert!(!gate.is_enabled());
        assert!(matches!(
            gate.login("owner@copperkart.in", "pw"),
            Err(AdminAuthError::Disabled)
        ));
    }
}
