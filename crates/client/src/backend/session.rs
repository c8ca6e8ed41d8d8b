//! Backend auth/session API.
//!
//! The hosted backend issues bearer sessions under `{url}/auth/v1`. This
//! client only ever needs three calls: create an anonymous session, ask who
//! the current session belongs to, and sign out. The current session is
//! cached on the handle so row and feed requests pick up its token
//! automatically.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use copperkart_core::UserId;

use super::{Backend, BackendError};

/// An authenticated backend session.
#[derive(Clone)]
pub struct Session {
    user_id: UserId,
    access_token: SecretString,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Rebuild a session from previously stored parts (see the durable
    /// session store).
    #[must_use]
    pub fn from_parts(
        user_id: UserId,
        access_token: SecretString,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            user_id,
            access_token,
            expires_at,
        }
    }

    /// The identity this session belongs to.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// The bearer token for this session.
    #[must_use]
    pub const fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    /// When the token expires, if the backend said.
    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// The identity behind a session, as reported by the backend.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: UserId,
}

impl Backend {
    /// The cached session, if one is established.
    pub async fn session(&self) -> Option<Session> {
        let inner = self.inner.as_ref()?;
        inner.session.read().await.clone()
    }

    /// Install a session restored from durable storage.
    ///
    /// No validation happens here; call [`Self::current_user`] afterwards to
    /// find out whether the backend still honors it.
    pub async fn adopt_session(&self, session: Session) {
        if let Some(inner) = self.inner.as_ref() {
            *inner.session.write().await = Some(session);
        }
    }

    /// Create an anonymous session and cache it on the handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is unconfigured, the transport fails,
    /// or the backend refuses to mint a session.
    #[instrument(skip(self))]
    pub async fn sign_in_anonymously(&self) -> Result<Session, BackendError> {
        let inner = self.inner()?;

        let response = inner
            .client
            .post(Self::endpoint(inner, "auth/v1/token"))
            .query(&[("grant_type", "anonymous")])
            .header("apikey", inner.anon_key.expose_secret())
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let token: TokenResponse = Self::read_json(response).await?;

        let session = Session {
            user_id: token.user.id,
            access_token: SecretString::from(token.access_token),
            expires_at: token
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
        };

        *inner.session.write().await = Some(session.clone());
        Ok(session)
    }

    /// Ask the backend who the cached session belongs to.
    ///
    /// `Ok(None)` means the backend no longer honors the session (or none is
    /// cached) - the caller should clear local authenticated state.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport failures or unexpected backend
    /// responses; a rejected session is `Ok(None)`, not an error.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<Option<AuthUser>, BackendError> {
        let inner = self.inner()?;

        if inner.session.read().await.is_none() {
            return Ok(None);
        }

        let response = inner
            .client
            .get(Self::endpoint(inner, "auth/v1/user"))
            .header("apikey", inner.anon_key.expose_secret())
            .bearer_auth(Self::bearer_token(inner).await)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            // Session gone; drop the stale token so later requests fall back
            // to the anonymous key.
            *inner.session.write().await = None;
            return Ok(None);
        }

        let user: AuthUser = Self::read_json(response).await?;
        Ok(Some(user))
    }

    /// Sign out of the backend session and forget the cached token.
    ///
    /// The local cache is cleared even when the network call fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is unconfigured or the sign-out call
    /// fails; callers treating logout as best-effort may ignore it.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), BackendError> {
        let inner = self.inner()?;

        let token = Self::bearer_token(inner).await;
        *inner.session.write().await = None;

        let response = inner
            .client
            .post(Self::endpoint(inner, "auth/v1/logout"))
            .header("apikey", inner.anon_key.expose_secret())
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status,
                message: message.chars().take(500).collect(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_debug_redacts_token() {
        let session = Session::from_parts(
            UserId::generate(),
            SecretString::from("jwt-token-value"),
            None,
        );
        let debug_output = format!("{session:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("jwt-token-value"));
    }

    #[tokio::test]
    async fn test_unconfigured_session_is_none() {
        let backend = Backend::unconfigured();
        assert!(backend.session().await.is_none());

        // Adopting on an unconfigured handle is a quiet no-op.
        backend
            .adopt_session(Session::from_parts(
                UserId::generate(),
                SecretString::from("token"),
                None,
            ))
            .await;
        assert!(backend.session().await.is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_sign_in_errors() {
        let backend = Backend::unconfigured();
        assert!(matches!(
            backend.sign_in_anonymously().await,
            Err(BackendError::Unconfigured)
        ));
    }
}
