//! Handle to the hosted store backend.
//!
//! The backend is an external service exposing three surfaces this client
//! cares about:
//!
//! - row CRUD over `{url}/rest/v1/{table}` ([`rows`])
//! - an auth/session API under `{url}/auth/v1` ([`session`])
//! - a per-table change feed under `{url}/realtime/v1` ([`feed`])
//!
//! [`Backend`] is lazily configured: built from `Option<BackendConfig>`, a
//! `None` produces an unconfigured handle whose callers degrade to no-op
//! behavior instead of erroring. The handle is cheaply cloneable and shared
//! by the store façade, the subscription manager, and the login flow -
//! always passed in explicitly, never reached for as a global.

pub mod feed;
pub mod rows;
pub mod session;

pub use feed::{ChangeEvent, ChangeKind, FeedChannel, FeedFilter, RowPredicate};
pub use rows::RowQuery;
pub use session::{AuthUser, Session};

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::sync::RwLock;
use url::Url;

use crate::config::BackendConfig;

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the request.
    #[error("backend error ({status}): {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },

    /// JSON (de)serialization failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The handle was built without backend configuration.
    #[error("backend is not configured")]
    Unconfigured,
}

/// Handle to the hosted store backend.
///
/// Cheaply cloneable; all clones share one HTTP client and one cached
/// session.
#[derive(Clone)]
pub struct Backend {
    inner: Option<Arc<BackendInner>>,
}

struct BackendInner {
    client: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
    session: RwLock<Option<Session>>,
}

impl Backend {
    /// Create a handle from optional configuration.
    ///
    /// `None` yields an unconfigured handle; see [`Self::is_configured`].
    #[must_use]
    pub fn new(config: Option<&BackendConfig>) -> Self {
        let inner = config.map(|config| {
            Arc::new(BackendInner {
                client: reqwest::Client::new(),
                base_url: config.url.clone(),
                anon_key: config.anon_key.clone(),
                session: RwLock::new(None),
            })
        });
        Self { inner }
    }

    /// A handle with no backend behind it.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self { inner: None }
    }

    /// Whether a backend service is configured.
    ///
    /// When false, row and feed operations return
    /// [`BackendError::Unconfigured`]; callers that promise silent
    /// degradation must check this before calling.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.inner.is_some()
    }

    fn inner(&self) -> Result<&Arc<BackendInner>, BackendError> {
        self.inner.as_ref().ok_or(BackendError::Unconfigured)
    }

    /// Build an absolute URL under the backend base.
    fn endpoint(inner: &BackendInner, path: &str) -> String {
        let base = inner.base_url.as_str().trim_end_matches('/');
        format!("{base}/{path}")
    }

    /// The bearer token for a request: the session token when one is
    /// cached, the anonymous key otherwise.
    async fn bearer_token(inner: &BackendInner) -> String {
        let session = inner.session.read().await;
        session.as_ref().map_or_else(
            || inner.anon_key.expose_secret().to_string(),
            |s| s.access_token().expose_secret().to_string(),
        )
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("configured", &self.is_configured())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_handle() {
        let backend = Backend::unconfigured();
        assert!(!backend.is_configured());
        assert!(matches!(backend.inner(), Err(BackendError::Unconfigured)));
    }

    #[test]
    fn test_endpoint_joins_cleanly() {
        let inner = BackendInner {
            client: reqwest::Client::new(),
            base_url: Url::parse("https://store.example.com/").expect("static url"),
            anon_key: SecretString::from("key"),
            session: RwLock::new(None),
        };
        assert_eq!(
            Backend::endpoint(&inner, "rest/v1/products"),
            "https://store.example.com/rest/v1/products"
        );
    }
}
