//! Composition root wiring the SDK together.
//!
//! One [`Client`] owns the backend handle, the subscription registry, the
//! store façade, the login flow, and the owner gate - everything downstream
//! receives its collaborators from here instead of reaching for globals.

use std::sync::Arc;

use crate::auth::{AdminGate, Authenticator, OtpSender, TracingOtpSender};
use crate::backend::Backend;
use crate::config::{ClientConfig, ConfigError};
use crate::realtime::SubscriptionManager;
use crate::session_store::SessionStore;
use crate::store::Store;

/// The assembled Copperkart client.
///
/// Cheaply cloneable via `Arc`; clones share the backend connection, the
/// subscription registry, and the session state.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    backend: Backend,
    realtime: SubscriptionManager,
    store: Store,
    auth: Authenticator,
    admin: AdminGate,
}

impl Client {
    /// Assemble a client with the default (tracing-backed) OTP sender.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self::with_sender(config, Arc::new(TracingOtpSender))
    }

    /// Assemble a client with an injected OTP delivery channel.
    #[must_use]
    pub fn with_sender(config: ClientConfig, sender: Arc<dyn OtpSender>) -> Self {
        let backend = Backend::new(config.backend.as_ref());
        let realtime = SubscriptionManager::new(backend.clone());
        let store = Store::new(backend.clone(), realtime.clone());
        let sessions = SessionStore::new(config.session_file);
        let auth = Authenticator::new(backend.clone(), sessions.clone(), sender);
        let admin = AdminGate::new(config.admin, sessions);

        Self {
            inner: Arc::new(ClientInner {
                backend,
                realtime,
                store,
                auth,
                admin,
            }),
        }
    }

    /// Load configuration from the environment and assemble a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment configuration is invalid. A
    /// fully absent backend configuration is not an error - it yields a
    /// degenerate client.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(ClientConfig::from_env()?))
    }

    /// Whether a backend service is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.backend.is_configured()
    }

    /// Get a reference to the backend handle.
    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    /// Get a reference to the entity store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    /// Get a reference to the subscription manager.
    #[must_use]
    pub fn realtime(&self) -> &SubscriptionManager {
        &self.inner.realtime
    }

    /// Get a reference to the customer login flow.
    #[must_use]
    pub fn auth(&self) -> &Authenticator {
        &self.inner.auth
    }

    /// Get a reference to the owner dashboard gate.
    #[must_use]
    pub fn admin(&self) -> &AdminGate {
        &self.inner.admin
    }

    /// Tear down every live change-feed channel. Call once at process
    /// shutdown.
    pub fn shutdown(&self) {
        self.inner.realtime.unsubscribe_all();
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("configured", &self.is_configured())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_degenerate_client_assembles() {
        let client = Client::new(ClientConfig::unconfigured(PathBuf::from(
            "/tmp/copperkart-client-test/session.json",
        )));
        assert!(!client.is_configured());
        assert!(!client.admin().is_enabled());
        client.shutdown();
    }
}
