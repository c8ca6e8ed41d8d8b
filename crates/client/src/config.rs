//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Backend (both or neither)
//! - `COPPERKART_BACKEND_URL` - Base URL of the hosted store backend
//! - `COPPERKART_BACKEND_ANON_KEY` - Public (anonymous) API key
//!
//! Setting neither is valid: the client runs in degenerate mode where reads
//! come back empty, writes are no-ops, and no notifications are delivered.
//! Setting exactly one is a configuration error.
//!
//! ## Optional
//! - `COPPERKART_SESSION_FILE` - Path of the durable session file
//!   (default: `.copperkart/session.json`)
//! - `COPPERKART_ADMIN_EMAIL` / `COPPERKART_ADMIN_PASSWORD_HASH` - Owner
//!   dashboard credential (Argon2 PHC hash); both or neither. Absent means
//!   the owner login is disabled.

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const ENV_BACKEND_URL: &str = "COPPERKART_BACKEND_URL";
const ENV_BACKEND_ANON_KEY: &str = "COPPERKART_BACKEND_ANON_KEY";
const ENV_SESSION_FILE: &str = "COPPERKART_SESSION_FILE";
const ENV_ADMIN_EMAIL: &str = "COPPERKART_ADMIN_EMAIL";
const ENV_ADMIN_PASSWORD_HASH: &str = "COPPERKART_ADMIN_PASSWORD_HASH";

const DEFAULT_SESSION_FILE: &str = ".copperkart/session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Full client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Hosted backend connection; `None` selects degenerate no-op mode.
    pub backend: Option<BackendConfig>,
    /// Path of the durable session file.
    pub session_file: PathBuf,
    /// Owner dashboard credential; `None` disables the owner login.
    pub admin: Option<AdminConfig>,
}

/// Hosted backend connection settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL, e.g. `https://store.example.com`.
    pub url: Url,
    /// Public API key sent with every request.
    pub anon_key: SecretString,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

/// Owner dashboard credential.
#[derive(Clone)]
pub struct AdminConfig {
    /// Owner login email.
    pub email: String,
    /// Argon2 PHC hash of the owner password.
    pub password_hash: SecretString,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the backend URL is malformed, or if exactly
    /// one of a both-or-neither variable pair is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let backend = match (
            get_optional_env(ENV_BACKEND_URL),
            get_optional_env(ENV_BACKEND_ANON_KEY),
        ) {
            (Some(url), Some(key)) => {
                let url = Url::parse(&url).map_err(|e| {
                    ConfigError::InvalidEnvVar(ENV_BACKEND_URL.to_string(), e.to_string())
                })?;
                Some(BackendConfig {
                    url,
                    anon_key: SecretString::from(key),
                })
            }
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::MissingEnvVar(ENV_BACKEND_ANON_KEY.to_string()));
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingEnvVar(ENV_BACKEND_URL.to_string()));
            }
        };

        let session_file = PathBuf::from(get_env_or_default(
            ENV_SESSION_FILE,
            DEFAULT_SESSION_FILE,
        ));

        let admin = match (
            get_optional_env(ENV_ADMIN_EMAIL),
            get_optional_env(ENV_ADMIN_PASSWORD_HASH),
        ) {
            (Some(email), Some(hash)) => Some(AdminConfig {
                email,
                password_hash: SecretString::from(hash),
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::MissingEnvVar(
                    ENV_ADMIN_PASSWORD_HASH.to_string(),
                ));
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingEnvVar(ENV_ADMIN_EMAIL.to_string()));
            }
        };

        Ok(Self {
            backend,
            session_file,
            admin,
        })
    }

    /// A configuration with no backend, no admin login, and the given
    /// session file. Used by tests and offline tooling.
    #[must_use]
    pub fn unconfigured(session_file: PathBuf) -> Self {
        Self {
            backend: None,
            session_file,
            admin: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_config_debug_redacts_key() {
        let config = BackendConfig {
            url: Url::parse("https://store.example.com").unwrap(),
            anon_key: SecretString::from("super_secret_anon_key"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("store.example.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_anon_key"));
    }

    #[test]
    fn test_admin_config_debug_redacts_hash() {
        let config = AdminConfig {
            email: "owner@example.com".to_string(),
            password_hash: SecretString::from("$argon2id$v=19$secret"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("owner@example.com"));
        assert!(!debug_output.contains("argon2id"));
    }

    #[test]
    fn test_unconfigured() {
        let config = ClientConfig::unconfigured(PathBuf::from("/tmp/session.json"));
        assert!(config.backend.is_none());
        assert!(config.admin.is_none());
    }
}
